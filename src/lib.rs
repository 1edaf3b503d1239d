//! CreditHub - A marketplace for free AI API credit campaigns
//!
//! This library provides the core functionality for the CreditHub service:
//! the platform and campaign catalog, tagging, user interactions,
//! moderation and the HTTP API that exposes them.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line maintenance commands
//!
//! # Architecture
//! - `storage`: SeaORM entities, filters and queries
//! - `services`: Business rules shared by the API and the CLI
//! - `api`: HTTP handlers, JWT and middleware
//! - `interfaces`: CLI command implementations
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
