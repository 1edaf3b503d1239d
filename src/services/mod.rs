//! Service layer for business logic
//!
//! This module provides unified business logic that can be shared between
//! different interfaces (HTTP API, CLI, background tasks).

mod campaign_service;
mod import_service;
mod interaction_service;
mod moderation_service;
mod platform_service;
mod tag_service;

pub use campaign_service::*;
pub use import_service::*;
pub use interaction_service::*;
pub use moderation_service::*;
pub use platform_service::*;
pub use tag_service::*;

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::storage::SeaOrmStorage;

/// Distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// All services over one storage handle; shared as actix app data
pub struct AppServices {
    pub campaigns: CampaignService,
    pub moderation: ModerationService,
    pub platforms: PlatformService,
    pub tags: TagService,
    pub interactions: InteractionService,
    pub imports: ImportService,
    pub storage: Arc<SeaOrmStorage>,
}

impl AppServices {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            campaigns: CampaignService::new(storage.clone()),
            moderation: ModerationService::new(storage.clone()),
            platforms: PlatformService::new(storage.clone()),
            tags: TagService::new(storage.clone()),
            interactions: InteractionService::new(storage.clone()),
            imports: ImportService::new(storage.clone()),
            storage,
        }
    }
}
