mod r#impl;
mod structs;

pub use r#impl::{DEFAULT_CONFIG_PATH, get_config, init_config, init_config_from, replace_config};
pub use structs::*;

/// ts-rs 导出的前端类型文件
pub const TS_EXPORT_PATH: &str = "../frontend/src/types/api.generated.ts";
