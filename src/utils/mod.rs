pub mod csv_handler;
pub mod slug;
pub mod time_parser;
pub mod url_validator;

pub use slug::{is_valid_slug, slugify};
pub use time_parser::TimeParser;
pub use url_validator::{UrlValidationError, validate_url};

/// 生成随机小写字母数字后缀（用于 slug 冲突时追加）
pub fn random_suffix(length: usize) -> String {
    use std::iter;

    let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// 生成随机十六进制 token（`bytes` 个随机字节）
pub fn generate_secure_token(bytes: usize) -> String {
    (0..bytes)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect()
}
