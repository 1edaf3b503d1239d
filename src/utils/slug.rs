//! Slug 生成与校验
//!
//! slug 只包含小写 ASCII 字母、数字和单个连字符，长度 3..=120。

pub const MIN_SLUG_LEN: usize = 3;
pub const MAX_SLUG_LEN: usize = 120;

/// 将任意标题转换为 slug
///
/// 非 ASCII 字母数字字符折叠为单个 `-`，首尾连字符被去掉，
/// 超长时在 `MAX_SLUG_LEN` 处截断。
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if out.len() > MAX_SLUG_LEN {
        out.truncate(MAX_SLUG_LEN);
        while out.ends_with('-') {
            out.pop();
        }
    }
    out
}

/// 校验 slug 格式
pub fn is_valid_slug(slug: &str) -> bool {
    let len = slug.len();
    (MIN_SLUG_LEN..=MAX_SLUG_LEN).contains(&len)
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("OpenAI $5 Free Credit!"), "openai-5-free-credit");
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("Claude 3.5 Sonnet"), "claude-3-5-sonnet");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("免费 API credits"), "api-credits");
        assert_eq!(slugify("免费额度"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a-".repeat(100);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("openai-credits"));
        assert!(is_valid_slug("abc"));
        assert!(!is_valid_slug("ab"));
        assert!(!is_valid_slug("-abc"));
        assert!(!is_valid_slug("abc-"));
        assert!(!is_valid_slug("a--b"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(&"a".repeat(121)));
    }

    #[test]
    fn test_slugify_output_is_valid_when_long_enough() {
        let slug = slugify("Google Gemini API - $300 trial");
        assert!(is_valid_slug(&slug), "{}", slug);
    }
}
