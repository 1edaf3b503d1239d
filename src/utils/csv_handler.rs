//! CSV 导入共享逻辑
//!
//! 维护脚本常用的表格格式：一行一个平台 / 活动 / 标签。
//! 多值列（ai_models、tags、conditions）使用 `;` 分隔。

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::CreditHubError;

/// 平台 CSV 行
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformCsvRow {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// 活动 CSV 行（单语言；同一 slug 多行时合并为多个翻译）
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignCsvRow {
    pub platform: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub locale: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub free_credit: String,
    #[serde(default)]
    pub credit_value_cents: Option<i64>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
    pub official_link: String,
    #[serde(default)]
    pub ai_models: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub conditions: Option<String>,
}

/// 标签 CSV 行；`weight` 非空时作为条件标签导入
#[derive(Debug, Clone, Deserialize)]
pub struct TagCsvRow {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub weight: Option<i32>,
}

/// 解析的行以及失败行的错误信息（行号从 2 开始，跳过表头）
pub struct CsvParseOutcome<T> {
    pub rows: Vec<(usize, T)>,
    pub errors: Vec<String>,
}

/// 拆分 `;` 分隔的多值列
pub fn split_multi(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 从任意 reader 解析 CSV
pub fn read_rows<T, R>(reader: R) -> CsvParseOutcome<T>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (row_idx, result) in csv_reader.deserialize::<T>().enumerate() {
        let row_num = row_idx + 2;
        match result {
            Ok(row) => rows.push((row_num, row)),
            Err(e) => errors.push(format!("Row {}: CSV parse error: {}", row_num, e)),
        }
    }

    CsvParseOutcome { rows, errors }
}

/// 从文件解析 CSV
pub fn read_rows_from_file<T, P>(path: P) -> Result<CsvParseOutcome<T>, CreditHubError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).map_err(|e| {
        CreditHubError::file_operation(format!(
            "Failed to open {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    Ok(read_rows(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multi() {
        assert_eq!(
            split_multi(Some("gpt-4o; claude-3 ;;gemini")),
            vec!["gpt-4o", "claude-3", "gemini"]
        );
        assert!(split_multi(None).is_empty());
        assert!(split_multi(Some("  ")).is_empty());
    }

    #[test]
    fn test_read_campaign_rows() {
        let data = "\
platform,slug,locale,title,description,free_credit,credit_value_cents,end_at,official_link,ai_models,tags
openai,openai-5,en,OpenAI $5 credit,New accounts,$5,500,2030-01-01,https://openai.com,gpt-4o;o1,llm
anthropic,,en,Claude credits,,$10,1000,,https://anthropic.com,,
";
        let outcome = read_rows::<CampaignCsvRow, _>(data.as_bytes());
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert_eq!(outcome.rows.len(), 2);

        let (line, first) = &outcome.rows[0];
        assert_eq!(*line, 2);
        assert_eq!(first.slug.as_deref(), Some("openai-5"));
        assert_eq!(first.credit_value_cents, Some(500));
        assert_eq!(split_multi(first.ai_models.as_deref()), vec!["gpt-4o", "o1"]);

        let (_, second) = &outcome.rows[1];
        assert_eq!(second.slug, None);
        assert_eq!(second.end_at, None);
    }

    #[test]
    fn test_read_rows_collects_errors() {
        let data = "\
name,kind,weight
Phone verification,requirement,2
Broken,requirement,not-a-number
";
        let outcome = read_rows::<TagCsvRow, _>(data.as_bytes());
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Row 3"));
    }

    #[test]
    fn test_read_rows_from_missing_file() {
        let result = read_rows_from_file::<PlatformCsvRow, _>("/definitely/not/here.csv");
        assert!(matches!(result, Err(CreditHubError::FileOperation(_))));
    }
}
