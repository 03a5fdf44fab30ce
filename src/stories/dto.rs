use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Story;

/// Languages the app publishes in.
pub(crate) const LANGUAGES: [&str; 2] = ["en", "zh"];

pub(crate) fn is_supported_language(lang: &str) -> bool {
    LANGUAGES.contains(&lang)
}

#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    pub title: String,
    pub summary: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".into()
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub language: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Story> for StoryResponse {
    fn from(s: Story) -> Self {
        Self {
            id: s.id,
            title: s.title,
            summary: s.summary,
            language: s.language,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_publishing_languages_are_supported() {
        assert!(is_supported_language("en"));
        assert!(is_supported_language("zh"));
        assert!(!is_supported_language("fr"));
        assert!(!is_supported_language("EN"));
    }

    #[test]
    fn create_request_defaults() {
        let req: CreateStoryRequest =
            serde_json::from_str(r#"{"title": "The Long Bridge"}"#).unwrap();
        assert_eq!(req.language, "en");
        assert!(req.summary.is_none());
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 0);
    }
}
