//! Wire types of the posts API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content;

/// HTML body of a post as delivered by the API.
///
/// The front-end injects this verbatim into the document. There is no
/// sanitization on this side: the API is trusted to deliver clean markup, and
/// the only way to obtain a `TrustedHtml` is to deserialize it from a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A blog article. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: TrustedHtml,
    pub slug: String,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Text shown on a card: the meta description if there is one, the content otherwise.
    pub fn summary(&self) -> String {
        match self.meta_description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => content::excerpt(self.content.as_str(), content::EXCERPT_CHARS),
        }
    }
}

/// Envelope of `GET /posts`. Pagination fields the backend adds are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct PostList {
    pub items: Vec<Post>,
}

/// Request body of `POST /posts`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl NewPost {
    /// Builds the request from the editor state, deriving the SEO fields.
    pub fn from_draft(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            meta_description: Some(content::meta_description(content)),
            keywords: Some(content::keywords(title)),
        }
    }
}

/// The reference backend emits naive datetimes (no offset); those are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(_) => raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
        }
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_naive_and_offset_timestamps() {
        let post: Post = serde_json::from_value(json!({
            "id": 1,
            "title": "Getting Started with FastAPI",
            "content": "<p>FastAPI is fast.</p>",
            "slug": "getting-started-with-fastapi",
            "meta_description": null,
            "keywords": null,
            "created_at": "2024-05-01T10:30:00.123456",
            "updated_at": "2024-05-02T08:00:00+02:00"
        }))
        .unwrap();

        assert_eq!(post.created_at.day(), 1);
        assert_eq!(post.created_at.hour(), 10);
        assert_eq!(post.updated_at.map(|dt| dt.hour()), Some(6));
        assert_eq!(post.content.as_str(), "<p>FastAPI is fast.</p>");
    }

    #[test]
    fn missing_updated_at_is_none() {
        let post: Post = serde_json::from_value(json!({
            "id": 2,
            "title": "t",
            "content": "",
            "slug": "t",
            "meta_description": "d",
            "keywords": "k",
            "created_at": "2024-05-01T10:30:00Z"
        }))
        .unwrap();
        assert!(post.updated_at.is_none());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let result: Result<Post, _> = serde_json::from_value(json!({
            "id": 3,
            "title": "t",
            "content": "",
            "slug": "t",
            "meta_description": null,
            "keywords": null,
            "created_at": "yesterday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn list_envelope_ignores_pagination_fields() {
        let list: PostList = serde_json::from_value(json!({
            "items": [],
            "total": 0,
            "page": 1,
            "size": 50,
            "pages": 0
        }))
        .unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn summary_prefers_meta_description() {
        let mut post: Post = serde_json::from_value(json!({
            "id": 4,
            "title": "t",
            "content": "<h1>Heading</h1><p>Body text</p>",
            "slug": "t",
            "meta_description": "Short description",
            "keywords": null,
            "created_at": "2024-05-01T10:30:00Z",
            "updated_at": null
        }))
        .unwrap();
        assert_eq!(post.summary(), "Short description");

        post.meta_description = Some("  ".into());
        assert_eq!(post.summary(), "Heading Body text");
    }

    #[test]
    fn new_post_skips_absent_fields() {
        let body = serde_json::to_value(NewPost {
            title: "t".into(),
            content: "c".into(),
            meta_description: None,
            keywords: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "title": "t", "content": "c" }));
    }

    #[test]
    fn draft_derives_seo_fields() {
        let draft = NewPost::from_draft("Hello World", "<p>Hi <b>there</b></p>");
        assert_eq!(draft.keywords.as_deref(), Some("Hello,World"));
        assert_eq!(draft.meta_description.as_deref(), Some("Hi there"));
    }
}
