use crate::{
    api::{ApiError, Post},
    content,
    pages::{
        PageView,
        layout::SITE_NAME,
        markup::{Head, escape},
    },
    router,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PostState {
    #[default]
    Loading,
    Found(Box<Post>),
    NotFound,
}

/// A single article, keyed by the slug of the route.
#[derive(Clone, Debug, PartialEq)]
pub struct PostPage {
    slug: String,
    state: PostState,
}

impl PostPage {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            state: PostState::Loading,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn state(&self) -> &PostState {
        &self.state
    }

    pub fn post(&self) -> Option<&Post> {
        match &self.state {
            PostState::Found(post) => Some(post.as_ref()),
            _ => None,
        }
    }

    /// Applies the detail response. Any failure means there is nothing to show.
    pub fn resolve(&mut self, result: Result<Post, ApiError>) {
        self.state = match result {
            Ok(post) => PostState::Found(Box::new(post)),
            Err(e) => {
                log::warn!("Could not load post {:?}: {}", self.slug, e);
                PostState::NotFound
            }
        };
    }
}

impl PageView for PostPage {
    fn head(&self) -> Head {
        let Some(post) = self.post() else {
            return Head::titled(SITE_NAME);
        };
        let description = post.meta_description.clone().unwrap_or_default();
        let mut head = Head::titled(post.title.clone())
            .name("description", description.clone())
            .name("keywords", post.keywords.clone().unwrap_or_default())
            .canonical(router::post_path(&post.slug))
            .property("og:title", post.title.clone())
            .property("og:description", description)
            .property("og:type", "article")
            .property("article:published_time", post.created_at.to_rfc3339());
        if let Some(updated_at) = post.updated_at {
            head = head.property("article:modified_time", updated_at.to_rfc3339());
        }
        head
    }

    fn render(&self) -> String {
        match &self.state {
            PostState::Loading => concat!(
                r#"<div class="post-skeleton" aria-hidden="true">"#,
                r#"<div class="skeleton-line skeleton-heading"></div>"#,
                r#"<div class="skeleton-line skeleton-date"></div>"#,
                r#"<div class="skeleton-block skeleton-body"></div>"#,
                "</div>"
            )
            .to_string(),
            PostState::NotFound => String::new(),
            PostState::Found(post) => {
                let updated = post
                    .updated_at
                    .map(|dt| format!(" (Updated: {})", content::format_date(&dt)))
                    .unwrap_or_default();
                format!(
                    concat!(
                        r#"<article class="post prose">"#,
                        "<h1>{title}</h1>",
                        r#"<div class="post-meta"><time datetime="{iso}">{date}</time>{updated}</div>"#,
                        r#"<div class="post-content">{content}</div>"#,
                        "</article>"
                    ),
                    title = escape(&post.title),
                    iso = post.created_at.to_rfc3339(),
                    date = content::format_date(&post.created_at),
                    updated = updated,
                    content = post.content,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pages::markup::MetaKey;

    fn post(updated_at: Option<&str>) -> Post {
        serde_json::from_value(json!({
            "id": 4,
            "title": "Rain & Neon",
            "content": "<p>Wet <em>streets</em></p>",
            "slug": "rain-and-neon",
            "meta_description": "City at night",
            "keywords": "rain,neon",
            "created_at": "2024-03-01T20:00:00",
            "updated_at": updated_at,
        }))
        .unwrap()
    }

    #[test]
    fn renders_content_verbatim_and_escapes_the_title() {
        let mut page = PostPage::new("rain-and-neon");
        page.resolve(Ok(post(None)));
        let html = page.render();
        assert!(html.contains("<h1>Rain &amp; Neon</h1>"));
        assert!(html.contains("<p>Wet <em>streets</em></p>"));
        assert!(!html.contains("Updated"));
    }

    #[test]
    fn head_carries_article_metadata() {
        let mut page = PostPage::new("rain-and-neon");
        page.resolve(Ok(post(Some("2024-03-02T08:00:00"))));
        let head = page.head();
        assert_eq!(head.title, "Rain & Neon");
        assert_eq!(head.canonical.as_deref(), Some("/posts/rain-and-neon"));
        let property = |key| {
            head.meta
                .iter()
                .find(|(k, _)| *k == MetaKey::Property(key))
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(property("og:type"), Some("article"));
        assert_eq!(property("og:description"), Some("City at night"));
        assert!(property("article:modified_time").is_some());
        assert!(page.render().contains("(Updated: "));
    }

    #[test]
    fn failure_renders_nothing() {
        let mut page = PostPage::new("gone");
        page.resolve(Err(ApiError::InvalidUrl("x".to_string())));
        assert_eq!(page.state(), &PostState::NotFound);
        assert!(page.render().is_empty());
        assert_eq!(page.head().title, SITE_NAME);
    }
}
