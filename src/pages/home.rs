use crate::{
    api::{ApiError, Post},
    content,
    pages::{
        PageView,
        markup::{Head, escape},
    },
    router,
};

/// Number of skeleton cards shown while the list is loading.
pub const PLACEHOLDER_CARDS: usize = 6;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum HomeState {
    #[default]
    Loading,
    Loaded(Vec<Post>),
    Empty,
    Failed,
}

/// The post list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HomePage {
    state: HomeState,
}

impl HomePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &HomeState {
        &self.state
    }

    pub fn posts(&self) -> &[Post] {
        match &self.state {
            HomeState::Loaded(posts) => posts,
            _ => &[],
        }
    }

    /// Applies the list response. Failures render like an empty list.
    pub fn resolve(&mut self, result: Result<Vec<Post>, ApiError>) {
        self.state = match result {
            Ok(posts) if posts.is_empty() => HomeState::Empty,
            Ok(posts) => HomeState::Loaded(posts),
            Err(e) => {
                log::warn!("Could not load posts: {}", e);
                HomeState::Failed
            }
        };
    }
}

impl PageView for HomePage {
    fn head(&self) -> Head {
        Head::titled("Blog - Latest Posts")
            .name(
                "description",
                "Read our latest blog posts about various topics",
            )
            .name("keywords", "blog, posts, articles")
            .canonical("/")
    }

    fn render(&self) -> String {
        let cards: String = match &self.state {
            HomeState::Loading => (0..PLACEHOLDER_CARDS).map(|_| placeholder_card()).collect(),
            HomeState::Loaded(posts) => posts.iter().map(post_card).collect(),
            HomeState::Empty | HomeState::Failed => String::new(),
        };
        format!(
            r#"<div class="home"><h1 class="page-title neon-text">Latest Posts</h1><div class="post-grid">{}</div></div>"#,
            cards
        )
    }
}

fn post_card(post: &Post) -> String {
    format!(
        concat!(
            r#"<a href="{href}" data-link class="post-card-link" data-post-id="{id}">"#,
            r#"<article class="card post-card">"#,
            r#"<header class="card-header"><h2 class="card-title line-clamp-2">{title}</h2>"#,
            r#"<p class="card-description"><time datetime="{iso}">{date}</time></p></header>"#,
            r#"<div class="card-content"><p class="card-summary line-clamp-3">{summary}</p></div>"#,
            "</article></a>"
        ),
        href = escape(&router::post_path(&post.slug)),
        id = post.id,
        title = escape(&post.title),
        iso = post.created_at.to_rfc3339(),
        date = content::format_date(&post.created_at),
        summary = escape(&post.summary()),
    )
}

fn placeholder_card() -> String {
    concat!(
        r#"<div class="card post-card skeleton" aria-hidden="true">"#,
        r#"<div class="skeleton-line skeleton-title"></div>"#,
        r#"<div class="skeleton-line skeleton-date"></div>"#,
        r#"<div class="skeleton-block"></div>"#,
        "</div>"
    )
    .to_string()
}
