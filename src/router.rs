//! Client-side routes.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Home,
    /// `/posts/{slug}`
    Post { slug: String },
    /// `/posts/new`, only when the editor is enabled.
    NewPost,
    /// Anything else.
    NotFound,
}

impl Route {
    /// Resolves a location path. Query strings and fragments are ignored.
    ///
    /// Without the editor, `/posts/new` is just the post whose slug is `new`.
    pub fn parse(path: &str, editor_enabled: bool) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["posts", "new"] if editor_enabled => Route::NewPost,
            ["posts", slug] => Route::Post {
                slug: slug.to_string(),
            },
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home | Route::NotFound => "/".to_string(),
            Route::Post { slug } => post_path(slug),
            Route::NewPost => "/posts/new".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn post_path(slug: &str) -> String {
    format!("/posts/{}", slug)
}
