//! Static chrome around the routed page.

use chrono::{Datelike, Utc};

use crate::router::Route;

pub const SITE_NAME: &str = "赛博格志";

/// Id of the element the page body is rendered into.
pub const PAGE_ID: &str = "page";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Shows the "New post" link of the later layout variant.
    pub editor_enabled: bool,
    /// Year printed in the footer.
    pub year: i32,
}

impl Layout {
    pub fn new(editor_enabled: bool) -> Self {
        Self {
            editor_enabled,
            year: Utc::now().year(),
        }
    }

    /// Wraps a rendered page body in header, navigation and footer.
    pub fn wrap(&self, body: &str) -> String {
        let new_post = if self.editor_enabled {
            format!(
                r#"<a href="{}" data-link class="nav-link hover-glow">New post</a>"#,
                Route::NewPost.path()
            )
        } else {
            String::new()
        };
        format!(
            concat!(
                r#"<div class="layout">"#,
                r#"<header class="site-header"><div class="container"><nav class="site-nav">"#,
                r#"<a href="/" data-link class="brand hover-glow"><span class="brand-name neon-text">{site}</span></a>"#,
                "{new_post}",
                "</nav></div></header>",
                r#"<main class="container" id="{page_id}">{body}</main>"#,
                r#"<footer class="site-footer"><div class="container">"#,
                r#"<span class="copyright">© {year} {site}. All rights reserved.</span>"#,
                "</div></footer>",
                "</div>"
            ),
            site = SITE_NAME,
            new_post = new_post,
            page_id = PAGE_ID,
            body = body,
            year = self.year,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_body_between_header_and_footer() {
        let layout = Layout {
            editor_enabled: false,
            year: 2077,
        };
        let html = layout.wrap("<p>body</p>");
        let header = html.find("</header>").unwrap();
        let body = html.find("<p>body</p>").unwrap();
        let footer = html.find("<footer").unwrap();
        assert!(header < body && body < footer);
        assert!(html.contains("© 2077 赛博格志"));
        assert!(!html.contains("/posts/new"));
    }

    #[test]
    fn editor_variant_links_the_form() {
        let layout = Layout {
            editor_enabled: true,
            year: 2077,
        };
        assert!(layout.wrap("").contains(r#"href="/posts/new""#));
    }
}
