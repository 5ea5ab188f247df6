//! Page views.
//!
//! Every page is a small state machine that renders to an HTML string plus the
//! document head metadata it wants. The pages never talk to the network
//! themselves; the [`crate::app::App`] controller feeds them responses.
//!
//! - `home`: post list with a loading skeleton
//! - `post`: one article, loaded by slug
//! - `new_post`: the editor form
//! - `layout`: header, navigation and footer around the active page
//! - `markup`: escaping and head metadata

pub mod home;
pub mod layout;
pub mod markup;
pub mod new_post;
pub mod post;

pub use home::{HomePage, HomeState};
pub use layout::Layout;
pub use markup::Head;
pub use new_post::NewPostPage;
pub use post::{PostPage, PostState};

use crate::router::Route;

/// What a routed page provides to the layout.
pub trait PageView {
    fn head(&self) -> Head;
    fn render(&self) -> String;
}

/// The page currently mounted under the layout.
#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    Home(HomePage),
    Post(PostPage),
    NewPost(NewPostPage),
    NotFound,
}

impl Page {
    /// Fresh page for a route, in its initial state.
    pub fn for_route(route: &Route) -> Self {
        match route {
            Route::Home => Page::Home(HomePage::new()),
            Route::Post { slug } => Page::Post(PostPage::new(slug.clone())),
            Route::NewPost => Page::NewPost(NewPostPage::new()),
            Route::NotFound => Page::NotFound,
        }
    }

    pub fn view(&self) -> Option<&dyn PageView> {
        match self {
            Page::Home(page) => Some(page),
            Page::Post(page) => Some(page),
            Page::NewPost(page) => Some(page),
            Page::NotFound => None,
        }
    }

    pub fn head(&self) -> Head {
        self.view()
            .map(|view| view.head())
            .unwrap_or_else(|| Head::titled(layout::SITE_NAME))
    }

    pub fn render(&self) -> String {
        self.view().map(|view| view.render()).unwrap_or_default()
    }
}
