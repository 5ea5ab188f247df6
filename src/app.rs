//! Application controller.
//!
//! The controller owns the active route and page and reacts to [`Msg`]s. It never
//! performs I/O; instead every update hands back [`Command`]s for the platform
//! driver to carry out. Network commands are turned back into messages by
//! [`perform`].
//!
//! Every page entry gets a fresh token and every request carries the token of
//! the entry that issued it. A response that arrives after the user moved on
//! carries a stale token and is dropped, so a late response never touches a page
//! that is no longer mounted.

use crate::{
    api::{ApiError, NewPost, Post, PostSource},
    config::Config,
    pages::{Head, Layout, Page},
    router::Route,
};

pub type Token = u64;

#[derive(Debug)]
pub enum Msg {
    /// In-app navigation (link click, redirect). Adds a history entry.
    Navigate(String),
    /// The browser location changed on its own (back/forward).
    LocationChanged(String),
    PostsLoaded {
        token: Token,
        result: Result<Vec<Post>, ApiError>,
    },
    PostLoaded {
        token: Token,
        result: Result<Post, ApiError>,
    },
    TitleChanged(String),
    ContentChanged(String),
    Submit,
    Cancel,
    Created {
        token: Token,
        result: Result<Post, ApiError>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    FetchPosts { token: Token },
    FetchPost { token: Token, slug: String },
    CreatePost { token: Token, post: NewPost },
    /// Push a history entry for the given path.
    PushHistory(String),
    /// The home page became active; start the backdrop.
    MountScene,
    /// The home page was left; stop the backdrop and free it.
    UnmountScene,
}

impl Command {
    /// Whether [`perform`] handles this command (as opposed to the platform driver).
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Command::FetchPosts { .. } | Command::FetchPost { .. } | Command::CreatePost { .. }
        )
    }
}

/// Outcome of one message.
#[derive(Debug, Default, PartialEq)]
pub struct Update {
    /// The page markup changed and has to be rendered again.
    pub redraw: bool,
    pub commands: Vec<Command>,
}

impl Update {
    fn redraw() -> Self {
        Self {
            redraw: true,
            commands: Vec::new(),
        }
    }

    fn idle() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct App {
    editor_enabled: bool,
    layout: Layout,
    route: Option<Route>,
    /// Location of the current entry as the browser shows it.
    location: String,
    page: Page,
    token: Token,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self::with_layout(config, Layout::new(config.editor_enabled))
    }

    pub fn with_layout(config: &Config, layout: Layout) -> Self {
        Self {
            editor_enabled: config.editor_enabled,
            layout,
            route: None,
            location: String::new(),
            page: Page::NotFound,
            token: 0,
        }
    }

    /// Mounts the page of the initial location.
    pub fn start(&mut self, path: &str) -> Update {
        let route = Route::parse(path, self.editor_enabled);
        self.enter(route, path.to_string(), false)
    }

    /// The page came back from the browser's back/forward cache after the
    /// backdrop was torn down on `pagehide`.
    pub fn resume(&self) -> Update {
        let commands = match self.route {
            Some(Route::Home) => vec![Command::MountScene],
            _ => Vec::new(),
        };
        Update {
            redraw: false,
            commands,
        }
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// Full markup: layout chrome around the active page.
    pub fn render(&self) -> String {
        self.layout.wrap(&self.page.render())
    }

    pub fn render_page(&self) -> String {
        self.page.render()
    }

    pub fn head(&self) -> Head {
        self.page.head()
    }

    pub fn update(&mut self, msg: Msg) -> Update {
        match msg {
            Msg::Navigate(path) => {
                let route = Route::parse(&path, self.editor_enabled);
                self.enter(route, path, true)
            }
            Msg::LocationChanged(path) => {
                let route = Route::parse(&path, self.editor_enabled);
                self.enter(route, path, false)
            }
            Msg::PostsLoaded { token, result } => match &mut self.page {
                Page::Home(home) if token == self.token => {
                    home.resolve(result);
                    Update::redraw()
                }
                _ => self.discard("post list", token),
            },
            Msg::PostLoaded { token, result } => match &mut self.page {
                Page::Post(page) if token == self.token => {
                    page.resolve(result);
                    Update::redraw()
                }
                _ => self.discard("post", token),
            },
            Msg::TitleChanged(title) => {
                if let Page::NewPost(form) = &mut self.page {
                    form.set_title(title);
                }
                // the input already shows what was typed
                Update::idle()
            }
            Msg::ContentChanged(content) => {
                if let Page::NewPost(form) = &mut self.page {
                    form.set_content(content);
                }
                Update::idle()
            }
            Msg::Submit => {
                let Page::NewPost(form) = &mut self.page else {
                    return Update::idle();
                };
                match form.begin_submit() {
                    Some(post) => Update {
                        redraw: true,
                        commands: vec![Command::CreatePost {
                            token: self.token,
                            post,
                        }],
                    },
                    None => Update::idle(),
                }
            }
            Msg::Cancel => self.enter(Route::Home, Route::Home.path(), true),
            Msg::Created { token, result } => {
                let created = match &mut self.page {
                    Page::NewPost(form) if token == self.token => form.finish_submit(result),
                    _ => return self.discard("created post", token),
                };
                match created {
                    Some(post) => {
                        let route = Route::Post { slug: post.slug };
                        let path = route.path();
                        self.enter(route, path, true)
                    }
                    None => Update::redraw(),
                }
            }
        }
    }

    fn discard(&self, what: &str, token: Token) -> Update {
        log::debug!(
            "Dropping {} response of entry {} (current entry {})",
            what,
            token,
            self.token
        );
        Update::idle()
    }

    fn enter(&mut self, route: Route, path: String, push_history: bool) -> Update {
        if self.route.as_ref() == Some(&route) {
            // same page under another address (e.g. two unknown paths)
            if !push_history || path == self.location {
                self.location = path;
                return Update::idle();
            }
            self.location = path.clone();
            return Update {
                redraw: false,
                commands: vec![Command::PushHistory(path)],
            };
        }
        let was_home = matches!(self.route, Some(Route::Home));
        let is_home = route == Route::Home;

        self.token += 1;
        self.page = Page::for_route(&route);
        log::info!("Entering {}", route);

        let mut commands = Vec::new();
        if push_history {
            commands.push(Command::PushHistory(path.clone()));
        }
        self.location = path;
        match &route {
            Route::Home => commands.push(Command::FetchPosts { token: self.token }),
            Route::Post { slug } => commands.push(Command::FetchPost {
                token: self.token,
                slug: slug.clone(),
            }),
            Route::NewPost | Route::NotFound => (),
        }
        match (was_home, is_home) {
            (false, true) => commands.push(Command::MountScene),
            (true, false) => commands.push(Command::UnmountScene),
            _ => (),
        }
        self.route = Some(route);

        Update {
            redraw: true,
            commands,
        }
    }
}

/// Carries out a request command against a post source.
///
/// Returns `None` for commands that belong to the platform driver.
pub async fn perform<S: PostSource + ?Sized>(source: &S, command: Command) -> Option<Msg> {
    match command {
        Command::FetchPosts { token } => Some(Msg::PostsLoaded {
            token,
            result: source.list_posts().await,
        }),
        Command::FetchPost { token, slug } => Some(Msg::PostLoaded {
            token,
            result: source.get_post(&slug).await,
        }),
        Command::CreatePost { token, post } => Some(Msg::Created {
            token,
            result: source.create_post(&post).await,
        }),
        Command::PushHistory(_) | Command::MountScene | Command::UnmountScene => None,
    }
}
