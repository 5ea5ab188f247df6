use cyber_blog::app::{App, Command, Msg, Update, perform};
use cyber_blog::config::Config;
use cyber_blog::pages::Page;
use cyber_blog::pages::home::{HomeState, PLACEHOLDER_CARDS};
use cyber_blog::router::Route;

use crate::common::test_utils::{InMemoryPosts, sample_post};
mod common;

fn blog() -> InMemoryPosts {
    InMemoryPosts::new(vec![
        sample_post(1, "hello-world", "Hello World"),
        sample_post(2, "neon-nights", "Neon Nights"),
        sample_post(3, "pixel-rain", "Pixel Rain"),
    ])
}

/// Performs every request of `update` and feeds the responses back, until the
/// app stops asking. Returns the driver commands seen on the way.
async fn settle(app: &mut App, source: &InMemoryPosts, update: Update) -> Vec<Command> {
    let mut driver = Vec::new();
    let mut pending = update.commands;
    while !pending.is_empty() {
        let mut next = Vec::new();
        for command in pending {
            if command.is_request() {
                if let Some(msg) = perform(source, command).await {
                    next.extend(app.update(msg).commands);
                }
            } else {
                driver.push(command);
            }
        }
        pending = next;
    }
    driver
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[tokio::test]
async fn home_shows_one_card_per_post_in_order() {
    let source = blog();
    let mut app = App::new(&Config::default());

    let update = app.start("/");
    assert!(update.redraw);
    assert!(update.commands.contains(&Command::MountScene));
    assert_eq!(
        count(&app.render_page(), "post-card skeleton"),
        PLACEHOLDER_CARDS
    );

    settle(&mut app, &source, update).await;
    let html = app.render_page();
    assert_eq!(count(&html, r#"class="card post-card""#), 3);
    assert_eq!(count(&html, "skeleton"), 0);
    let first = html.find(r#"data-post-id="1""#).unwrap();
    let second = html.find(r#"data-post-id="2""#).unwrap();
    let third = html.find(r#"data-post-id="3""#).unwrap();
    assert!(first < second && second < third);
    assert!(html.contains(r#"href="/posts/neon-nights""#));
}

#[tokio::test]
async fn failed_list_renders_an_empty_grid() {
    let source = blog();
    source.set_failing(true);
    let mut app = App::new(&Config::default());

    let update = app.start("/");
    settle(&mut app, &source, update).await;
    let Page::Home(home) = app.page() else {
        panic!("expected the home page");
    };
    assert_eq!(home.state(), &HomeState::Failed);
    assert_eq!(count(&app.render_page(), "post-card"), 0);
}

#[tokio::test]
async fn unknown_slug_renders_no_article() {
    let source = blog();
    let mut app = App::new(&Config::default());

    let update = app.start("/posts/does-not-exist");
    assert!(app.render_page().contains("post-skeleton"));
    settle(&mut app, &source, update).await;

    let html = app.render_page();
    assert!(!html.contains("<article"));
    assert!(!html.contains("post-skeleton"));
}

#[tokio::test]
async fn post_page_follows_slug_changes() {
    let source = blog();
    let mut app = App::new(&Config::default());

    let update = app.start("/posts/hello-world");
    settle(&mut app, &source, update).await;
    assert!(app.render_page().contains("<h1>Hello World</h1>"));
    assert_eq!(app.head().title, "Hello World");

    let update = app.update(Msg::Navigate("/posts/pixel-rain".to_string()));
    assert_eq!(
        update.commands.first(),
        Some(&Command::PushHistory("/posts/pixel-rain".to_string()))
    );
    settle(&mut app, &source, update).await;
    assert!(app.render_page().contains("<h1>Pixel Rain</h1>"));
    assert_eq!(app.head().title, "Pixel Rain");
}

#[tokio::test]
async fn late_response_does_not_touch_the_next_page() {
    let source = blog();
    let mut app = App::new(&Config::default());

    let update = app.start("/posts/hello-world");
    let stale = update
        .commands
        .into_iter()
        .find(|c| c.is_request())
        .unwrap();

    // the user moves on before the first post arrives
    let update = app.update(Msg::LocationChanged("/posts/neon-nights".to_string()));
    settle(&mut app, &source, update).await;
    assert!(app.render_page().contains("<h1>Neon Nights</h1>"));

    let msg = perform(&source, stale).await.unwrap();
    let update = app.update(msg);
    assert!(!update.redraw);
    assert!(update.commands.is_empty());
    assert!(app.render_page().contains("<h1>Neon Nights</h1>"));
}

#[tokio::test]
async fn backdrop_is_mounted_only_on_home() {
    let source = blog();
    let mut app = App::new(&Config::default());

    let update = app.start("/");
    let driver = settle(&mut app, &source, update).await;
    assert_eq!(driver, [Command::MountScene]);

    let update = app.update(Msg::Navigate("/posts/hello-world".to_string()));
    let driver = settle(&mut app, &source, update).await;
    assert!(driver.contains(&Command::UnmountScene));

    let update = app.update(Msg::Navigate("/posts/neon-nights".to_string()));
    let driver = settle(&mut app, &source, update).await;
    assert!(!driver.contains(&Command::UnmountScene));
    assert!(!driver.contains(&Command::MountScene));

    let update = app.update(Msg::LocationChanged("/".to_string()));
    let driver = settle(&mut app, &source, update).await;
    assert_eq!(driver, [Command::MountScene]);
}

#[tokio::test]
async fn successful_submit_opens_the_new_post() {
    let source = blog();
    let mut app = App::new(&Config::default());

    app.start("/posts/new");
    assert_eq!(app.route(), Some(&Route::NewPost));
    app.update(Msg::TitleChanged("Hello Again".to_string()));
    app.update(Msg::ContentChanged("<p>Second <b>post</b></p>".to_string()));

    let update = app.update(Msg::Submit);
    assert!(app.render_page().contains("disabled"));
    settle(&mut app, &source, update).await;

    let sent = source.created.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].keywords.as_deref(), Some("Hello,Again"));
    assert_eq!(sent[0].meta_description.as_deref(), Some("Second post"));
    assert_eq!(
        app.route(),
        Some(&Route::Post {
            slug: "hello-again".to_string()
        })
    );
    assert!(app.render_page().contains("<h1>Hello Again</h1>"));
}

#[tokio::test]
async fn failed_submit_keeps_the_form() {
    let source = blog();
    let mut app = App::new(&Config::default());

    app.start("/posts/new");
    app.update(Msg::TitleChanged("Draft".to_string()));
    app.update(Msg::ContentChanged("<p>Unsaved</p>".to_string()));

    source.set_failing(true);
    let update = app.update(Msg::Submit);
    settle(&mut app, &source, update).await;

    assert_eq!(app.route(), Some(&Route::NewPost));
    let Page::NewPost(form) = app.page() else {
        panic!("expected the editor");
    };
    assert_eq!(form.title(), "Draft");
    assert_eq!(form.content(), "<p>Unsaved</p>");
    assert!(!form.is_submitting());
    assert!(!app.render_page().contains("disabled"));
}

#[test]
fn double_submit_sends_one_request() {
    let mut app = App::new(&Config::default());
    app.start("/posts/new");
    app.update(Msg::TitleChanged("Once".to_string()));

    let first = app.update(Msg::Submit);
    let second = app.update(Msg::Submit);
    assert_eq!(first.commands.len(), 1);
    assert!(second.commands.is_empty());
}

#[test]
fn editor_route_is_hidden_when_disabled() {
    let config = Config {
        editor_enabled: false,
        ..Config::default()
    };
    let mut app = App::new(&config);
    let update = app.start("/posts/new");
    assert_eq!(
        app.route(),
        Some(&Route::Post {
            slug: "new".to_string()
        })
    );
    assert!(update.commands.iter().any(|c| matches!(
        c,
        Command::FetchPost { slug, .. } if slug == "new"
    )));
    assert!(!app.render().contains(r#"href="/posts/new""#));
}

#[test]
fn navigating_between_unknown_paths_updates_the_address() {
    let mut app = App::new(&Config::default());
    app.start("/a");
    assert_eq!(app.route(), Some(&Route::NotFound));
    let token = app.token();

    let update = app.update(Msg::Navigate("/b".to_string()));
    assert_eq!(update.commands, [Command::PushHistory("/b".to_string())]);
    assert!(!update.redraw);
    assert_eq!(app.token(), token);

    // clicking the link of the page already shown adds nothing
    let update = app.update(Msg::Navigate("/b".to_string()));
    assert!(update.commands.is_empty());
}

#[test]
fn restored_page_remounts_the_backdrop_only_on_home() {
    let mut app = App::new(&Config::default());
    app.start("/");
    assert_eq!(app.resume().commands, [Command::MountScene]);

    app.update(Msg::Navigate("/posts/hello-world".to_string()));
    assert!(app.resume().commands.is_empty());
}
