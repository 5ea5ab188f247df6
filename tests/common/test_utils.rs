#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cyber_blog::api::{ApiError, NewPost, Post, PostSource};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn post_json(id: i64, slug: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "content": format!("<p>{title} body</p>"),
        "slug": slug,
        "meta_description": format!("About {title}"),
        "keywords": title.replace(' ', ","),
        "created_at": format!("2024-05-{:02}T10:00:00", id.clamp(1, 28)),
        "updated_at": null,
    })
}

pub fn sample_post(id: i64, slug: &str, title: &str) -> Post {
    serde_json::from_value(post_json(id, slug, title)).unwrap()
}

/// In-memory posts backend.
pub struct InMemoryPosts {
    posts: RefCell<Vec<Post>>,
    failing: Cell<bool>,
    pub created: RefCell<Vec<NewPost>>,
}

impl InMemoryPosts {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: RefCell::new(posts),
            failing: Cell::new(false),
            created: RefCell::new(Vec::new()),
        }
    }

    /// Every call answers with HTTP 500 until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    fn check(&self, url: &str) -> Result<(), ApiError> {
        if self.failing.get() {
            return Err(ApiError::Http {
                url: url.to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl PostSource for InMemoryPosts {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.check("/posts")?;
        Ok(self.posts.borrow().clone())
    }

    async fn get_post(&self, slug: &str) -> Result<Post, ApiError> {
        let url = format!("/posts/{slug}");
        self.check(&url)?;
        self.posts
            .borrow()
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
            .ok_or(ApiError::Http { url, status: 404 })
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        self.check("/posts")?;
        self.created.borrow_mut().push(post.clone());
        let id = self.posts.borrow().len() as i64 + 1;
        let slug = post.title.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
        let created = sample_post(id, &slug, &post.title);
        self.posts.borrow_mut().push(created.clone());
        Ok(created)
    }
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

type Routes = HashMap<(String, String), (u16, String)>;

/// Minimal HTTP/1.1 server answering canned responses per method and path.
/// Unknown routes get a 404.
pub struct CannedServer {
    pub base_url: String,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl CannedServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: Arc<Mutex<Routes>> = Arc::default();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
        {
            let routes = routes.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let requests = requests.clone();
                    tokio::spawn(serve(stream, routes, requests));
                }
            });
        }
        Self {
            base_url,
            routes,
            requests,
        }
    }

    pub fn route(&self, method: &str, path: &str, status: u16, body: impl ToString) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: Arc<Mutex<Routes>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    let (status, response) = routes
        .lock()
        .unwrap()
        .get(&(method.clone(), path.clone()))
        .cloned()
        .unwrap_or((404, r#"{"detail":"Not Found"}"#.to_string()));
    requests.lock().unwrap().push(RecordedRequest { method, path, body });

    let reply = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n{response}",
        reason = reason(status),
        len = response.len(),
    );
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
