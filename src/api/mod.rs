//! REST client of the posts API.
//!
//! Three fire-once calls over fixed JSON contracts:
//!
//! - `GET {api}/posts` returns `{ items: Post[] }`
//! - `GET {api}/posts/{slug}` returns a `Post`
//! - `POST {api}/posts` creates a post and returns it
//!
//! There are no retries, no caching and no timeouts. Every failure is an
//! [`ApiError`]; the pages do not distinguish between its variants.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::Config;

pub mod post;

pub use post::{NewPost, Post, PostList, TrustedHtml};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the response body not received.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Http { url: String, status: u16 },
    /// The body is not the JSON the contract promises.
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid API url {0:?}")]
    InvalidUrl(String),
}

/// Anything that can serve posts to the pages.
///
/// `?Send` because the browser futures are single-threaded.
#[async_trait(?Send)]
pub trait PostSource {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;
    async fn get_post(&self, slug: &str) -> Result<Post, ApiError>;
    async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError>;
}

/// `reqwest` implementation of [`PostSource`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base =
            Url::parse(&normalized).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_url)
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let network = |source| ApiError::Network {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(network)?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait(?Send)]
impl PostSource for ApiClient {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let url = self.endpoint(&["posts"])?;
        log::debug!("GET {}", url);
        let list: PostList = self.fetch(self.http.get(url.clone()), &url).await?;
        Ok(list.items)
    }

    async fn get_post(&self, slug: &str) -> Result<Post, ApiError> {
        let url = self.endpoint(&["posts", slug])?;
        log::debug!("GET {}", url);
        self.fetch(self.http.get(url.clone()), &url).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        let url = self.endpoint(&["posts"])?;
        log::debug!("POST {}", url);
        self.fetch(self.http.post(url.clone()).json(post), &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoints_under_the_base_path() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.endpoint(&["posts"]).unwrap().as_str(),
            "http://localhost:8000/posts"
        );

        let nested = ApiClient::new("https://example.com/api/").unwrap();
        assert_eq!(
            nested.endpoint(&["posts", "hello-world"]).unwrap().as_str(),
            "https://example.com/api/posts/hello-world"
        );
    }

    #[test]
    fn slugs_stay_one_path_segment() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        let url = client.endpoint(&["posts", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/posts/a%2Fb%20c");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
    }
}
