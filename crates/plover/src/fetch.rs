//! Fetching every post of a blog from the Blogger API.
//!
//! The API hands out posts a batch at a time; each response carries a
//! `nextPageToken` until the last batch. [`fetch_all_posts`] follows those
//! tokens through any [`PostSource`], and [`BloggerClient`] is the source that
//! talks HTTP.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BloggerConfig;
use crate::content::PostMeta;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode posts: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to access post cache '{path}': {source}")]
    Cache { path: PathBuf, source: io::Error },
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) | Self::Url(_) | Self::Cache { .. } => false,
        }
    }
}

/// One batch of posts from the listing endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostList {
    #[serde(default)]
    pub items: Vec<PostMeta>,

    /// The token for the next batch. Absent on the last batch.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A paginated source of posts.
pub trait PostSource {
    /// Fetches the batch identified by `page_token`, or the first batch when
    /// there is no token.
    fn fetch_page(&self, page_token: Option<&str>) -> Result<PostList, FetchError>;
}

/// Fetches every post from the given source, following continuation tokens
/// until the source reports no further batches.
///
/// Posts are returned in the order the source produced them. Any failed batch
/// fails the whole fetch.
pub fn fetch_all_posts(source: &impl PostSource) -> Result<Vec<PostMeta>, FetchError> {
    let mut posts = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page_count = 0;

    loop {
        page_count += 1;
        debug!(page = page_count, "fetching posts page");

        let page = source.fetch_page(page_token.as_deref())?;
        let fetched = page.items.len();
        posts.extend(page.items);

        debug!(
            page = page_count,
            posts = fetched,
            total = posts.len(),
            "fetched posts page"
        );

        match page.next_page_token.filter(|token| !token.is_empty()) {
            Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                warn!(page = page_count, "source repeated its page token, stopping");
                break;
            }
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    info!(posts = posts.len(), pages = page_count, "fetched all posts");

    Ok(posts)
}

/// A [`PostSource`] backed by the Blogger v3 REST API.
pub struct BloggerClient {
    client: Client,
    posts_url: Url,
    api_key: String,
    max_results: u32,
    retries: u32,
    retry_backoff: Duration,
}

impl BloggerClient {
    pub fn new(config: &BloggerConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let posts_url = Url::parse(&format!(
            "{}/blogs/{}/posts",
            config.api_base.as_str().trim_end_matches('/'),
            config.blog_id
        ))?;

        Ok(Self {
            client,
            posts_url,
            api_key: config.api_key.clone(),
            max_results: config.max_results,
            retries: config.retries,
            retry_backoff: config.retry_backoff,
        })
    }

    fn page_url(&self, page_token: Option<&str>) -> Url {
        let mut url = self.posts_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("key", &self.api_key)
                .append_pair("maxResults", &self.max_results.to_string());

            if let Some(page_token) = page_token {
                query.append_pair("pageToken", page_token);
            }
        }

        url
    }

    fn request_page(&self, page_token: Option<&str>) -> Result<PostList, FetchError> {
        let response = self.client.get(self.page_url(page_token)).send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl PostSource for BloggerClient {
    fn fetch_page(&self, page_token: Option<&str>) -> Result<PostList, FetchError> {
        with_retries(self.retries, self.retry_backoff, || self.request_page(page_token))
    }
}

/// Runs `request`, retrying retryable failures up to `retries` times.
///
/// The wait before each retry grows linearly: `backoff`, `2 * backoff`, ...
fn with_retries<T>(
    retries: u32,
    backoff: Duration,
    mut request: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut attempt = 0;

    loop {
        match request() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < retries => {
                attempt += 1;
                let backoff = backoff * attempt;

                // Request URLs carry the API key, so they are never logged.
                warn!(attempt, ?backoff, error = %err, "retrying posts request");

                thread::sleep(backoff);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Writes the raw posts to `path` as pretty-printed JSON.
pub fn write_cache(path: &Path, posts: &[&PostMeta]) -> Result<(), FetchError> {
    let cache_error = |source| FetchError::Cache {
        path: path.to_owned(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(cache_error)?;
    }

    let json = serde_json::to_string_pretty(posts)?;
    fs::write(path, json).map_err(cache_error)?;

    debug!(path = %path.display(), posts = posts.len(), "wrote post cache");

    Ok(())
}

/// Reads posts previously written by [`write_cache`].
pub fn read_cache(path: &Path) -> Result<Vec<PostMeta>, FetchError> {
    let json = fs::read_to_string(path).map_err(|source| FetchError::Cache {
        path: path.to_owned(),
        source,
    })?;

    let posts: Vec<PostMeta> = serde_json::from_str(&json)?;

    info!(path = %path.display(), posts = posts.len(), "read post cache");

    Ok(posts)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_meta(id: &str) -> PostMeta {
        PostMeta {
            id: id.to_string(),
            title: format!("Post {id}"),
            content: String::new(),
            labels: Vec::new(),
            published: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
            updated: None,
            url: None,
            author: None,
            extra: Default::default(),
        }
    }

    /// Serves canned batches and records the tokens it was asked for.
    struct FakeSource {
        pages: RefCell<VecDeque<Result<PostList, FetchError>>>,
        requested_tokens: RefCell<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Result<PostList, FetchError>>) -> Self {
            Self {
                pages: RefCell::new(pages.into()),
                requested_tokens: RefCell::new(Vec::new()),
            }
        }
    }

    impl PostSource for FakeSource {
        fn fetch_page(&self, page_token: Option<&str>) -> Result<PostList, FetchError> {
            self.requested_tokens
                .borrow_mut()
                .push(page_token.map(str::to_string));

            self.pages
                .borrow_mut()
                .pop_front()
                .expect("fetched more pages than were served")
        }
    }

    fn page(ids: &[&str], next_page_token: Option<&str>) -> Result<PostList, FetchError> {
        Ok(PostList {
            items: ids.iter().map(|id| make_meta(id)).collect(),
            next_page_token: next_page_token.map(str::to_string),
        })
    }

    #[test]
    fn test_fetch_all_posts_follows_page_tokens() {
        let source = FakeSource::new(vec![
            page(&["1", "2"], Some("abc")),
            page(&["3"], Some("def")),
            page(&["4"], None),
        ]);

        let posts = fetch_all_posts(&source).unwrap();

        assert_eq!(
            posts.iter().map(|post| post.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3", "4"]
        );
        assert_eq!(
            *source.requested_tokens.borrow(),
            vec![None, Some("abc".to_string()), Some("def".to_string())]
        );
    }

    #[test]
    fn test_fetch_all_posts_stops_on_empty_token() {
        let source = FakeSource::new(vec![page(&["1"], Some(""))]);

        let posts = fetch_all_posts(&source).unwrap();

        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn test_fetch_all_posts_stops_on_repeated_token() {
        let source = FakeSource::new(vec![page(&["1"], Some("same")), page(&["2"], Some("same"))]);

        let posts = fetch_all_posts(&source).unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(source.requested_tokens.borrow().len(), 2);
    }

    #[test]
    fn test_fetch_all_posts_fails_on_any_failed_page() {
        let source = FakeSource::new(vec![
            page(&["1"], Some("abc")),
            Err(FetchError::Status {
                status: 403,
                body: "forbidden".to_string(),
            }),
        ]);

        let err = fetch_all_posts(&source).unwrap_err();

        assert_eq!(err.to_string(), "request failed with status 403: forbidden");
    }

    #[test]
    fn test_post_list_without_items() {
        let list: PostList = serde_json::from_str(r#"{ "kind": "blogger#postList" }"#).unwrap();

        assert!(list.items.is_empty());
        assert_eq!(list.next_page_token, None);
    }

    #[test]
    fn test_retryable_errors() {
        let status = |status| FetchError::Status {
            status,
            body: String::new(),
        };

        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(429).is_retryable());
    }

    fn failing(status: u16) -> impl FnMut() -> Result<(), FetchError> {
        move || {
            Err(FetchError::Status {
                status,
                body: String::new(),
            })
        }
    }

    #[test]
    fn test_with_retries_gives_up_after_retries() {
        let mut attempts = 0;
        let mut request = failing(503);

        let err = with_retries(2, Duration::ZERO, || {
            attempts += 1;
            request()
        })
        .unwrap_err();

        assert_eq!(attempts, 3);
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[test]
    fn test_with_retries_never_retries_client_errors() {
        let mut attempts = 0;
        let mut request = failing(404);

        let err = with_retries(5, Duration::ZERO, || {
            attempts += 1;
            request()
        })
        .unwrap_err();

        assert_eq!(attempts, 1);
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn test_with_retries_recovers() {
        let mut responses = VecDeque::from([
            Err(FetchError::Status {
                status: 502,
                body: String::new(),
            }),
            Ok("page"),
        ]);

        let page = with_retries(3, Duration::ZERO, || responses.pop_front().unwrap()).unwrap();

        assert_eq!(page, "page");
        assert!(responses.is_empty());
    }

    #[test]
    fn test_with_retries_disabled() {
        let mut attempts = 0;
        let mut request = failing(500);

        with_retries(0, Duration::ZERO, || {
            attempts += 1;
            request()
        })
        .unwrap_err();

        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_page_url() {
        let config = BloggerConfig {
            blog_id: "123".to_string(),
            api_key: "secret".to_string(),
            max_results: 50,
            retries: 0,
            retry_backoff: Duration::from_millis(0),
            timeout: Duration::from_secs(5),
            api_base: Url::parse("https://www.googleapis.com/blogger/v3/").unwrap(),
        };
        let client = BloggerClient::new(&config).unwrap();

        assert_eq!(
            client.page_url(None).as_str(),
            "https://www.googleapis.com/blogger/v3/blogs/123/posts?key=secret&maxResults=50"
        );
        assert_eq!(
            client.page_url(Some("CgkIChi")).as_str(),
            "https://www.googleapis.com/blogger/v3/blogs/123/posts?key=secret&maxResults=50&pageToken=CgkIChi"
        );
    }

    #[test]
    fn test_cache_round_trip_preserves_order() {
        let dir = std::env::temp_dir().join(format!("plover-cache-test-{}", std::process::id()));
        let path = dir.join("data").join("posts.json");
        let metas = vec![make_meta("2"), make_meta("1")];

        write_cache(&path, &metas.iter().collect::<Vec<_>>()).unwrap();
        let read = read_cache(&path).unwrap();

        assert_eq!(read, metas);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_missing_cache() {
        let err = read_cache(Path::new("/nonexistent/plover/posts.json")).unwrap_err();

        assert!(matches!(err, FetchError::Cache { .. }));
    }
}
