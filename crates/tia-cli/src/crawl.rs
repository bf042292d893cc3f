//! Paginated crawler for the site's posts and comments API.
//!
//! ```text
//! GET {base}?page=N                    ─▶ raw/posts/{N}
//! GET {base}/{post_id}/comments?page=N ─▶ raw/comments/{post_id}_{N}
//! ```
//!
//! The first page's `total_pages` bounds the loop. Bodies are written
//! verbatim. After advancing to a page number divisible by
//! `sleep_interval`, the crawler pauses for one second.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tia_core::config::CrawlConfig;
use tia_core::input::collect_post_ids;
use tia_core::{ErrorCode, TiaError};
use tracing::{debug, info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} has no usable total_pages")]
    MissingTotalPages { url: String },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Input(#[from] TiaError),
}

impl CrawlError {
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Request { .. }
            | Self::Body { .. }
            | Self::Json { .. }
            | Self::MissingTotalPages { .. } => ErrorCode::CrawlRequestFailed,
            Self::Write { .. } => ErrorCode::OutputWriteFailed,
            Self::Input(e) => e.error_code(),
        }
    }
}

/// Something that can fetch a page body by URL.
pub trait PageSource {
    /// Fetch `url` and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Request`] or [`CrawlError::Body`] on failure.
    fn fetch(&self, url: &str) -> Result<String, CrawlError>;
}

/// Blocking HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSource {
    user_agent: String,
}

impl HttpSource {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let response = ureq::get(url)
            .set("User-Agent", &self.user_agent)
            .call()
            .map_err(|err| CrawlError::Request {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        response.into_string().map_err(|source| CrawlError::Body {
            url: url.to_string(),
            source,
        })
    }
}

/// What to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Posts,
    Comments { post_id: u64 },
}

impl Target {
    fn url(self, base: &str, page: u32) -> String {
        match self {
            Self::Posts => format!("{base}?page={page}"),
            Self::Comments { post_id } => format!("{base}/{post_id}/comments?page={page}"),
        }
    }

    fn file_name(self, page: u32) -> String {
        match self {
            Self::Posts => page.to_string(),
            Self::Comments { post_id } => format!("{post_id}_{page}"),
        }
    }
}

/// Pages written by one crawl command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub target: &'static str,
    /// Posts whose comments were crawled; zero for a posts crawl.
    pub posts: usize,
    pub pages: u32,
    pub output_dir: PathBuf,
}

pub struct Crawler<S> {
    source: S,
    base_url: String,
    sleep_interval: u32,
    pause: Duration,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, cfg: &CrawlConfig) -> Self {
        Self {
            source,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            sleep_interval: cfg.sleep_interval,
            pause: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Crawl every page of `target` from `start`, writing into `dir`.
    /// Returns the number of pages written.
    ///
    /// # Errors
    ///
    /// Fails on the first request, decode, or write error.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub fn crawl(&self, target: Target, dir: &Path, start: u32) -> Result<u32, CrawlError> {
        fs::create_dir_all(dir).map_err(|source| CrawlError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut page = start;
        let total_pages = self.fetch_page(target, dir, page)?;
        let mut written = 1;
        page += 1;

        while page <= total_pages {
            self.fetch_page(target, dir, page)?;
            written += 1;
            page += 1;

            if self.sleep_interval > 0 && page % self.sleep_interval == 0 {
                thread::sleep(self.pause);
            }
        }

        debug!(?target, pages = written, "crawl finished");
        Ok(written)
    }

    /// Crawl all posts into `dir`.
    ///
    /// # Errors
    ///
    /// See [`Crawler::crawl`].
    pub fn crawl_posts(&self, dir: &Path, start: u32) -> Result<CrawlSummary, CrawlError> {
        let pages = self.crawl(Target::Posts, dir, start)?;
        info!(pages, "crawled posts");
        Ok(CrawlSummary {
            target: "posts",
            posts: 0,
            pages,
            output_dir: dir.to_path_buf(),
        })
    }

    /// Crawl the comments of every post found in `posts_dir` into `dir`,
    /// in ascending post id order.
    ///
    /// # Errors
    ///
    /// Fails if the post snapshot cannot be read, or see [`Crawler::crawl`].
    pub fn crawl_comments(&self, posts_dir: &Path, dir: &Path) -> Result<CrawlSummary, CrawlError> {
        let ids = collect_post_ids(posts_dir)?;
        let mut pages = 0;
        for &post_id in &ids {
            pages += self.crawl(Target::Comments { post_id }, dir, 1)?;
        }
        info!(posts = ids.len(), pages, "crawled comments");
        Ok(CrawlSummary {
            target: "comments",
            posts: ids.len(),
            pages,
            output_dir: dir.to_path_buf(),
        })
    }

    /// Fetch one page, write it, and return its `total_pages`.
    fn fetch_page(&self, target: Target, dir: &Path, page: u32) -> Result<u32, CrawlError> {
        let url = target.url(&self.base_url, page);
        info!(%url, page, "crawling page");
        let body = self.source.fetch(&url)?;
        let total = total_pages(&url, &body)?;

        let path = dir.join(target.file_name(page));
        fs::write(&path, &body).map_err(|source| CrawlError::Write { path, source })?;
        Ok(total)
    }
}

/// Read `total_pages` from a page body. Numeric strings are accepted.
fn total_pages(url: &str, body: &str) -> Result<u32, CrawlError> {
    let json: Value = serde_json::from_str(body).map_err(|source| CrawlError::Json {
        url: url.to_string(),
        source,
    })?;

    json.get("total_pages")
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| CrawlError::MissingTotalPages {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const BASE: &str = "https://api.test/posts";

    /// Serves canned bodies and records every requested URL.
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, String>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl PageSource for &FakeSource {
        fn fetch(&self, url: &str) -> Result<String, CrawlError> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| CrawlError::Request {
                url: url.to_string(),
                message: "404".to_string(),
            })
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig {
            base_url: format!("{BASE}/"),
            ..CrawlConfig::default()
        }
    }

    #[test]
    fn crawls_until_total_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FakeSource::default()
            .page(&format!("{BASE}?page=1"), r#"{"total_pages":3,"posts":[]}"#)
            .page(&format!("{BASE}?page=2"), r#"{"total_pages":3,"posts":[]}"#)
            .page(&format!("{BASE}?page=3"), r#"{"total_pages":3,"posts":[]}"#);
        let crawler = Crawler::new(&source, &config()).with_pause(Duration::ZERO);

        let summary = crawler.crawl_posts(dir.path(), 1).expect("crawl");
        assert_eq!(summary.pages, 3);
        assert_eq!(source.requested.borrow().len(), 3);
        for page in ["1", "2", "3"] {
            assert!(dir.path().join(page).is_file());
        }
    }

    #[test]
    fn bodies_are_written_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = r#"{ "total_pages": "1", "posts": [ {"id": 9} ] }"#;
        let source = FakeSource::default().page(&format!("{BASE}?page=1"), body);
        let crawler = Crawler::new(&source, &config());

        crawler.crawl(Target::Posts, dir.path(), 1).expect("crawl");
        assert_eq!(fs::read_to_string(dir.path().join("1")).expect("read"), body);
    }

    #[test]
    fn comments_are_crawled_per_post_in_id_order() {
        let root = tempfile::tempdir().expect("tempdir");
        let posts = root.path().join("posts");
        let comments = root.path().join("comments");
        fs::create_dir_all(&posts).expect("mkdir");
        fs::write(posts.join("1"), r#"{"posts":[{"id":30},{"id":4}]}"#).expect("write");

        let one_page = r#"{"total_pages":1,"comments":[]}"#;
        let source = FakeSource::default()
            .page(&format!("{BASE}/4/comments?page=1"), one_page)
            .page(&format!("{BASE}/30/comments?page=1"), one_page);
        let crawler = Crawler::new(&source, &config());

        let summary = crawler.crawl_comments(&posts, &comments).expect("crawl");
        assert_eq!(summary.posts, 2);
        assert_eq!(summary.pages, 2);
        assert_eq!(
            *source.requested.borrow(),
            [
                format!("{BASE}/4/comments?page=1"),
                format!("{BASE}/30/comments?page=1")
            ]
        );
        assert!(comments.join("4_1").is_file());
        assert!(comments.join("30_1").is_file());
    }

    #[test]
    fn missing_total_pages_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FakeSource::default().page(&format!("{BASE}?page=1"), r#"{"posts":[]}"#);
        let crawler = Crawler::new(&source, &config());

        let err = crawler.crawl(Target::Posts, dir.path(), 1).expect_err("no total");
        assert!(matches!(err, CrawlError::MissingTotalPages { .. }));
        assert_eq!(err.error_code(), ErrorCode::CrawlRequestFailed);
    }

    #[test]
    fn failed_request_stops_the_crawl() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FakeSource::default()
            .page(&format!("{BASE}?page=1"), r#"{"total_pages":3}"#);
        let crawler = Crawler::new(&source, &config());

        let err = crawler.crawl(Target::Posts, dir.path(), 1).expect_err("page 2 missing");
        assert!(matches!(err, CrawlError::Request { .. }));
        assert_eq!(source.requested.borrow().len(), 2);
    }

    #[test]
    fn start_page_past_total_fetches_only_the_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FakeSource::default()
            .page(&format!("{BASE}?page=5"), r#"{"total_pages":2}"#);
        let crawler = Crawler::new(&source, &config());

        assert_eq!(crawler.crawl(Target::Posts, dir.path(), 5).expect("crawl"), 1);
    }
}
