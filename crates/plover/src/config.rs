//! Site configuration, read from a TOML file and overridden by the
//! environment.
//!
//! ```toml
//! base_url = "https://blog.example.com"
//! title = "My Blog"
//! posts_per_page = 10
//! timezone = "Asia/Jakarta"
//!
//! [blogger]
//! blog_id = "8601707668889540603"
//! ```
//!
//! The API key is normally left out of the file and supplied through
//! `BLOGGER_API_KEY` instead.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::content::AnnotateOptions;

/// The environment variable holding the blog ID.
pub const BLOG_ID_ENV: &str = "BLOG_ID";

/// The environment variable holding the Blogger API key.
pub const API_KEY_ENV: &str = "BLOGGER_API_KEY";

pub const DEFAULT_CONFIG_FILE: &str = "plover.toml";

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/blogger/v3/";

const DEFAULT_BASE_URL: &str = "https://example.com/";

const DEFAULT_PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/600x300?text=No+Image";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("missing blog ID (set `blogger.blog_id` or BLOG_ID)")]
    MissingBlogId,

    #[error("missing API key (set `blogger.api_key` or BLOGGER_API_KEY)")]
    MissingApiKey,

    #[error("invalid configuration: `posts_per_page` must be at least 1")]
    InvalidPostsPerPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// The URL the site is served from. Used for canonical links.
    pub base_url: Url,
    pub title: String,
    pub description: Option<String>,
    pub language: String,
    pub posts_per_page: usize,

    /// The number of words in a post preview.
    pub preview_words: usize,

    /// The maximum number of related posts listed on a post page.
    pub related_posts: usize,

    /// The image shown for posts that don't contain one.
    pub placeholder_image: String,

    /// The time zone dates are displayed in.
    pub timezone: Tz,

    /// A [`chrono::format::strftime`] format string.
    pub date_format: String,

    pub output_dir: PathBuf,

    /// A directory copied verbatim into the output directory, if it exists.
    pub assets_dir: PathBuf,

    /// The directory holding the `custom_*.html` partials.
    pub partials_dir: PathBuf,

    /// Whether to dump the fetched posts to `data/posts.json`.
    pub write_cache: bool,

    pub blogger: BloggerSection,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            title: "Blog".to_string(),
            description: None,
            language: "en".to_string(),
            posts_per_page: 10,
            preview_words: 30,
            related_posts: 5,
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            timezone: Tz::UTC,
            date_format: "%B %-d, %Y".to_string(),
            output_dir: PathBuf::from("_site"),
            assets_dir: PathBuf::from("assets"),
            partials_dir: PathBuf::from("."),
            write_cache: true,
            blogger: BloggerSection::default(),
        }
    }
}

/// The `[blogger]` table of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BloggerSection {
    pub blog_id: Option<String>,
    pub api_key: Option<String>,

    /// The number of posts requested per batch.
    pub max_results: u32,

    /// How many times a failed request is retried. Only transport errors and
    /// server errors are retried.
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub timeout_secs: u64,
    pub api_base: Url,
}

impl Default for BloggerSection {
    fn default() -> Self {
        Self {
            blog_id: None,
            api_key: None,
            max_results: 50,
            retries: 0,
            retry_backoff_ms: 1000,
            timeout_secs: 30,
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base URL is valid"),
        }
    }
}

/// Everything needed to talk to the Blogger API.
#[derive(Debug, Clone)]
pub struct BloggerConfig {
    pub blog_id: String,
    pub api_key: String,
    pub max_results: u32,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub timeout: Duration,
    pub api_base: Url,
}

impl SiteConfig {
    /// Loads the configuration from `path` and the process environment.
    ///
    /// When no path is given, `plover.toml` in the working directory is used
    /// if it exists, and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_path(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Overrides the Blogger credentials with any that are set in the
    /// environment. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());

        if let Some(blog_id) = lookup(BLOG_ID_ENV) {
            self.blogger.blog_id = Some(blog_id);
        }

        if let Some(api_key) = lookup(API_KEY_ENV) {
            self.blogger.api_key = Some(api_key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.posts_per_page == 0 {
            return Err(ConfigError::InvalidPostsPerPage);
        }

        Ok(())
    }

    /// Returns the Blogger settings, failing if the blog ID or API key is
    /// missing.
    pub fn blogger_config(&self) -> Result<BloggerConfig, ConfigError> {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let blog_id = non_empty(&self.blogger.blog_id).ok_or(ConfigError::MissingBlogId)?;
        let api_key = non_empty(&self.blogger.api_key).ok_or(ConfigError::MissingApiKey)?;

        Ok(BloggerConfig {
            blog_id,
            api_key,
            max_results: self.blogger.max_results,
            retries: self.blogger.retries,
            retry_backoff: Duration::from_millis(self.blogger.retry_backoff_ms),
            timeout: Duration::from_secs(self.blogger.timeout_secs),
            api_base: self.blogger.api_base.clone(),
        })
    }

    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            preview_words: self.preview_words,
        }
    }

    /// Returns the path of the JSON dump of fetched posts.
    pub fn cache_path(&self) -> PathBuf {
        self.output_dir.join("data").join("posts.json")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_config() {
        let config = SiteConfig::parse(indoc! {r#"
            base_url = "https://ceritagetar.github.io"
            title = "Cerita Getar"
            language = "id"
            posts_per_page = 12
            timezone = "Asia/Jakarta"

            [blogger]
            blog_id = "8601707668889540603"
            retries = 2
        "#})
        .unwrap();

        assert_eq!(config.base_url.as_str(), "https://ceritagetar.github.io/");
        assert_eq!(config.title, "Cerita Getar");
        assert_eq!(config.language, "id");
        assert_eq!(config.posts_per_page, 12);
        assert_eq!(config.timezone, Tz::Asia__Jakarta);
        assert_eq!(config.preview_words, 30);
        assert_eq!(config.blogger.blog_id.as_deref(), Some("8601707668889540603"));
        assert_eq!(config.blogger.retries, 2);
        assert_eq!(config.blogger.max_results, 50);
    }

    #[test]
    fn test_parse_rejects_unknown_fields_and_bad_values() {
        assert!(SiteConfig::parse("posts_per_pgae = 5").is_err());
        assert!(SiteConfig::parse(r#"base_url = "not a url""#).is_err());
        assert!(SiteConfig::parse(r#"timezone = "Mars/Olympus_Mons""#).is_err());
    }

    #[test]
    fn test_validate_posts_per_page() {
        let config = SiteConfig::parse("posts_per_page = 0").unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPostsPerPage)
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = SiteConfig::parse(indoc! {r#"
            [blogger]
            blog_id = "from-file"
            api_key = "file-key"
        "#})
        .unwrap();

        let env = HashMap::from([(BLOG_ID_ENV, "from-env"), (API_KEY_ENV, "  ")]);
        config.apply_env(|key| env.get(key).map(|value| value.to_string()));

        let blogger = config.blogger_config().unwrap();
        assert_eq!(blogger.blog_id, "from-env");
        assert_eq!(blogger.api_key, "file-key");
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = SiteConfig::default();
        assert!(matches!(
            config.blogger_config(),
            Err(ConfigError::MissingBlogId)
        ));

        config.blogger.blog_id = Some("123".to_string());
        config.blogger.api_key = Some("".to_string());
        assert!(matches!(
            config.blogger_config(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_cache_path() {
        let config = SiteConfig::default();

        assert_eq!(config.cache_path(), PathBuf::from("_site/data/posts.json"));
    }
}
