use url::Url;

/// The absolute URL of a generated page.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct Permalink(Url);

impl Permalink {
    /// Joins an output path (e.g., `posts/hello-1.html`) onto the site's base
    /// URL. The base URL's own path is kept, with or without a trailing slash.
    pub fn from_path(base_url: &Url, path: &str) -> Result<Self, url::ParseError> {
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let base_path = format!("{}/", base_url.path());
            base_url.set_path(&base_path);
        }

        let path = path.trim_start_matches('/');

        Ok(Self(base_url.join(path)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_base_url(base_url: &str) -> Url {
        base_url.parse().unwrap()
    }

    #[test]
    fn test_permalink() {
        assert_eq!(
            Permalink::from_path(&make_base_url("https://example.com/"), "/").unwrap(),
            Permalink("https://example.com/".parse().unwrap())
        );
        assert_eq!(
            Permalink::from_path(&make_base_url("https://example.com"), "").unwrap(),
            Permalink("https://example.com/".parse().unwrap())
        );
        assert_eq!(
            Permalink::from_path(&make_base_url("https://example.com"), "posts/hello-1.html")
                .unwrap()
                .as_str(),
            "https://example.com/posts/hello-1.html"
        );
    }

    #[test]
    fn test_permalink_keeps_base_path() {
        let permalink = Permalink::from_path(
            &make_base_url("https://example.github.io/blog"),
            "/labels/rust-1.html",
        )
        .unwrap();

        assert_eq!(permalink.path(), "/blog/labels/rust-1.html");
    }
}
