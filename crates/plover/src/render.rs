use std::ops::Deref;

use url::Url;

use crate::content::{LabelGroup, LabelIndex, Post, Thumbnail};
use crate::date::format_date;
use crate::paginate::{pagination_links, PaginationError, PaginationLink};
use crate::partials::Partials;
use crate::permalink::Permalink;
use crate::SiteConfig;

/// Returns the output path of the given (1-based) index page.
pub fn index_page_path(page_number: usize) -> String {
    if page_number <= 1 {
        "index.html".to_string()
    } else {
        format!("index-{page_number}.html")
    }
}

/// Returns the output path of the given (1-based) page of a label.
pub fn label_page_path(label_slug: &str, page_number: usize) -> String {
    format!("labels/{label_slug}-{page_number}.html")
}

/// Turns output paths into links.
#[derive(Debug, Clone)]
pub(crate) struct Links {
    base_url: Url,
    root_path: String,
}

impl Links {
    pub fn new(base_url: &Url) -> Self {
        let root_path = base_url.path().trim_end_matches('/');

        Self {
            base_url: base_url.clone(),
            root_path: format!("{root_path}/"),
        }
    }

    /// Returns the root-relative URL of an output path.
    pub fn path(&self, output_path: &str) -> String {
        format!("{}{}", self.root_path, output_path.trim_start_matches('/'))
    }

    /// Returns the absolute URL of an output path.
    pub fn permalink(&self, output_path: &str) -> Result<String, url::ParseError> {
        Ok(Permalink::from_path(&self.base_url, output_path)?
            .as_str()
            .to_string())
    }
}

pub struct BaseRenderContext<'a> {
    pub(crate) config: &'a SiteConfig,
    pub(crate) partials: &'a Partials,
    pub(crate) links: &'a Links,
    pub(crate) labels: &'a [LabelToRender<'a>],
}

impl<'a> BaseRenderContext<'a> {
    pub fn config(&self) -> &'a SiteConfig {
        self.config
    }

    pub fn partials(&self) -> &'a Partials {
        self.partials
    }

    pub fn site_title(&self) -> &'a str {
        &self.config.title
    }

    /// Every label on the site, in the order it was first seen.
    pub fn labels(&self) -> &'a [LabelToRender<'a>] {
        self.labels
    }

    /// Returns the root-relative URL of a path in the generated site
    /// (e.g., `assets/style.css`).
    pub fn url_for(&self, path: &str) -> String {
        self.links.path(path)
    }

    pub fn home_url(&self) -> String {
        self.links.path(&index_page_path(1))
    }
}

pub struct RenderIndexContext<'a> {
    pub(crate) base: BaseRenderContext<'a>,
    pub permalink: String,
    pub posts: Vec<PostToRender<'a>>,
    pub pagination: PaginationToRender,
}

impl<'a> Deref for RenderIndexContext<'a> {
    type Target = BaseRenderContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

pub struct RenderLabelContext<'a> {
    pub(crate) base: BaseRenderContext<'a>,
    pub permalink: String,
    pub label: LabelToRender<'a>,
    pub posts: Vec<PostToRender<'a>>,
    pub pagination: PaginationToRender,
}

impl<'a> Deref for RenderLabelContext<'a> {
    type Target = BaseRenderContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

pub struct RenderPostContext<'a> {
    pub(crate) base: BaseRenderContext<'a>,
    pub post: PostToRender<'a>,
    pub related: Vec<PostToRender<'a>>,
}

impl<'a> Deref for RenderPostContext<'a> {
    type Target = BaseRenderContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelToRender<'a> {
    pub name: &'a str,
    pub slug: &'a str,

    /// The URL of the label's first page.
    pub url: String,
    pub post_count: usize,
}

impl<'a> LabelToRender<'a> {
    pub(crate) fn from_group(slug: &'a str, group: &LabelGroup<'a>, links: &Links) -> Self {
        Self {
            name: group.display_name,
            slug,
            url: links.path(&label_page_path(slug, 1)),
            post_count: group.posts.len(),
        }
    }

    pub(crate) fn all(labels: &'a LabelIndex<'a>, links: &Links) -> Vec<Self> {
        labels
            .iter()
            .map(|(slug, group)| Self::from_group(slug, group, links))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostToRender<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub slug: &'a str,

    /// The root-relative URL of the post's page.
    pub url: String,
    pub permalink: String,

    /// The publication date, formatted for display.
    pub published: String,

    /// The publication date in RFC 3339 format, for machines.
    pub published_rfc3339: String,
    pub updated_rfc3339: Option<String>,
    pub author: Option<&'a str>,

    /// The post's content, as HTML.
    pub content: &'a str,
    pub preview: &'a str,
    pub thumbnail_url: &'a str,
    pub has_image: bool,
    pub labels: Vec<LabelToRender<'a>>,
}

impl<'a> PostToRender<'a> {
    pub(crate) fn from_post(
        post: &'a Post,
        config: &'a SiteConfig,
        labels: &'a LabelIndex<'a>,
        links: &Links,
    ) -> Result<Self, url::ParseError> {
        let output_path = post.output_path();

        let post_labels = post
            .label_slugs
            .iter()
            .filter_map(|slug| {
                let (slug, group) = labels.get_key_value(slug.as_str())?;
                Some(LabelToRender::from_group(slug, group, links))
            })
            .collect();

        Ok(Self {
            id: post.id(),
            title: post.title(),
            slug: &post.slug,
            url: links.path(&output_path),
            permalink: links.permalink(&output_path)?,
            published: format_date(&post.meta.published, &config.date_format, config.timezone),
            published_rfc3339: post.meta.published.to_rfc3339(),
            updated_rfc3339: post.meta.updated.map(|updated| updated.to_rfc3339()),
            author: post
                .meta
                .author
                .as_ref()
                .map(|author| author.display_name.as_str()),
            content: &post.meta.content,
            preview: &post.preview,
            thumbnail_url: post.thumbnail.url_or(&config.placeholder_image),
            has_image: matches!(post.thumbnail, Thumbnail::Image(_)),
            labels: post_labels,
        })
    }

    /// The post's first label, if any.
    pub fn first_label(&self) -> Option<&LabelToRender<'a>> {
        self.labels.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLinkToRender {
    Page {
        number: usize,
        url: String,
        is_current: bool,
    },
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationToRender {
    pub current: usize,
    pub total: usize,
    pub links: Vec<PageLinkToRender>,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PaginationToRender {
    pub(crate) fn new(
        current: usize,
        total: usize,
        page_url: impl Fn(usize) -> String,
    ) -> Result<Self, PaginationError> {
        let links = pagination_links(current, total)?
            .into_iter()
            .map(|link| match link {
                PaginationLink::Page { number, is_current } => PageLinkToRender::Page {
                    number,
                    url: page_url(number),
                    is_current,
                },
                PaginationLink::Ellipsis => PageLinkToRender::Ellipsis,
            })
            .collect();

        Ok(Self {
            current,
            total,
            links,
            previous_url: (current > 1).then(|| page_url(current - 1)),
            next_url: (current < total).then(|| page_url(current + 1)),
        })
    }

    /// Whether there's more than one page to navigate between.
    pub fn is_needed(&self) -> bool {
        self.total > 1
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    use crate::content::{build_label_index, AnnotateOptions, PostMeta};

    use super::*;

    #[test]
    fn test_output_paths() {
        assert_eq!(index_page_path(1), "index.html");
        assert_eq!(index_page_path(3), "index-3.html");
        assert_eq!(label_page_path("rust", 1), "labels/rust-1.html");
    }

    #[test]
    fn test_links_under_base_path() {
        let links = Links::new(&"https://example.github.io/blog".parse().unwrap());

        assert_eq!(links.path("index.html"), "/blog/index.html");
        assert_eq!(
            links.permalink("posts/a-1.html").unwrap(),
            "https://example.github.io/blog/posts/a-1.html"
        );
    }

    #[test]
    fn test_pagination_to_render() {
        let pagination = PaginationToRender::new(2, 3, index_page_path).unwrap();

        assert_eq!(
            pagination,
            PaginationToRender {
                current: 2,
                total: 3,
                links: vec![
                    PageLinkToRender::Page {
                        number: 1,
                        url: "index.html".to_string(),
                        is_current: false,
                    },
                    PageLinkToRender::Page {
                        number: 2,
                        url: "index-2.html".to_string(),
                        is_current: true,
                    },
                    PageLinkToRender::Page {
                        number: 3,
                        url: "index-3.html".to_string(),
                        is_current: false,
                    },
                ],
                previous_url: Some("index.html".to_string()),
                next_url: Some("index-3.html".to_string()),
            }
        );
    }

    #[test]
    fn test_post_to_render() {
        let config = SiteConfig::default();
        let links = Links::new(&config.base_url);
        let posts = vec![Post::from_meta(
            PostMeta {
                id: "42".to_string(),
                title: "Hello, World!".to_string(),
                content: "<p>Just text.</p>".to_string(),
                labels: vec!["Rust Lang".to_string(), "rust-lang".to_string()],
                published: DateTime::parse_from_rfc3339("2024-01-05T10:00:00+07:00").unwrap(),
                updated: None,
                url: None,
                author: None,
                extra: Default::default(),
            },
            &AnnotateOptions { preview_words: 30 },
        )];
        let labels = build_label_index(&posts);

        let post = PostToRender::from_post(&posts[0], &config, &labels, &links).unwrap();

        assert_eq!(post.url, "/posts/hello-world-42.html");
        assert_eq!(post.permalink, "https://example.com/posts/hello-world-42.html");
        assert_eq!(post.published, "January 5, 2024");
        assert_eq!(post.thumbnail_url, config.placeholder_image);
        assert!(!post.has_image);
        assert_eq!(
            post.labels,
            vec![LabelToRender {
                name: "Rust Lang",
                slug: "rust-lang",
                url: "/labels/rust-lang-1.html".to_string(),
                post_count: 1,
            }]
        );
    }
}
