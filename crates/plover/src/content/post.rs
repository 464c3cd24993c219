use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::text::{extract_first_image, preview_html, slugify, slugify_or_fallback, FALLBACK_SLUG};

/// A post as returned by the Blogger API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub published: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<FixedOffset>>,
    /// The post's permalink on Blogger itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Every other field of the API response (`kind`, `blog`, `images`,
    /// `replies`, ...), kept so the post can be written back out unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub display_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The image shown alongside a post in listings and link previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    /// The first image found in the post's content.
    Image(String),

    /// The post has no image; the configured placeholder is shown instead.
    Placeholder,
}

impl Thumbnail {
    /// Returns the thumbnail's URL, falling back to `placeholder`.
    pub fn url_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self {
            Self::Image(url) => url,
            Self::Placeholder => placeholder,
        }
    }
}

/// Options for deriving a [`Post`] from a [`PostMeta`].
#[derive(Debug, Clone, Copy)]
pub struct AnnotateOptions {
    /// The number of words kept in a post's preview.
    pub preview_words: usize,
}

/// A post along with the fields derived from it.
///
/// Built once per run by [`Post::from_meta`] and never mutated afterwards, so
/// it can be shared freely between label groups and pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub meta: PostMeta,

    /// The slug derived from the title. May be shared by posts with similar
    /// titles; see [`Post::file_stem`] for a unique name.
    pub slug: String,

    /// The unique name for the post's output file: `{slug}-{id}`.
    pub file_stem: String,

    pub thumbnail: Thumbnail,

    /// The first words of the post's text content.
    pub preview: String,

    /// The slug of each of the post's labels, in label order, without
    /// duplicates.
    pub label_slugs: Vec<String>,
}

impl Post {
    pub fn from_meta(meta: PostMeta, options: &AnnotateOptions) -> Self {
        let slug = slugify_or_fallback(&meta.title, FALLBACK_SLUG);
        let file_stem = format!("{slug}-{}", slugify_or_fallback(&meta.id, "post"));

        let thumbnail = extract_first_image(&meta.content)
            .map(Thumbnail::Image)
            .unwrap_or(Thumbnail::Placeholder);

        let preview = preview_html(&meta.content, options.preview_words);

        let mut label_slugs: Vec<String> = Vec::with_capacity(meta.labels.len());
        for label in &meta.labels {
            let label_slug = label_slug(label);
            if !label_slugs.contains(&label_slug) {
                label_slugs.push(label_slug);
            }
        }

        Self {
            meta,
            slug,
            file_stem,
            thumbnail,
            preview,
            label_slugs,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    /// Returns whether this post carries a label with the given slug.
    pub fn has_label(&self, label_slug: &str) -> bool {
        self.label_slugs.iter().any(|slug| slug == label_slug)
    }

    /// Returns the path of the post's page, relative to the site root.
    pub fn output_path(&self) -> String {
        format!("posts/{}.html", self.file_stem)
    }
}

/// Returns the grouping key for a label.
///
/// Labels made only of characters that don't survive slugification share the
/// `untitled-label` key.
pub fn label_slug(label: &str) -> String {
    let slug = slugify(label);
    if slug.is_empty() {
        "untitled-label".to_string()
    } else {
        slug
    }
}
