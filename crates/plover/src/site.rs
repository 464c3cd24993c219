use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fmt, fs, io};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::{build_label_index, related_posts, PostMeta, Posts};
use crate::fetch::{fetch_all_posts, read_cache, FetchError, PostSource};
use crate::html::HtmlElement;
use crate::paginate::{paginate, slice_page, PaginationError};
use crate::partials::Partials;
use crate::render::{
    index_page_path, label_page_path, BaseRenderContext, LabelToRender, Links, PaginationToRender,
    PostToRender, RenderIndexContext, RenderLabelContext, RenderPostContext,
};
use crate::storage::{DiskStorage, Store};

pub type RenderIndex = Arc<dyn Fn(&RenderIndexContext) -> HtmlElement + Send + Sync>;

pub type RenderLabel = Arc<dyn Fn(&RenderLabelContext) -> HtmlElement + Send + Sync>;

pub type RenderPost = Arc<dyn Fn(&RenderPostContext) -> HtmlElement + Send + Sync>;

struct Templates {
    pub index: RenderIndex,
    pub label: RenderLabel,
    pub post: RenderPost,
}

#[derive(Error, Debug)]
pub enum LoadSiteError {
    #[error("failed to fetch posts: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to load cached posts: {0}")]
    Cache(#[source] FetchError),

    #[error("failed to load partials from '{path}': {source}")]
    Partials { path: PathBuf, source: io::Error },
}

#[derive(Error, Debug)]
pub enum RenderSiteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to walk assets directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("render error: {0}")]
    Render(#[from] fmt::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("pagination error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("failed to serialize posts: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

/// A blog: its configuration, templates, and posts.
pub struct Site {
    config: SiteConfig,
    partials: Partials,
    templates: Templates,
    posts: Posts,
    posts_from_cache: bool,
}

impl Site {
    pub fn builder() -> SiteBuilder<()> {
        SiteBuilder::new()
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn posts(&self) -> &Posts {
        &self.posts
    }

    /// Fetches every post from `source`.
    pub fn load(&mut self, source: &impl PostSource) -> Result<(), LoadSiteError> {
        let metas = fetch_all_posts(source)?;
        self.load_posts(metas);

        Ok(())
    }

    /// Loads the posts from a JSON dump written by an earlier build.
    pub fn load_cache(&mut self, path: &Path) -> Result<(), LoadSiteError> {
        let metas = read_cache(path).map_err(LoadSiteError::Cache)?;
        self.load_posts(metas);
        self.posts_from_cache = true;

        Ok(())
    }

    pub fn load_posts(&mut self, metas: Vec<PostMeta>) {
        self.posts = Posts::from_metas(metas, &self.config.annotate_options());
        self.posts_from_cache = false;
    }

    /// Reads the `custom_*.html` partials from the configured directory.
    pub fn load_partials(&mut self) -> Result<(), LoadSiteError> {
        let path = &self.config.partials_dir;
        self.partials = Partials::load(path).map_err(|source| LoadSiteError::Partials {
            path: path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Renders the site into the configured output directory.
    pub fn render(&self) -> Result<(), RenderSiteError> {
        self.render_to(&DiskStorage::new(self.config.output_dir.clone()))
    }

    pub fn render_to(&self, storage: &impl Store) -> Result<(), RenderSiteError> {
        let config = &self.config;
        let posts = self.posts.as_slice();

        info!(posts = posts.len(), "rendering site");

        storage
            .clear()
            .map_err(|err| RenderSiteError::Storage(err.to_string()))?;

        let store = |path: &str, contents: &[u8]| {
            storage
                .store(path, contents)
                .map_err(|err| RenderSiteError::Storage(err.to_string()))
        };

        // The cache lives in the output directory, which was just cleared, so
        // posts read from it are always written back.
        if config.write_cache || self.posts_from_cache {
            let json = serde_json::to_string_pretty(&self.posts.metas())?;
            store("data/posts.json", json.as_bytes())?;
        }

        let links = Links::new(&config.base_url);
        let label_index = build_label_index(posts);
        let all_labels = LabelToRender::all(&label_index, &links);

        let base = || BaseRenderContext {
            config,
            partials: &self.partials,
            links: &links,
            labels: &all_labels,
        };

        let mut page_count = 0;

        // An empty blog still gets a (blank) home page.
        let total_pages = paginate(posts.len(), config.posts_per_page)?.max(1);
        for page_number in 1..=total_pages {
            let output_path = index_page_path(page_number);

            let ctx = RenderIndexContext {
                base: base(),
                permalink: links.permalink(&output_path)?,
                posts: slice_page(posts, page_number, config.posts_per_page)
                    .iter()
                    .map(|post| PostToRender::from_post(post, config, &label_index, &links))
                    .collect::<Result<_, _>>()?,
                pagination: PaginationToRender::new(page_number, total_pages, |n| {
                    links.path(&index_page_path(n))
                })?,
            };

            let rendered = (self.templates.index)(&ctx).render_document()?;
            store(&output_path, rendered.as_bytes())?;
            page_count += 1;
        }

        for (label_slug, group) in label_index.iter() {
            let total_pages = paginate(group.posts.len(), config.posts_per_page)?;

            for page_number in 1..=total_pages {
                let output_path = label_page_path(label_slug, page_number);

                let ctx = RenderLabelContext {
                    base: base(),
                    permalink: links.permalink(&output_path)?,
                    label: LabelToRender::from_group(label_slug, group, &links),
                    posts: slice_page(&group.posts, page_number, config.posts_per_page)
                        .iter()
                        .map(|post| PostToRender::from_post(post, config, &label_index, &links))
                        .collect::<Result<_, _>>()?,
                    pagination: PaginationToRender::new(page_number, total_pages, |n| {
                        links.path(&label_page_path(label_slug, n))
                    })?,
                };

                let rendered = (self.templates.label)(&ctx).render_document()?;
                store(&output_path, rendered.as_bytes())?;
                page_count += 1;
            }
        }

        for post in posts {
            let ctx = RenderPostContext {
                base: base(),
                post: PostToRender::from_post(post, config, &label_index, &links)?,
                related: related_posts(post, posts, config.related_posts)
                    .into_iter()
                    .map(|related| PostToRender::from_post(related, config, &label_index, &links))
                    .collect::<Result<_, _>>()?,
            };

            let rendered = (self.templates.post)(&ctx).render_document()?;
            store(&post.output_path(), rendered.as_bytes())?;
            page_count += 1;
        }

        let asset_count = self.copy_assets(storage)?;

        info!(
            pages = page_count,
            labels = label_index.len(),
            assets = asset_count,
            "rendered site"
        );

        Ok(())
    }

    /// Copies the assets directory into `assets/` of the output.
    fn copy_assets(&self, storage: &impl Store) -> Result<usize, RenderSiteError> {
        let assets_dir = &self.config.assets_dir;
        if !assets_dir.is_dir() {
            warn!(path = %assets_dir.display(), "assets directory not found, skipping");
            return Ok(0);
        }

        let mut count = 0;

        for entry in WalkDir::new(assets_dir).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative_path) = entry.path().strip_prefix(assets_dir) else {
                continue;
            };

            let relative_path = relative_path
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let contents = fs::read(entry.path())?;
            storage
                .store(&format!("assets/{relative_path}"), &contents)
                .map_err(|err| RenderSiteError::Storage(err.to_string()))?;

            debug!(path = %relative_path, "copied asset");
            count += 1;
        }

        Ok(count)
    }
}

pub struct SiteBuilder<T> {
    state: T,
}

impl SiteBuilder<()> {
    pub fn new() -> Self {
        Self { state: () }
    }

    pub fn config(self, config: SiteConfig) -> SiteBuilder<WithConfig> {
        SiteBuilder {
            state: WithConfig { config },
        }
    }
}

impl Default for SiteBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WithConfig {
    config: SiteConfig,
}

impl SiteBuilder<WithConfig> {
    pub fn templates(
        self,
        index: impl Fn(&RenderIndexContext) -> HtmlElement + Send + Sync + 'static,
        label: impl Fn(&RenderLabelContext) -> HtmlElement + Send + Sync + 'static,
        post: impl Fn(&RenderPostContext) -> HtmlElement + Send + Sync + 'static,
    ) -> SiteBuilder<WithTemplates> {
        SiteBuilder {
            state: WithTemplates {
                with_config: self.state,
                templates: Templates {
                    index: Arc::new(index),
                    label: Arc::new(label),
                    post: Arc::new(post),
                },
                partials: Partials::default(),
            },
        }
    }
}

pub struct WithTemplates {
    with_config: WithConfig,
    templates: Templates,
    partials: Partials,
}

impl SiteBuilder<WithTemplates> {
    pub fn partials(mut self, partials: Partials) -> Self {
        self.state.partials = partials;
        self
    }

    pub fn build(self) -> Site {
        Site {
            config: self.state.with_config.config,
            partials: self.state.partials,
            templates: self.state.templates,
            posts: Posts::default(),
            posts_from_cache: false,
        }
    }
}
