mod theme;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use plover::{fetch_all_posts, write_cache, BloggerClient, Site, SiteConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "plover",
    version,
    about = "Builds a static site from a Blogger blog"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the posts and render the site.
    Build {
        #[command(flatten)]
        common: CommonArgs,

        /// Render from the posts cached by the last build instead of fetching.
        #[arg(long)]
        offline: bool,

        /// The directory to write the site to.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Fetch the posts and write them out as JSON.
    Fetch {
        #[command(flatten)]
        common: CommonArgs,

        /// The file to write the posts to.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// The config file. Defaults to `plover.toml`, if it exists.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[arg(long, env = "BLOG_ID")]
    blog_id: Option<String>,

    #[arg(long, env = "BLOGGER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl CommonArgs {
    /// Loads the config, with flags taking precedence over the environment and
    /// the config file.
    fn load_config(&self) -> Result<SiteConfig> {
        let mut config = SiteConfig::load(self.config.as_deref()).context("failed to load config")?;

        if let Some(blog_id) = self.blog_id.clone().filter(|value| !value.is_empty()) {
            config.blogger.blog_id = Some(blog_id);
        }

        if let Some(api_key) = self.api_key.clone().filter(|value| !value.is_empty()) {
            config.blogger.api_key = Some(api_key);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            common,
            offline,
            output,
        } => build(common, offline, output),
        Command::Fetch { common, output } => fetch(common, output),
    }
}

fn build(common: CommonArgs, offline: bool, output: Option<PathBuf>) -> Result<()> {
    let mut config = common.load_config()?;
    if let Some(output) = output {
        config.output_dir = output;
    }

    let client = if offline {
        None
    } else {
        Some(BloggerClient::new(&config.blogger_config()?)?)
    };

    let cache_path = config.cache_path();
    let output_dir = config.output_dir.clone();

    let mut site = Site::builder()
        .config(config)
        .templates(theme::index, theme::label, theme::post)
        .build();

    site.load_partials()?;

    match client {
        Some(client) => site.load(&client)?,
        None => site
            .load_cache(&cache_path)
            .context("failed to read cached posts; run a build without --offline first")?,
    }

    site.render()
        .with_context(|| format!("failed to render site to '{}'", output_dir.display()))?;

    info!(output = %output_dir.display(), "done");

    Ok(())
}

fn fetch(common: CommonArgs, output: Option<PathBuf>) -> Result<()> {
    let config = common.load_config()?;
    let client = BloggerClient::new(&config.blogger_config()?)?;

    let posts = fetch_all_posts(&client)?;

    let path = output.unwrap_or_else(|| config.cache_path());
    write_cache(&path, &posts.iter().collect::<Vec<_>>())?;

    info!(path = %path.display(), posts = posts.len(), "wrote posts");

    Ok(())
}
