use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Snippets of raw HTML spliced into every page.
///
/// They are read once, before rendering, and handed to each template through
/// its render context.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partials {
    /// Extra markup for `<head>` (e.g., analytics, fonts, styles).
    pub head: String,
    /// Scripts appended to `<head>`, after [`Partials::head`].
    pub js: String,
    pub header: String,
    pub sidebar: String,
    pub footer: String,
}

impl Partials {
    /// Loads `custom_head.html`, `custom_js.html`, `custom_header.html`,
    /// `custom_sidebar.html`, and `custom_footer.html` from `dir`. Missing files
    /// are left empty.
    pub fn load(dir: &Path) -> io::Result<Self> {
        Ok(Self {
            head: load_partial(dir, "custom_head.html")?,
            js: load_partial(dir, "custom_js.html")?,
            header: load_partial(dir, "custom_header.html")?,
            sidebar: load_partial(dir, "custom_sidebar.html")?,
            footer: load_partial(dir, "custom_footer.html")?,
        })
    }
}

fn load_partial(dir: &Path, filename: &str) -> io::Result<String> {
    let path = dir.join(filename);

    match fs::read_to_string(&path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "partial not found, leaving it empty");
            Ok(String::new())
        }
        Err(err) => Err(err),
    }
}
