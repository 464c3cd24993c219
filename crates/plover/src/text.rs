//! Text helpers used to derive slugs, thumbnails, and previews from post
//! titles and HTML content.
//!
//! None of these functions fail. Markup that can't be made sense of simply
//! produces less text (or no image) rather than an error.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// The marker appended to a preview when words were dropped.
pub const ELLIPSIS: &str = "...";

/// The slug used in place of an empty one when a slug names a file.
pub const FALLBACK_SLUG: &str = "untitled-post";

static UNSAFE_SLUG_CHARS_REGEX: OnceLock<Regex> = OnceLock::new();
static SLUG_SEPARATORS_REGEX: OnceLock<Regex> = OnceLock::new();
static NON_TEXT_BLOCKS_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static IMAGE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static IMAGE_SOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();

fn unsafe_slug_chars_regex() -> &'static Regex {
    UNSAFE_SLUG_CHARS_REGEX.get_or_init(|| {
        Regex::new(r"[^a-z0-9\s-]").expect("failed to compile regex for unsafe slug characters")
    })
}

fn slug_separators_regex() -> &'static Regex {
    SLUG_SEPARATORS_REGEX.get_or_init(|| {
        Regex::new(r"[\s_-]+").expect("failed to compile regex for slug separators")
    })
}

fn non_text_blocks_regex() -> &'static Regex {
    NON_TEXT_BLOCKS_REGEX.get_or_init(|| {
        let pattern = r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>";
        Regex::new(pattern).expect("failed to compile regex for non-text blocks")
    })
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("failed to compile regex for tags"))
}

fn image_tag_regex() -> &'static Regex {
    IMAGE_TAG_REGEX.get_or_init(|| {
        // Quoted attribute values may contain `>`.
        let pattern = r#"(?i)<(?:img|image)\b(?:"[^"]*"|'[^']*'|[^'">])*>"#;
        Regex::new(pattern).expect("failed to compile regex for image tags")
    })
}

fn image_source_regex() -> &'static Regex {
    IMAGE_SOURCE_REGEX.get_or_init(|| {
        let pattern = r#"(?i)\s(?:src|href|xlink:href)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#;
        Regex::new(pattern).expect("failed to compile regex for image sources")
    })
}

fn entity_regex() -> &'static Regex {
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([a-zA-Z][a-zA-Z0-9]{1,7}));")
            .expect("failed to compile regex for character references")
    })
}

/// Returns a lower-case, hyphen-separated slug for the given text.
///
/// Every character outside of `[a-z0-9]`, whitespace, and `-` is dropped, runs
/// of whitespace, underscores, and hyphens become a single hyphen, and
/// leading/trailing hyphens are trimmed.
///
/// The result may be empty (e.g., for a title made only of punctuation). Use
/// [`slugify_or_fallback`] when the slug names a file.
pub fn slugify(text: &str) -> String {
    let lowercase = text.to_lowercase();
    let stripped = unsafe_slug_chars_regex().replace_all(&lowercase, "");
    let hyphenated = slug_separators_regex().replace_all(&stripped, "-");

    hyphenated.trim_matches('-').to_string()
}

/// Returns [`slugify`] of the given text, or `fallback` if that is empty.
pub fn slugify_or_fallback(text: &str, fallback: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Removes all markup from the given HTML, leaving the concatenated text.
///
/// Comments, `<script>`, and `<style>` blocks are dropped along with their
/// contents. The common named entities are decoded.
pub fn strip_tags(html: &str) -> String {
    let without_blocks = non_text_blocks_regex().replace_all(html, "");
    let text = tag_regex().replace_all(&without_blocks, "");

    decode_entities(&text)
}

/// Returns the source of the first image in the given HTML, in document order.
///
/// Images without a usable `src` (or `href`, for SVG `<image>`) are skipped.
/// Returns `None` when no image is found.
pub fn extract_first_image(html: &str) -> Option<String> {
    image_tag_regex().find_iter(html).find_map(|tag| {
        let captures = image_source_regex().captures(tag.as_str())?;
        let source = captures
            .get(1)
            .or_else(|| captures.get(2))
            .or_else(|| captures.get(3))?
            .as_str()
            .trim();

        if source.is_empty() {
            None
        } else {
            Some(decode_entities(source))
        }
    })
}

/// Keeps the first `word_limit` whitespace-delimited words of `text`, joined by
/// single spaces. [`ELLIPSIS`] is appended when any words were dropped.
pub fn truncate_preview(text: &str, word_limit: usize) -> String {
    if word_limit == 0 {
        return String::new();
    }

    let mut words = text.split_whitespace();
    let mut preview = words.by_ref().take(word_limit).collect::<Vec<_>>().join(" ");

    if words.next().is_some() {
        preview.push_str(ELLIPSIS);
    }

    preview
}

/// Returns the word-truncated plain text of the given HTML.
pub fn preview_html(html: &str, word_limit: usize) -> String {
    truncate_preview(&strip_tags(html), word_limit)
}

/// Decodes numeric character references and the common named entities.
/// Anything else, including references to invalid code points, is left as-is.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    entity_regex()
        .replace_all(text, |captures: &Captures| {
            let decoded = if let Some(decimal) = captures.get(1) {
                decimal.as_str().parse().ok().and_then(char::from_u32)
            } else if let Some(hex) = captures.get(2) {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
            } else {
                captures.get(3).and_then(|name| named_entity(name.as_str()))
            };

            match decoded.filter(|ch| *ch != '\0') {
                Some(ch) => ch.to_string(),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "sbquo" => '‚',
        "ldquo" => '“',
        "rdquo" => '”',
        "bdquo" => '„',
        "laquo" => '«',
        "raquo" => '»',
        "bull" => '•',
        "middot" => '·',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "times" => '×',
        "divide" => '÷',
        "euro" => '€',
        "pound" => '£',
        "yen" => '¥',
        "cent" => '¢',
        "sect" => '§',
        "para" => '¶',
        "iexcl" => '¡',
        "iquest" => '¿',
        "Agrave" => 'À',
        "Aacute" => 'Á',
        "Acirc" => 'Â',
        "Atilde" => 'Ã',
        "Auml" => 'Ä',
        "Aring" => 'Å',
        "AElig" => 'Æ',
        "Ccedil" => 'Ç',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Ecirc" => 'Ê',
        "Euml" => 'Ë',
        "Igrave" => 'Ì',
        "Iacute" => 'Í',
        "Icirc" => 'Î',
        "Iuml" => 'Ï',
        "Ntilde" => 'Ñ',
        "Ograve" => 'Ò',
        "Oacute" => 'Ó',
        "Ocirc" => 'Ô',
        "Otilde" => 'Õ',
        "Ouml" => 'Ö',
        "Oslash" => 'Ø',
        "Ugrave" => 'Ù',
        "Uacute" => 'Ú',
        "Ucirc" => 'Û',
        "Uuml" => 'Ü',
        "Yacute" => 'Ý',
        "szlig" => 'ß',
        "agrave" => 'à',
        "aacute" => 'á',
        "acirc" => 'â',
        "atilde" => 'ã',
        "auml" => 'ä',
        "aring" => 'å',
        "aelig" => 'æ',
        "ccedil" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "igrave" => 'ì',
        "iacute" => 'í',
        "icirc" => 'î',
        "iuml" => 'ï',
        "ntilde" => 'ñ',
        "ograve" => 'ò',
        "oacute" => 'ó',
        "ocirc" => 'ô',
        "otilde" => 'õ',
        "ouml" => 'ö',
        "oslash" => 'ø',
        "ugrave" => 'ù',
        "uacute" => 'ú',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "yacute" => 'ý',
        "yuml" => 'ÿ',
        _ => return None,
    };

    Some(ch)
}
