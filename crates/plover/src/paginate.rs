//! Splitting ordered sequences into fixed-size pages, and the navigation links
//! between those pages.

use thiserror::Error;

/// When there are at most this many pages, every page gets a link.
const MAX_UNCOMPACTED_PAGES: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaginationError {
    #[error("invalid page size: {page_size} (must be at least 1)")]
    InvalidConfiguration { page_size: usize },

    #[error("page {current} is out of range (1..={total})")]
    PageOutOfRange { current: usize, total: usize },
}

/// Returns the number of pages needed to hold `item_count` items, `page_size`
/// at a time.
pub fn paginate(item_count: usize, page_size: usize) -> Result<usize, PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::InvalidConfiguration { page_size });
    }

    Ok(item_count.div_ceil(page_size))
}

/// Returns the items on the given (1-based) page.
///
/// Pages outside of `1..=total_pages` are empty.
pub fn slice_page<T>(items: &[T], page_number: usize, page_size: usize) -> &[T] {
    if page_number == 0 {
        return &[];
    }

    let start = (page_number - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }

    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// A single entry in a page navigation bar.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PaginationLink {
    Page { number: usize, is_current: bool },
    Ellipsis,
}

impl PaginationLink {
    fn page(number: usize, current: usize) -> Self {
        Self::Page {
            number,
            is_current: number == current,
        }
    }

    /// Returns the page number, unless this is an ellipsis.
    pub fn page_number(&self) -> Option<usize> {
        match self {
            Self::Page { number, .. } => Some(*number),
            Self::Ellipsis => None,
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Self::Page { is_current: true, .. })
    }

    pub fn is_ellipsis(&self) -> bool {
        matches!(self, Self::Ellipsis)
    }
}

/// Returns the navigation links for page `current` out of `total`.
///
/// Up to ten pages are all listed. Past that the bar is compacted to the first
/// three pages, the current page, and the last two pages, with an ellipsis
/// standing in for each skipped run:
///
/// ```text
/// 1 2 3 … 10 … 19 20
/// ```
///
/// The window is asymmetric: the current page is only listed when it falls in
/// `4..=total - 3`, the leading ellipsis appears once `current > 5`, and the
/// trailing one while `current < total - 4`.
pub fn pagination_links(
    current: usize,
    total: usize,
) -> Result<Vec<PaginationLink>, PaginationError> {
    if current == 0 || current > total {
        return Err(PaginationError::PageOutOfRange { current, total });
    }

    if total <= MAX_UNCOMPACTED_PAGES {
        return Ok((1..=total)
            .map(|number| PaginationLink::page(number, current))
            .collect());
    }

    let mut links = (1..=3)
        .map(|number| PaginationLink::page(number, current))
        .collect::<Vec<_>>();

    if current > 5 {
        links.push(PaginationLink::Ellipsis);
    }

    if (4..=total - 3).contains(&current) {
        links.push(PaginationLink::page(current, current));
    }

    if current < total - 4 {
        links.push(PaginationLink::Ellipsis);
    }

    links.extend(
        [total - 1, total]
            .into_iter()
            .filter(|number| *number > 3)
            .map(|number| PaginationLink::page(number, current)),
    );

    Ok(links)
}
