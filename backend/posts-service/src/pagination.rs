//! Fixed-size page slicing for feeds.
//!
//! Page `n` (1-based) holds items `[(n - 1) * per_page, n * per_page)` of the
//! ordering. A page parameter that is numeric but out of range resolves to the
//! last page; anything else that is not the `last` sentinel is rejected.

use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use thiserror::Error;

/// Posts shown on every feed page.
pub const POSTS_PER_PAGE: usize = 10;

const LAST_PAGE_SENTINEL: &str = "last";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Page number '{0}' is not an integer")]
    NotAnInteger(String),
}

/// `?page=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn raw(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// An empty sequence still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `page` parameter into a valid 1-based page number.
    pub fn resolve(&self, raw: Option<&str>) -> Result<usize, PageError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(1),
            Some(raw) => raw,
        };

        if raw == LAST_PAGE_SENTINEL {
            return Ok(self.num_pages());
        }

        let number = match raw.parse::<i64>() {
            Ok(number) => number,
            // Still an integer, just wider than i64: out of range either way.
            Err(e)
                if matches!(
                    e.kind(),
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                ) =>
            {
                return Ok(self.num_pages());
            }
            Err(_) => return Err(PageError::NotAnInteger(raw.to_string())),
        };

        if number < 1 || number as u64 > self.num_pages() as u64 {
            return Ok(self.num_pages());
        }

        Ok(number as usize)
    }

    /// `(offset, limit)` of the given page within the full ordering.
    pub fn bounds(&self, number: usize) -> (usize, usize) {
        let offset = (number.max(1) - 1) * self.per_page;
        let limit = self.per_page.min(self.count.saturating_sub(offset));
        (offset, limit)
    }
}

/// One page of an ordered result set plus its position metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub is_first: bool,
    pub is_last: bool,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, number: usize, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        Self {
            object_list,
            number,
            num_pages,
            count: paginator.count(),
            has_next: number < num_pages,
            has_previous: number > 1,
            is_first: number == 1,
            is_last: number == num_pages,
        }
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next.then_some(self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous.then_some(self.number - 1)
    }
}

/// Slice an already-materialized ordering into the requested page.
pub fn paginate<T>(items: Vec<T>, raw: Option<&str>) -> Result<Page<T>, PageError> {
    let paginator = Paginator::new(items.len(), POSTS_PER_PAGE);
    let number = paginator.resolve(raw)?;
    let (offset, limit) = paginator.bounds(number);
    let object_list = items.into_iter().skip(offset).take(limit).collect();
    Ok(Page::new(object_list, number, &paginator))
}
