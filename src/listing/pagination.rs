//! Page-number pagination.
//!
//! Out-of-range page numbers are clamped instead of rejected: a missing or
//! unparsable page selects the first page, anything past the end selects the
//! last one. An empty result still has one (empty) page.

use crate::concert_store::Window;
use anyhow::Result;
use serde::Serialize;

/// A page number as requested by the client, before clamping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageRequest(Option<i64>);

impl PageRequest {
    pub fn first() -> Self {
        PageRequest(Some(1))
    }

    pub fn number(number: i64) -> Self {
        PageRequest(Some(number))
    }

    /// Parses a raw query parameter, treating garbage as "no page".
    pub fn parse(raw: Option<&str>) -> Self {
        PageRequest(raw.and_then(|s| s.trim().parse::<i64>().ok()))
    }

    /// Resolves to a valid 1-based page number given how many pages exist.
    pub fn resolve(&self, total_pages: usize) -> usize {
        match self.0 {
            None => 1,
            Some(n) if n < 1 => 1,
            Some(n) if n as u64 > total_pages as u64 => total_pages,
            Some(n) => n as usize,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Computes the window for `request`, fetches it and wraps the result.
    pub fn fetch<F>(total_items: usize, page_size: usize, request: PageRequest, fetch: F) -> Result<Self>
    where
        F: FnOnce(Window) -> Result<Vec<T>>,
    {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        let number = request.resolve(total_pages);

        let items = if total_items == 0 {
            Vec::new()
        } else {
            fetch(Window::new((number - 1) * page_size, page_size))?
        };

        Ok(Page {
            items,
            number,
            page_size,
            total_items,
            total_pages,
            has_previous: number > 1,
            has_next: number < total_pages,
        })
    }

    /// Converts every item, keeping the page metadata. Stops at the first error.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        })
    }
}

/// Page sizes per listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSizes {
    pub artists: usize,
    pub venues: usize,
    pub shows: usize,
    pub notes: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        PageSizes {
            artists: 10,
            venues: 4,
            shows: 10,
            notes: 5,
        }
    }
}
