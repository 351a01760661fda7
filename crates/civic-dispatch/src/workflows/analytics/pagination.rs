use serde::Serialize;

use super::filter::ReportFilter;

/// Fixed-size client-side pager that returns to page 1 whenever the filter changes.
#[derive(Debug, Clone)]
pub struct Paginator {
    page_size: usize,
    page: usize,
    filter: ReportFilter,
}

/// One page of items plus enough metadata to render page controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T> {
    pub number: usize,
    pub size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            filter: ReportFilter::default(),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filter(&self) -> &ReportFilter {
        &self.filter
    }

    /// Records the active filter; returns true when it changed and the page was reset.
    pub fn apply_filter(&mut self, filter: ReportFilter) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.page = 1;
        true
    }

    pub fn go_to(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size).max(1)
    }

    /// Slices the current page, clamping past-the-end requests to the last page.
    pub fn slice<T: Clone>(&self, items: &[T]) -> PageView<T> {
        let total_pages = self.total_pages(items.len());
        let number = self.page.min(total_pages);
        let start = (number - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        PageView {
            number,
            size: self.page_size,
            total_pages,
            total_items: items.len(),
            items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        }
    }
}
