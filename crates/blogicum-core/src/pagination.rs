//! Page-number pagination over listings.

/// Posts per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Parse a raw `?page=` value. Anything that is not a positive integer
    /// falls back to the first page.
    pub fn from_param(raw: Option<&str>, per_page: u64) -> Self {
        let page = raw
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        Self::new(page, per_page)
    }

    /// Number of pages for `total_items`. An empty listing still has one page.
    pub fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.per_page).max(1)
    }

    /// The page actually served: requests past the end get the last page.
    pub fn clamp(&self, total_items: u64) -> u64 {
        self.page.min(self.total_pages(total_items))
    }

    /// Row offset of the served page.
    pub fn offset(&self, total_items: u64) -> u64 {
        (self.clamp(total_items) - 1) * self.per_page
    }
}

/// One page of results plus page metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Build the page served for `request` out of an already sliced `items`.
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            number: request.clamp(total_items),
            per_page: request.per_page,
            total_items,
            total_pages: request.total_pages(total_items),
        }
    }

    /// Slice an in-memory, already ordered result set.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let offset = request.offset(total) as usize;
        let items = all
            .into_iter()
            .skip(offset)
            .take(request.per_page as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
