use super::pokemon::parse_leading_int;

/// Fixed number of records per page.
pub const PAGE_SIZE: u64 = 20;

/// The `skip`/`limit` slice of records served for one page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub skip: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn new(page: u64) -> Self {
        let page = page.max(1);
        Self {
            page,
            skip: (page - 1).saturating_mul(PAGE_SIZE),
            limit: PAGE_SIZE,
        }
    }

    /// Absent, unparsable and non-positive values all mean page 1.
    pub fn from_query(raw: Option<&str>) -> Self {
        let page = raw
            .and_then(parse_leading_int)
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        Self::new(page as u64)
    }

    pub fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.limit)
    }
}
