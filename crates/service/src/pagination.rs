//! Page selection for the admin listings.

/// Largest page the admin console may request.
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Requested page of a listing. `page` counts from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Zero-based page index and page size as sea-orm's paginator takes them.
    /// Page 0 reads as the first page; the size is kept within `1..=MAX_PER_PAGE`.
    pub fn normalize(self) -> (u64, u64) {
        let index = self.page.saturating_sub(1);
        let size = self.per_page.clamp(1, MAX_PER_PAGE);
        (u64::from(index), u64::from(size))
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: DEFAULT_PER_PAGE } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_accepts_zero_or_one() {
        assert_eq!(Pagination { page: 0, per_page: 10 }.normalize(), (0, 10));
        assert_eq!(Pagination { page: 1, per_page: 10 }.normalize(), (0, 10));
    }

    #[test]
    fn oversized_or_empty_pages_are_clamped() {
        assert_eq!(Pagination { page: 3, per_page: 5000 }.normalize(), (2, u64::from(MAX_PER_PAGE)));
        assert_eq!(Pagination { page: 2, per_page: 0 }.normalize(), (1, 1));
    }

    #[test]
    fn default_is_first_page_of_twenty() {
        assert_eq!(Pagination::default(), Pagination { page: 1, per_page: DEFAULT_PER_PAGE });
    }
}
