//! Page window arithmetic for listings.

/// Position within a paged listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current: u32,
    total: u32,
}

impl Pagination {
    /// `current` is clamped into `1..=total`; a total of zero counts as one page.
    #[must_use]
    pub fn new(current: u32, total: u32) -> Self {
        let total = total.max(1);
        Self {
            current: current.clamp(1, total),
            total,
        }
    }

    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Every page number, for the page links.
    #[must_use]
    pub fn pages(&self) -> Vec<u32> {
        (1..=self.total).collect()
    }

    #[must_use]
    pub const fn previous(&self) -> Option<u32> {
        if self.current > 1 {
            Some(self.current - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.current < self.total {
            Some(self.current + 1)
        } else {
            None
        }
    }

    /// Single-page listings render no controls.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.total > 1
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_current() {
        assert_eq!(Pagination::new(0, 5).current(), 1);
        assert_eq!(Pagination::new(9, 5).current(), 5);
        assert_eq!(Pagination::new(3, 0).total(), 1);
    }

    #[test]
    fn test_neighbours() {
        let first = Pagination::new(1, 3);
        assert_eq!(first.previous(), None);
        assert_eq!(first.next(), Some(2));

        let last = Pagination::new(3, 3);
        assert_eq!(last.previous(), Some(2));
        assert_eq!(last.next(), None);
        assert_eq!(last.pages(), vec![1, 2, 3]);
    }

    #[test]
    fn test_single_page_is_hidden() {
        assert!(!Pagination::default().is_visible());
        assert!(Pagination::new(1, 2).is_visible());
    }
}
