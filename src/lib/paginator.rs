//! Splits an in-memory list into fixed-size pages and tracks a cursor.

/// Number of items shown on a single page.
pub const PAGE_SIZE: usize = 10;

/// A list of items split into pages of [PAGE_SIZE], with a 1-indexed cursor.
///
/// Navigation is not clamped. Callers are expected to disable the controls
/// that would move the cursor out of range (see [crate::lib::scroller]).
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    /// The items to page through, already sorted by the caller.
    content: Vec<T>,
    /// `ceil(content.len() / PAGE_SIZE)`
    total_page_count: usize,
    /// The page currently shown, starting at 1.
    current_page: usize,
}

impl<T> Paginator<T> {
    /// Construct a [Paginator] positioned on the first page.
    pub fn new(content: Vec<T>) -> Self {
        let total_page_count = content.len().div_ceil(PAGE_SIZE);
        Self {
            content,
            total_page_count,
            current_page: 1,
        }
    }

    /// Number of pages, `0` for empty content.
    pub fn total_page_count(&self) -> usize {
        self.total_page_count
    }

    /// The 1-indexed cursor.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Is there anything to show at all?
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the items of page `page`, or `None` if it is out of range.
    pub fn get_page(&self, page: usize) -> Option<&[T]> {
        if page < 1 || page > self.total_page_count {
            return None;
        }

        let start = (page - 1) * PAGE_SIZE;
        let end = (page * PAGE_SIZE).min(self.content.len());
        Some(&self.content[start..end])
    }

    /// Returns the page under the cursor.
    pub fn get_current_page(&self) -> Option<&[T]> {
        self.get_page(self.current_page)
    }

    /// Advance the cursor and return the new page.
    pub fn next_page(&mut self) -> Option<&[T]> {
        self.current_page += 1;
        self.get_current_page()
    }

    /// Move the cursor back and return the new page.
    pub fn previous_page(&mut self) -> Option<&[T]> {
        // A cursor of 0 is already out of range; don't wrap around.
        self.current_page = self.current_page.saturating_sub(1);
        self.get_current_page()
    }

    /// Jump to page 1.
    pub fn first_page(&mut self) -> Option<&[T]> {
        self.current_page = 1;
        self.get_current_page()
    }

    /// Jump to the last page.
    ///
    /// The cursor never drops below 1, even for empty content.
    pub fn last_page(&mut self) -> Option<&[T]> {
        self.current_page = self.total_page_count.max(1);
        self.get_current_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(len: usize) -> Paginator<usize> {
        Paginator::new((1..=len).collect())
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(numbers(0).total_page_count(), 0);
        assert_eq!(numbers(1).total_page_count(), 1);
        assert_eq!(numbers(10).total_page_count(), 1);
        assert_eq!(numbers(11).total_page_count(), 2);
        assert_eq!(numbers(23).total_page_count(), 3);
        assert_eq!(numbers(100).total_page_count(), 10);
    }

    #[test]
    fn pages_slice_content_in_order() {
        for len in [1, 9, 10, 11, 25, 40] {
            let paginator = numbers(len);
            let mut seen = Vec::new();
            for page in 1..=paginator.total_page_count() {
                let items = paginator.get_page(page).unwrap();
                assert_eq!(items.first(), Some(&((page - 1) * PAGE_SIZE + 1)));
                assert!(items.len() <= PAGE_SIZE);
                seen.extend_from_slice(items);
            }
            assert_eq!(seen, (1..=len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn out_of_range_pages_are_none() {
        let paginator = numbers(23);
        assert_eq!(paginator.get_page(0), None);
        assert_eq!(paginator.get_page(4), None);
        assert_eq!(numbers(0).get_page(1), None);
        assert_eq!(numbers(0).get_current_page(), None);
    }

    #[test]
    fn twenty_three_items() {
        let mut paginator = numbers(23);
        assert_eq!(paginator.total_page_count(), 3);
        assert_eq!(paginator.current_page(), 1);

        let second = paginator.next_page().unwrap().to_vec();
        assert_eq!(second, (11..=20).collect::<Vec<_>>());
        assert_eq!(paginator.current_page(), 2);

        let last = paginator.last_page().unwrap().to_vec();
        assert_eq!(last, vec![21, 22, 23]);
        assert_eq!(paginator.current_page(), 3);
    }

    #[test]
    fn boundary_jumps_are_idempotent() {
        let mut paginator = numbers(35);
        let original = paginator.get_page(1).unwrap().to_vec();

        paginator.first_page();
        paginator.last_page();
        let back = paginator.first_page().unwrap().to_vec();

        assert_eq!(back, original);
        assert_eq!(paginator.current_page(), 1);
    }

    #[test]
    fn next_then_previous_returns_to_interior_page() {
        let mut paginator = numbers(50);
        paginator.next_page();
        paginator.next_page();
        let before = paginator.current_page();
        let content = paginator.get_current_page().unwrap().to_vec();

        paginator.next_page();
        let after = paginator.previous_page().unwrap().to_vec();

        assert_eq!(paginator.current_page(), before);
        assert_eq!(after, content);
    }

    #[test]
    fn navigation_is_not_clamped() {
        let mut paginator = numbers(5);
        assert_eq!(paginator.next_page(), None);
        assert_eq!(paginator.current_page(), 2);
        assert_eq!(paginator.first_page().map(<[usize]>::len), Some(5));
        assert_eq!(paginator.previous_page(), None);
        assert_eq!(paginator.current_page(), 0);
    }

    #[test]
    fn last_page_on_empty_content_keeps_cursor_at_one() {
        let mut paginator = numbers(0);
        assert!(paginator.is_empty());
        assert_eq!(paginator.last_page(), None);
        assert_eq!(paginator.current_page(), 1);
    }
}
