//! Page slicing over a composed result list

use serde::Serialize;

/// One page of results. `page` is 1-indexed and already clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Number of pages for `len` items; never less than one
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slice `items` to the requested page, clamping `page` into `[1, total_pages]`.
/// A page size of zero is treated as one.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = page.clamp(1, total_pages);

    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());

    Page {
        items: &items[start..end],
        page,
        page_size,
        total_pages,
        total_items: items.len(),
    }
}

/// Current page position; resets to page 1 whenever the page size or the
/// search/filter inputs change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page: usize,
    page_size: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Call when the query, location or filters change
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Apply to a result list, storing the clamped page back
    pub fn apply<'a, T>(&mut self, items: &'a [T]) -> Page<'a, T> {
        let page = paginate(items, self.page_size, self.page);
        self.page = page.page;
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_of_twenty_five() {
        let items: Vec<u32> = (1..=25).collect();

        let first = paginate(&items, 10, 1);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());

        let third = paginate(&items, 10, 3);
        assert_eq!(third.items, &[21, 22, 23, 24, 25]);
        assert!(!third.has_next());
    }

    #[test]
    fn test_out_of_range_clamps() {
        let items: Vec<u32> = (1..=25).collect();

        let past_end = paginate(&items, 10, 4);
        assert_eq!(past_end.page, 3);
        assert_eq!(past_end.items.len(), 5);

        let zero = paginate(&items, 10, 0);
        assert_eq!(zero.page, 1);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 10, 5);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_state_resets_on_page_size_change() {
        let items: Vec<u32> = (1..=50).collect();
        let mut state = PageState::new(10);
        state.set_page(4);
        assert_eq!(state.apply(&items).items[0], 31);

        state.set_page_size(20);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_state_clamps_after_results_shrink() {
        let mut state = PageState::new(10);
        state.set_page(5);

        let fewer: Vec<u32> = (1..=12).collect();
        let page = state.apply(&fewer);
        assert_eq!(page.page, 2);
        assert_eq!(state.page(), 2);
    }
}
