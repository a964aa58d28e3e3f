use std::cell::RefCell;
use std::slice;

const FIRST_PAGE: usize = 512;

/// Bump allocator for the scratch windows of adaptive Bezier
/// subdivision.
///
/// Allocations are only reclaimed in bulk via [`Arena::reset`], which the
/// slider expander calls between sliders. Pages grow geometrically; the
/// first page is allocated once and kept across resets.
pub(crate) struct Arena<T> {
    pages: RefCell<Vec<Vec<T>>>,
}

impl<T: Clone + Default> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            pages: RefCell::new(vec![Vec::with_capacity(FIRST_PAGE)]),
        }
    }

    /// Hand out a zero-initialized slice of length `n`.
    pub(crate) fn take(&self, n: usize) -> &mut [T] {
        let mut pages = self.pages.borrow_mut();

        let exhausted = pages
            .last()
            .map_or(true, |page| page.capacity() - page.len() < n);

        if exhausted {
            let capacity = pages
                .last()
                .map_or(FIRST_PAGE, |page| (2 * page.capacity()).max(n));

            pages.push(Vec::with_capacity(capacity));
        }

        let page = pages.last_mut().expect("at least one page");
        let start = page.len();
        page.resize(start + n, T::default());

        let ptr = page[start..].as_mut_ptr();

        // SAFETY: the slice points into a page whose capacity is never
        // exceeded, so `resize` cannot move its buffer, and pages are
        // neither dropped nor shrunk while only shared references to the
        // arena exist. Consecutive `take` calls bump past each other, so
        // the handed-out slices are disjoint.
        unsafe { slice::from_raw_parts_mut(ptr, n) }
    }

    /// Drop all pages but the first and mark everything as free again.
    ///
    /// Requires exclusive access, so no slice from [`Arena::take`] can
    /// outlive it.
    pub(crate) fn reset(&mut self) {
        let pages = self.pages.get_mut();
        pages.truncate(1);

        if let Some(first) = pages.first_mut() {
            first.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_slices() {
        let arena = Arena::<u32>::new();

        let a = arena.take(4);
        let b = arena.take(4);

        a.fill(1);
        b.fill(2);

        assert_eq!(a, [1; 4]);
        assert_eq!(b, [2; 4]);
    }

    #[test]
    fn grows_past_first_page() {
        let mut arena = Arena::<u8>::new();

        let big = arena.take(FIRST_PAGE + 1);
        assert_eq!(big.len(), FIRST_PAGE + 1);

        arena.reset();
        let again = arena.take(8);
        assert_eq!(again.len(), 8);
    }
}
