use tracing::warn;

/// Page index over `[0, content_pages + 1]`: 0 is the front cover and the
/// last index is the back cover.
///
/// Button requests move the index optimistically; flip events reported by
/// the widget always overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNavigator {
    current: usize,
    last: usize,
}

impl PageNavigator {
    pub fn new(content_pages: usize, start_page: usize) -> Self {
        let last = content_pages.saturating_add(1);
        Self {
            current: start_page.min(last),
            last,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn last_page(&self) -> usize {
        self.last
    }

    /// Total pages including both covers.
    pub fn page_count(&self) -> usize {
        self.last.saturating_add(1)
    }

    pub fn can_prev(&self) -> bool {
        self.current > 0
    }

    pub fn can_next(&self) -> bool {
        self.current < self.last
    }

    /// Advances one page; returns false at the back cover.
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Steps back one page; returns false at the front cover.
    pub fn prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Applies a page index reported by the flipbook and returns the value
    /// now held.
    pub fn on_flipped(&mut self, reported: usize) -> usize {
        if reported > self.last {
            warn!(
                reported,
                last = self.last,
                "flipbook reported a page past the back cover; clamping"
            );
        }
        self.current = reported.min(self.last);
        self.current
    }

    pub fn label(&self) -> String {
        format!(
            "Page {} of {}",
            self.current.saturating_add(1),
            self.page_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prev_at_front_cover_is_noop() {
        let mut nav = PageNavigator::new(3, 0);
        assert!(!nav.prev());
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn next_at_back_cover_is_noop() {
        let mut nav = PageNavigator::new(3, 4);
        assert!(!nav.next());
        assert_eq!(nav.current(), 4);
        assert!(!nav.can_next());
    }

    #[test]
    fn reported_page_overrides_button_expectation() {
        let mut nav = PageNavigator::new(3, 0);
        assert!(nav.next());
        assert!(nav.next());
        assert_eq!(nav.current(), 2);
        assert_eq!(nav.on_flipped(1), 1);
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn label_counts_covers() {
        let nav = PageNavigator::new(3, 0);
        assert_eq!(nav.label(), "Page 1 of 5");
    }

    #[test]
    fn huge_page_count_does_not_overflow() {
        let mut nav = PageNavigator::new(usize::MAX, usize::MAX);
        assert_eq!(nav.current(), usize::MAX);
        assert!(!nav.next());
        assert_eq!(nav.page_count(), usize::MAX);
        assert!(!nav.label().is_empty());
    }

    #[test]
    fn start_page_is_clamped() {
        let nav = PageNavigator::new(2, 99);
        assert_eq!(nav.current(), 3);
    }
}
