use tracing::{debug, info};

use crate::events::CatalogEvent;
use crate::layout::{BookDimensions, ChromeConfig, ChromeLayout, ViewportSize, compute_book_dimensions};
use crate::navigation::PageNavigator;
use crate::progress::{LoadProgress, ProgressUpdate};

/// Work the presentation layer must carry out after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Relayout(BookDimensions),
    ProgressChanged(ProgressUpdate),
    /// Leave the loading screen; emitted once.
    ShowBook { start_page: usize },
    FlipNext,
    FlipPrev,
    PageChanged(usize),
}

/// All mutable catalog state, owned by the viewer's event loop.
#[derive(Debug, Clone)]
pub struct CatalogState {
    chrome: ChromeConfig,
    aspect_ratio: f32,
    viewport: ViewportSize,
    progress: LoadProgress,
    navigator: PageNavigator,
    book_shown: bool,
}

impl CatalogState {
    pub fn new(
        content_pages: usize,
        start_page: usize,
        chrome: ChromeConfig,
        aspect_ratio: f32,
        viewport: ViewportSize,
    ) -> Self {
        Self {
            chrome,
            aspect_ratio,
            viewport,
            progress: LoadProgress::new(content_pages),
            navigator: PageNavigator::new(content_pages, start_page),
            book_shown: false,
        }
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn progress(&self) -> &LoadProgress {
        &self.progress
    }

    pub fn navigator(&self) -> &PageNavigator {
        &self.navigator
    }

    pub fn book_shown(&self) -> bool {
        self.book_shown
    }

    pub fn book_dimensions(&self) -> BookDimensions {
        compute_book_dimensions(self.viewport, &self.chrome, self.aspect_ratio)
    }

    pub fn chrome_layout(&self) -> ChromeLayout {
        ChromeLayout::compute(self.viewport, &self.chrome, self.book_dimensions())
    }

    pub fn update(&mut self, event: CatalogEvent) -> Vec<Effect> {
        match event {
            CatalogEvent::Resized(viewport) => {
                self.viewport = viewport;
                let dims = self.book_dimensions();
                debug!(
                    viewport_width = viewport.width,
                    viewport_height = viewport.height,
                    book_width = dims.width,
                    book_height = dims.height,
                    "catalog relayout"
                );
                vec![Effect::Relayout(dims)]
            }
            CatalogEvent::Progress(update) => {
                let applied = self.progress.advance_to(update.completed);
                vec![Effect::ProgressChanged(applied)]
            }
            CatalogEvent::PreloadReady => {
                if self.book_shown {
                    return Vec::new();
                }
                self.progress.advance_to(self.progress.total());
                self.book_shown = true;
                info!(
                    pages = self.navigator.page_count(),
                    start_page = self.navigator.current(),
                    "catalog ready"
                );
                vec![Effect::ShowBook {
                    start_page: self.navigator.current(),
                }]
            }
            CatalogEvent::NextRequested => {
                if self.book_shown && self.navigator.next() {
                    vec![Effect::FlipNext]
                } else {
                    Vec::new()
                }
            }
            CatalogEvent::PrevRequested => {
                if self.book_shown && self.navigator.prev() {
                    vec![Effect::FlipPrev]
                } else {
                    Vec::new()
                }
            }
            CatalogEvent::PageFlipped(page) => {
                let applied = self.navigator.on_flipped(page);
                vec![Effect::PageChanged(applied)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pages: usize) -> CatalogState {
        CatalogState::new(
            pages,
            0,
            ChromeConfig::default(),
            8.5 / 11.0,
            ViewportSize::new(1000.0, 800.0),
        )
    }

    fn update(completed: usize, total: usize) -> ProgressUpdate {
        ProgressUpdate {
            completed,
            total,
            became_ready: completed == total,
        }
    }

    #[test]
    fn navigation_is_ignored_while_loading() {
        let mut st = state(3);
        assert!(st.update(CatalogEvent::NextRequested).is_empty());
        assert_eq!(st.navigator().current(), 0);
    }

    #[test]
    fn show_book_is_emitted_once() {
        let mut st = state(2);
        st.update(CatalogEvent::Progress(update(1, 2)));
        st.update(CatalogEvent::Progress(update(2, 2)));
        let first = st.update(CatalogEvent::PreloadReady);
        assert_eq!(first, vec![Effect::ShowBook { start_page: 0 }]);
        assert!(st.update(CatalogEvent::PreloadReady).is_empty());
        assert!(st.progress().is_ready());
    }

    #[test]
    fn stale_progress_does_not_rewind() {
        let mut st = state(3);
        st.update(CatalogEvent::Progress(update(2, 3)));
        let effects = st.update(CatalogEvent::Progress(update(1, 3)));
        assert_eq!(
            effects,
            vec![Effect::ProgressChanged(ProgressUpdate {
                completed: 2,
                total: 3,
                became_ready: false,
            })]
        );
    }

    #[test]
    fn buttons_request_flips_and_widget_has_final_say() {
        let mut st = state(3);
        st.update(CatalogEvent::PreloadReady);
        assert_eq!(st.update(CatalogEvent::NextRequested), vec![Effect::FlipNext]);
        assert_eq!(st.update(CatalogEvent::NextRequested), vec![Effect::FlipNext]);
        assert_eq!(
            st.update(CatalogEvent::PageFlipped(1)),
            vec![Effect::PageChanged(1)]
        );
        assert_eq!(st.navigator().current(), 1);
        assert_eq!(st.update(CatalogEvent::PrevRequested), vec![Effect::FlipPrev]);
        assert!(st.update(CatalogEvent::PrevRequested).is_empty());
    }

    #[test]
    fn resize_recomputes_dimensions() {
        let mut st = state(1);
        let effects = st.update(CatalogEvent::Resized(ViewportSize::new(500.0, 800.0)));
        let Effect::Relayout(dims) = &effects[0] else {
            panic!("expected relayout, got {effects:?}");
        };
        assert!((dims.width - 460.0).abs() < 1e-3);
        assert!((dims.height - 460.0 * 8.5 / 11.0).abs() < 1e-3);
    }
}
