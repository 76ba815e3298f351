use std::borrow::Cow;
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

pub use book::{BookConfig, ChromeConfig, SizeMode};
pub use screen::{CoverConfig, LoadingScreenConfig, ScreenColorsConfig};

mod screen {
    use super::*;

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct ScreenColorsConfig {
        pub background: Option<String>,
        pub font: Option<String>,
        pub accent: Option<String>,
        pub track: Option<String>,
        pub button: Option<String>,
        pub button_disabled: Option<String>,
    }

    impl ScreenColorsConfig {
        pub fn validate(&self, prefix: &str) -> Result<()> {
            for (field, value) in [
                ("background", &self.background),
                ("font", &self.font),
                ("accent", &self.accent),
                ("track", &self.track),
                ("button", &self.button),
                ("button-disabled", &self.button_disabled),
            ] {
                if let Some(color) = value {
                    ensure!(
                        !color.trim().is_empty(),
                        "{}.colors.{} must not be blank when provided",
                        prefix,
                        field
                    );
                }
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct LoadingScreenConfig {
        pub message: Option<String>,
        pub font: Option<String>,
        pub corner_radius: Option<f32>,
        #[serde(default)]
        pub colors: ScreenColorsConfig,
    }

    impl LoadingScreenConfig {
        const DEFAULT_CORNER_RADIUS_DIP: f32 = 8.0;

        pub fn message_or_default(&self) -> Cow<'_, str> {
            match &self.message {
                Some(msg) if !msg.trim().is_empty() => Cow::Borrowed(msg.as_str()),
                _ => Cow::Borrowed("Loading catalog..."),
            }
        }

        pub fn effective_corner_radius_dip(&self) -> f32 {
            self.corner_radius
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or(Self::DEFAULT_CORNER_RADIUS_DIP)
        }

        pub fn validate(&self) -> Result<()> {
            if let Some(radius) = self.corner_radius {
                ensure!(
                    radius.is_finite() && radius >= 0.0,
                    "loading-screen.corner-radius must be non-negative"
                );
            }
            if let Some(font_name) = &self.font {
                ensure!(
                    !font_name.trim().is_empty(),
                    "loading-screen.font must not be blank when provided"
                );
            }
            self.colors.validate("loading-screen")
        }
    }

    /// Text printed on a cover page. Missing fields fall back to the
    /// catalog-wide defaults supplied by the caller.
    #[derive(Debug, Clone, Deserialize, Default, PartialEq)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct CoverConfig {
        pub title: Option<String>,
        pub subtitle: Option<String>,
    }

    impl CoverConfig {
        pub fn title_or<'a>(&'a self, fallback: &'a str) -> Cow<'a, str> {
            non_blank(self.title.as_deref()).unwrap_or(Cow::Borrowed(fallback))
        }

        pub fn subtitle_or<'a>(&'a self, fallback: &'a str) -> Cow<'a, str> {
            non_blank(self.subtitle.as_deref()).unwrap_or(Cow::Borrowed(fallback))
        }

        pub fn validate(&self, prefix: &str) -> Result<()> {
            if let Some(title) = &self.title {
                ensure!(
                    !title.trim().is_empty(),
                    "{}.title must not be blank when provided",
                    prefix
                );
            }
            Ok(())
        }
    }

    fn non_blank(value: Option<&str>) -> Option<Cow<'_, str>> {
        value
            .filter(|text| !text.trim().is_empty())
            .map(Cow::Borrowed)
    }
}

mod book {
    use super::*;

    /// Space reserved around the book, in logical pixels.
    #[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct ChromeConfig {
        pub header_height: f32,
        pub buttons_height: f32,
        pub padding: f32,
        pub horizontal_margin: f32,
    }

    impl Default for ChromeConfig {
        fn default() -> Self {
            Self {
                header_height: 80.0,
                buttons_height: 60.0,
                padding: 30.0,
                horizontal_margin: 40.0,
            }
        }
    }

    impl ChromeConfig {
        pub fn validate(&self) -> Result<()> {
            for (field, value) in [
                ("header-height", self.header_height),
                ("buttons-height", self.buttons_height),
                ("padding", self.padding),
                ("horizontal-margin", self.horizontal_margin),
            ] {
                ensure!(
                    value.is_finite() && value >= 0.0,
                    "chrome.{} must be a non-negative number",
                    field
                );
            }
            Ok(())
        }
    }

    /// How the flipbook sizes its pages relative to the container it is given.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
    #[serde(rename_all = "kebab-case")]
    pub enum SizeMode {
        /// Use the computed page size verbatim.
        Fixed,
        /// Fill the container, clamped into the min/max tolerance band.
        #[default]
        Stretch,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct BookConfig {
        /// Page height-to-width ratio; the page is laid out as width = height / ratio.
        pub aspect_ratio: f32,
        pub size_mode: SizeMode,
        /// Fraction of the computed size the widget may shrink or grow by.
        pub size_tolerance: f32,
        pub max_shadow_opacity: f32,
        pub start_page: usize,
        #[serde(with = "humantime_serde")]
        pub flip_duration: Duration,
        /// Horizontal pointer travel, in logical pixels, that counts as a swipe.
        pub swipe_threshold: f32,
    }

    impl Default for BookConfig {
        fn default() -> Self {
            Self {
                aspect_ratio: 8.5 / 11.0,
                size_mode: SizeMode::Stretch,
                size_tolerance: 0.2,
                max_shadow_opacity: 0.5,
                start_page: 0,
                flip_duration: Duration::from_millis(700),
                swipe_threshold: 40.0,
            }
        }
    }

    impl BookConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0,
                "book.aspect-ratio must be positive"
            );
            ensure!(
                self.size_tolerance.is_finite() && (0.0..1.0).contains(&self.size_tolerance),
                "book.size-tolerance must be within [0, 1)"
            );
            ensure!(
                self.max_shadow_opacity.is_finite()
                    && (0.0..=1.0).contains(&self.max_shadow_opacity),
                "book.max-shadow-opacity must be within [0, 1]"
            );
            ensure!(
                !self.flip_duration.is_zero(),
                "book.flip-duration must be greater than zero"
            );
            ensure!(
                self.swipe_threshold.is_finite() && self.swipe_threshold >= 0.0,
                "book.swipe-threshold must be non-negative"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_defaults_match_letter_landscape() {
        let book: BookConfig = serde_yaml::from_str("{}").expect("empty book block");
        assert!((book.aspect_ratio - 8.5 / 11.0).abs() < f32::EPSILON);
        assert_eq!(book.size_mode, SizeMode::Stretch);
        assert_eq!(book.flip_duration, Duration::from_millis(700));
        book.validate().expect("defaults are valid");
    }

    #[test]
    fn parses_humantime_flip_duration() {
        let book: BookConfig = serde_yaml::from_str(
            r#"
flip-duration: 1s 250ms
size-mode: fixed
"#,
        )
        .expect("valid book yaml");
        assert_eq!(book.flip_duration, Duration::from_millis(1250));
        assert_eq!(book.size_mode, SizeMode::Fixed);
    }

    #[test]
    fn rejects_out_of_range_shadow() {
        let book: BookConfig =
            serde_yaml::from_str("max-shadow-opacity: 1.5").expect("valid yaml");
        let err = book.validate().unwrap_err();
        assert!(err.to_string().contains("max-shadow-opacity"));
    }

    #[test]
    fn rejects_negative_chrome() {
        let chrome: ChromeConfig = serde_yaml::from_str("padding: -4").expect("valid yaml");
        assert!(chrome.validate().is_err());
    }

    #[test]
    fn chrome_rejects_unknown_fields() {
        let parsed: Result<ChromeConfig, _> = serde_yaml::from_str("footer-height: 10");
        assert!(parsed.is_err());
    }

    #[test]
    fn blank_loading_message_falls_back() {
        let screen = LoadingScreenConfig {
            message: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(screen.message_or_default(), "Loading catalog...");
    }

    #[test]
    fn cover_fallbacks_apply_to_missing_fields() {
        let cover: CoverConfig = serde_yaml::from_str("title: Lookbook").expect("valid yaml");
        assert_eq!(cover.title_or("Design Catalog"), "Lookbook");
        assert_eq!(cover.subtitle_or("Spring/Summer 2025"), "Spring/Summer 2025");
    }
}
