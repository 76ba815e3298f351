use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use crate::manifest::{AssetManifest, PAGE_NUMBER_PLACEHOLDER};

pub use book_model::{
    BookConfig, ChromeConfig, CoverConfig, LoadingScreenConfig, ScreenColorsConfig, SizeMode,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub title: String,
    pub subtitle: String,
    /// Directory the image pattern is resolved against.
    pub image_root: PathBuf,
    /// Relative path with a `{n}` placeholder for the 1-based page number.
    pub image_pattern: String,
    /// Number of image pages between the two covers.
    pub page_count: usize,
    pub front_cover: CoverConfig,
    pub back_cover: CoverConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            title: "Design Catalog".into(),
            subtitle: "Spring/Summer 2025".into(),
            image_root: PathBuf::from("public"),
            image_pattern: "images/test{n}.png".into(),
            page_count: 3,
            front_cover: CoverConfig::default(),
            back_cover: CoverConfig::default(),
        }
    }
}

impl CatalogConfig {
    const BACK_COVER_TITLE: &'static str = "Thank You";
    const BACK_COVER_MESSAGE: &'static str = "We look forward to your feedback";

    /// Title and subtitle printed on the front cover.
    pub fn front_cover_text(&self) -> (Cow<'_, str>, Cow<'_, str>) {
        (
            self.front_cover.title_or(&self.title),
            self.front_cover.subtitle_or(&self.subtitle),
        )
    }

    /// Title and message printed on the back cover.
    pub fn back_cover_text(&self) -> (Cow<'_, str>, Cow<'_, str>) {
        (
            self.back_cover.title_or(Self::BACK_COVER_TITLE),
            self.back_cover.subtitle_or(Self::BACK_COVER_MESSAGE),
        )
    }

    pub fn manifest(&self) -> Result<AssetManifest> {
        AssetManifest::from_pattern(&self.image_root, &self.image_pattern, self.page_count)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Longest edge, in pixels, a decoded page image is allowed to keep.
    pub max_dimension: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: Option<String>,
    /// Initial inner size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: 1280,
            height: 900,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    pub catalog: CatalogConfig,
    pub chrome: ChromeConfig,
    pub book: BookConfig,
    pub loader: LoaderConfig,
    pub loading_screen: LoadingScreenConfig,
    pub window: WindowConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&s)
    }

    /// Parses YAML; an empty document yields the defaults.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.catalog.image_pattern.contains(PAGE_NUMBER_PLACEHOLDER),
            "catalog.image-pattern must contain {}",
            PAGE_NUMBER_PLACEHOLDER
        );
        ensure!(
            !self.catalog.title.trim().is_empty(),
            "catalog.title must not be blank"
        );
        self.catalog
            .front_cover
            .validate("catalog.front-cover")
            .context("invalid front cover")?;
        self.catalog
            .back_cover
            .validate("catalog.back-cover")
            .context("invalid back cover")?;
        self.chrome.validate().context("invalid chrome allowances")?;
        self.book.validate().context("invalid book options")?;
        // Covers add two pages to the image count.
        let last_page = self
            .catalog
            .page_count
            .checked_add(2)
            .map(|total| total - 1);
        let Some(last_page) = last_page else {
            bail!(
                "catalog.page-count {} is too large",
                self.catalog.page_count
            );
        };
        ensure!(
            self.book.start_page <= last_page,
            "book.start-page {} is past the back cover (last page is {})",
            self.book.start_page,
            last_page
        );
        ensure!(
            self.loader.max_dimension > 0,
            "loader.max-dimension must be greater than zero"
        );
        self.loading_screen
            .validate()
            .context("invalid loading screen")?;
        ensure!(
            self.window.width > 0 && self.window.height > 0,
            "window.width and window.height must be greater than zero"
        );
        Ok(self)
    }

    pub fn window_title(&self) -> &str {
        self.window
            .title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.catalog.title)
    }
}
