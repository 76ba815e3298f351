pub mod chrome;
pub mod config;
pub mod covers;
pub mod error;
pub mod events;
pub mod flipbook;
pub mod layout;
pub mod manifest;
pub mod navigation;
pub mod progress;
pub mod state;
pub mod tasks {
    pub mod preloader;
    pub mod viewer;
}
