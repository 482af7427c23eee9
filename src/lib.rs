// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod autoplay;
pub mod clock;
pub mod config;
pub mod game;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod ui;
