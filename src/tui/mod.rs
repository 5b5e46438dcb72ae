//! TUI module for terminal user interfaces

mod session_app;

pub use session_app::SessionApp;
