pub mod api;
pub mod config;
pub mod layout;
pub mod logging;
pub mod sync;
pub mod ui;
