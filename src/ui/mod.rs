mod app;
mod theme;
pub mod views;

pub use app::HomeDashApp;
