mod types;
mod client;
mod time;

pub use types::*;
pub use client::{image_mime_type, ApiError, HomeDashClient};
pub use time::{format_clock_time, parse_start_time, week_start};
