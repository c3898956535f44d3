use super::time::Minutes;

/// Smallest vertical scale a day column is drawn at
pub const MIN_PIXELS_PER_HOUR: f32 = 20.0;
/// Height reserved above the grid for the day headers
pub const HEADER_HEIGHT: f32 = 60.0;

/// Vertical scale of a day column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pub day_start_hour: u8,
    pub pixels_per_hour: f32,
}

impl PixelScale {
    pub fn new(day_start_hour: u8, pixels_per_hour: f32) -> Self {
        Self {
            day_start_hour,
            pixels_per_hour,
        }
    }

    /// Offset from the top of the grid. Negative before the visible window.
    pub fn top(&self, start: Minutes) -> f32 {
        let from_day_start = start.0 as i64 - Minutes::from_hour(self.day_start_hour).0 as i64;
        (from_day_start as f32 / 60.0) * self.pixels_per_hour
    }

    pub fn height(&self, start: Minutes, end: Minutes) -> f32 {
        let duration = end.0 as i64 - start.0 as i64;
        (duration as f32 / 60.0) * self.pixels_per_hour
    }
}

/// Scale that fits `start_hour..end_hour` into `available_height`
pub fn pixels_per_hour(available_height: f32, start_hour: u8, end_hour: u8) -> f32 {
    let visible_hours = end_hour as f32 - start_hour as f32;
    if visible_hours <= 0.0 {
        return MIN_PIXELS_PER_HOUR;
    }
    ((available_height - HEADER_HEIGHT) / visible_hours).max(MIN_PIXELS_PER_HOUR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_relative_to_day_start() {
        let scale = PixelScale::new(8, 54.0);
        assert_eq!(scale.top(Minutes(540)), 54.0);
        assert_eq!(scale.height(Minutes(540), Minutes(630)), 81.0);
    }

    #[test]
    fn no_clamping_outside_window() {
        let scale = PixelScale::new(8, 60.0);
        assert_eq!(scale.top(Minutes(420)), -60.0);
        assert_eq!(scale.top(Minutes(21 * 60)), 780.0);
    }

    #[test]
    fn extreme_minutes_do_not_overflow() {
        let scale = PixelScale::new(8, 60.0);
        assert!(scale.top(Minutes(i32::MIN)).is_finite());
        assert!(scale.top(Minutes(i32::MIN)) < 0.0);
        assert!(scale.height(Minutes(i32::MIN), Minutes(i32::MAX)) > 0.0);
        assert!(scale.height(Minutes(i32::MAX), Minutes(i32::MIN)) < 0.0);
    }

    #[test]
    fn scale_fills_available_height() {
        // 12 visible hours, 60px header
        assert_eq!(pixels_per_hour(708.0, 8, 20), 54.0);
    }

    #[test]
    fn scale_is_floored() {
        assert_eq!(pixels_per_hour(200.0, 0, 24), MIN_PIXELS_PER_HOUR);
        assert_eq!(pixels_per_hour(900.0, 10, 10), MIN_PIXELS_PER_HOUR);
    }
}
