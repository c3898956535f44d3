use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use egui::{Color32, Rect, Ui};

use crate::api::{format_clock_time, Activity, ActivitySource, FamilyMember};
use crate::config::{ClockFormat, Config};
use crate::layout::{self, Minutes, PixelScale, HEADER_HEIGHT};
use super::theme::{block_colors, grid_colors, member_color};

/// Result from schedule view interactions
#[derive(Default)]
pub struct ScheduleResult {
    pub edit_activity: Option<Activity>,
    pub add_at: Option<(NaiveDate, String)>,  // (date, start_time "HH:MM")
}

/// Activities of the visible week
#[derive(Debug, Clone)]
pub struct WeekData {
    pub week_start: NaiveDate,
    pub activities: Vec<Activity>,
}

impl WeekData {
    pub fn new(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            activities: Vec::new(),
        }
    }

    /// Activities on `date`, optionally narrowed to one member (shared ones included)
    pub fn activities_for_day(&self, date: NaiveDate, member: Option<&str>) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| a.date == date)
            .filter(|a| member.map_or(true, |m| a.belongs_to(m)))
            .collect()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.week_start && date < self.week_start + Duration::days(7)
    }

    /// Merge a created or updated activity. One dated outside this week is
    /// dropped from it.
    pub fn apply_saved(&mut self, activity: Activity) {
        if !self.contains_date(activity.date) {
            self.remove(&activity.id);
            return;
        }
        match self.activities.iter_mut().find(|a| a.id == activity.id) {
            Some(existing) => *existing = activity,
            None => self.activities.push(activity),
        }
    }

    pub fn remove(&mut self, activity_id: &str) {
        self.activities.retain(|a| a.id != activity_id);
    }

    /// Day dates (Mon-Sun)
    pub fn all_days(&self) -> Vec<NaiveDate> {
        (0..7).map(|i| self.week_start + Duration::days(i)).collect()
    }

    /// Weekends are shown when today is a weekend day or the week has weekend activities
    pub fn should_show_weekends(&self, today: NaiveDate) -> bool {
        let is_weekend = |d: NaiveDate| matches!(d.weekday(), Weekday::Sat | Weekday::Sun);
        is_weekend(today) || self.activities.iter().any(|a| is_weekend(a.date))
    }

    pub fn visible_days(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let show_weekends = self.should_show_weekends(today);
        self.all_days()
            .into_iter()
            .filter(|day| show_weekends || !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }
}

/// Desktop week view: the whole family, one column per day
pub fn render_week_view(
    ui: &mut Ui,
    week_data: &WeekData,
    members: &[FamilyMember],
    config: &Config,
) -> ScheduleResult {
    render_schedule_grid(ui, week_data, members, config, None)
}

/// One member's week; shared activities are included
pub fn render_person_week_view(
    ui: &mut Ui,
    week_data: &WeekData,
    members: &[FamilyMember],
    config: &Config,
    member_id: &str,
) -> ScheduleResult {
    render_schedule_grid(ui, week_data, members, config, Some(member_id))
}

fn render_schedule_grid(
    ui: &mut Ui,
    week_data: &WeekData,
    members: &[FamilyMember],
    config: &Config,
    member_filter: Option<&str>,
) -> ScheduleResult {
    let mut result = ScheduleResult::default();
    let today = Local::now().date_naive();
    let days = week_data.visible_days(today);

    let start_hour = config.schedule_start_hour;
    let end_hour = config.schedule_end_hour.max(start_hour + 1);
    let num_hours = (end_hour - start_hour) as usize;

    let hour_label_width = 60.0;
    let (grid_line_color, hour_line_color, quarter_color) = grid_colors();

    let available_width = ui.available_width();
    let pixels_per_hour = layout::pixels_per_hour(ui.available_height(), start_hour, end_hour);
    let scale = PixelScale::new(start_hour, pixels_per_hour);
    let total_grid_height = num_hours as f32 * pixels_per_hour;
    let day_width = (available_width - hour_label_width) / days.len().max(1) as f32;

    // Fixed day headers (outside ScrollArea)
    let (header_rect, _) = ui.allocate_exact_size(
        egui::vec2(available_width, HEADER_HEIGHT),
        egui::Sense::hover(),
    );
    let painter = ui.painter();

    for (i, day) in days.iter().enumerate() {
        let x = header_rect.min.x + hour_label_width + i as f32 * day_width;
        let is_today = *day == today;
        let day_name = if is_today {
            "Today".to_string()
        } else {
            day.format("%a").to_string()
        };
        let name_color = if is_today { Color32::WHITE } else { Color32::from_rgb(0xb0, 0xb0, 0xa8) };

        painter.text(
            egui::pos2(x + 8.0, header_rect.center().y - 9.0),
            egui::Align2::LEFT_CENTER,
            day_name,
            egui::FontId::proportional(14.0),
            name_color,
        );
        painter.text(
            egui::pos2(x + 8.0, header_rect.center().y + 11.0),
            egui::Align2::LEFT_CENTER,
            day.format("%b %-d").to_string(),
            egui::FontId::proportional(12.0),
            Color32::from_rgb(0x70, 0x70, 0x68),
        );

        if i > 0 {
            painter.line_segment(
                [
                    egui::pos2(x, header_rect.min.y + 8.0),
                    egui::pos2(x, header_rect.max.y - 8.0),
                ],
                egui::Stroke::new(1.0, grid_line_color),
            );
        }
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        let (grid_rect, grid_response) = ui.allocate_exact_size(
            egui::vec2(available_width, total_grid_height),
            egui::Sense::click(),
        );
        let painter = ui.painter();

        for (i, day) in days.iter().enumerate() {
            let x = grid_rect.min.x + hour_label_width + i as f32 * day_width;
            if *day == today {
                let col_rect = Rect::from_min_size(
                    egui::pos2(x, grid_rect.min.y),
                    egui::vec2(day_width, total_grid_height),
                );
                painter.rect_filled(col_rect, 0.0, Color32::from_rgb(0x11, 0x11, 0x10));
            }
            painter.line_segment(
                [egui::pos2(x, grid_rect.min.y), egui::pos2(x, grid_rect.max.y)],
                egui::Stroke::new(1.0, grid_line_color),
            );
        }
        painter.line_segment(
            [
                egui::pos2(grid_rect.max.x, grid_rect.min.y),
                egui::pos2(grid_rect.max.x, grid_rect.max.y),
            ],
            egui::Stroke::new(1.0, grid_line_color),
        );

        for hour_idx in 0..=num_hours {
            let hour = start_hour as usize + hour_idx;
            let y = grid_rect.min.y + hour_idx as f32 * pixels_per_hour;

            if hour_idx < num_hours {
                painter.text(
                    egui::pos2(grid_rect.min.x + hour_label_width - 8.0, y),
                    egui::Align2::RIGHT_TOP,
                    format_clock_time(&format!("{:02}:00", hour), config.clock_format),
                    egui::FontId::proportional(11.0),
                    Color32::from_rgb(0x70, 0x70, 0x68),
                );

                // Quarter lines only when there is room for them
                if pixels_per_hour >= 40.0 {
                    for quarter in 1..4 {
                        let quarter_y = y + quarter as f32 * pixels_per_hour / 4.0;
                        painter.line_segment(
                            [
                                egui::pos2(grid_rect.min.x + hour_label_width, quarter_y),
                                egui::pos2(grid_rect.max.x, quarter_y),
                            ],
                            egui::Stroke::new(1.0, quarter_color),
                        );
                    }
                }
            }

            painter.line_segment(
                [
                    egui::pos2(grid_rect.min.x + hour_label_width, y),
                    egui::pos2(grid_rect.max.x, y),
                ],
                egui::Stroke::new(1.0, if hour_idx == 0 { hour_line_color } else { grid_line_color }),
            );
        }

        let mut hit_rects: Vec<(Rect, &Activity)> = Vec::new();

        for (i, day) in days.iter().enumerate() {
            let column_rect = Rect::from_min_size(
                egui::pos2(grid_rect.min.x + hour_label_width + i as f32 * day_width, grid_rect.min.y),
                egui::vec2(day_width, total_grid_height),
            );
            let day_activities = week_data.activities_for_day(*day, member_filter);
            hit_rects.extend(render_day_column(
                ui,
                column_rect,
                &day_activities,
                scale,
                members,
                config,
            ));
        }

        if grid_response.clicked() {
            if let Some(pos) = grid_response.interact_pointer_pos() {
                // Last drawn block is on top
                if let Some((_, activity)) = hit_rects.iter().rev().find(|(rect, _)| rect.contains(pos)) {
                    result.edit_activity = Some((*activity).clone());
                } else if pos.x > grid_rect.min.x + hour_label_width {
                    let day_idx = ((pos.x - grid_rect.min.x - hour_label_width) / day_width) as usize;
                    if let Some(day) = days.get(day_idx) {
                        let relative_y = (pos.y - grid_rect.min.y).max(0.0);
                        let minutes = start_hour as i32 * 60 + (relative_y / pixels_per_hour * 60.0) as i32;
                        let snapped = (minutes / 15) * 15; // Round down to the quarter hour
                        result.add_at = Some((*day, Minutes(snapped).to_string()));
                    }
                }
            }
        }

        if grid_response.hovered() {
            let over_block = ui
                .ctx()
                .pointer_hover_pos()
                .is_some_and(|pos| hit_rects.iter().any(|(rect, _)| rect.contains(pos)));
            if over_block {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
        }
    });

    result
}

/// Paint one day column and return the block rect of every drawn activity.
///
/// Positions come straight from the layout engine; blocks outside the
/// visible hours are clipped by the column, not moved.
pub fn render_day_column<'a>(
    ui: &Ui,
    column_rect: Rect,
    activities: &[&'a Activity],
    scale: PixelScale,
    members: &[FamilyMember],
    config: &Config,
) -> Vec<(Rect, &'a Activity)> {
    let painter = ui.painter().with_clip_rect(column_rect.intersect(ui.clip_rect()));
    let mut drawn = Vec::new();

    for placement in layout::layout_day_column(activities, scale) {
        if !placement.is_renderable() {
            continue;
        }
        let activity = activities[placement.index];
        let (left, width) = placement.lane.horizontal_span();

        let block_rect = Rect::from_min_size(
            egui::pos2(
                column_rect.min.x + left * column_rect.width(),
                column_rect.min.y + placement.top,
            ),
            // 2px gap between stacked blocks
            egui::vec2(width * column_rect.width(), (placement.height - 2.0).max(1.0)),
        );

        let member_index = activity
            .member_id
            .as_deref()
            .and_then(|id| members.iter().position(|m| m.id == id));
        let accent = member_color(config, activity.member_id.as_deref(), member_index);

        paint_activity_block(&painter, block_rect, activity, accent, config.clock_format);
        drawn.push((block_rect, activity));
    }

    drawn
}

fn paint_activity_block(
    painter: &egui::Painter,
    rect: Rect,
    activity: &Activity,
    accent_color: Color32,
    clock_format: ClockFormat,
) {
    let (block_bg, text_color, secondary_color) = block_colors();
    let corner_radius = 4.0;

    painter.rect(rect, corner_radius, block_bg, egui::Stroke::new(1.0, accent_color));

    // Left accent stripe
    let accent_width = 3.0;
    painter.rect(
        Rect::from_min_size(rect.min, egui::vec2(accent_width, rect.height())),
        egui::Rounding {
            nw: corner_radius,
            sw: corner_radius,
            ne: 0.0,
            se: 0.0,
        },
        accent_color,
        egui::Stroke::NONE,
    );

    if rect.height() < 14.0 || rect.width() < 24.0 {
        return;
    }

    let text_left = rect.min.x + accent_width + 4.0;
    let text_width = (rect.max.x - text_left - 4.0).max(0.0);
    let mut y = rect.min.y + 3.0;

    let mut title = activity.title.clone();
    if activity.source == ActivitySource::Spond {
        title = format!("{} {}", egui_phosphor::regular::SOCCER_BALL, title);
    }
    let title_galley = painter.layout(title, egui::FontId::proportional(13.0), text_color, text_width);
    let title_height = title_galley.size().y.min(rect.height() - 6.0);
    painter.galley(egui::pos2(text_left, y), title_galley, text_color);
    y += title_height + 2.0;

    if rect.max.y - y >= 14.0 {
        let time_range = format!(
            "{} - {}",
            format_clock_time(&activity.start_time, clock_format),
            format_clock_time(&activity.end_time, clock_format)
        );
        painter.text(
            egui::pos2(text_left, y),
            egui::Align2::LEFT_TOP,
            time_range,
            egui::FontId::proportional(11.0),
            secondary_color,
        );
        y += 14.0;
    }

    if let Some(location) = activity.location.as_deref().filter(|l| !l.is_empty()) {
        if rect.max.y - y >= 14.0 {
            painter.text(
                egui::pos2(text_left, y),
                egui::Align2::LEFT_TOP,
                format!("{} {}", egui_phosphor::regular::MAP_PIN, location),
                egui::FontId::proportional(11.0),
                secondary_color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, member: Option<&str>, date: NaiveDate) -> Activity {
        Activity {
            id: id.to_string(),
            member_id: member.map(String::from),
            title: id.to_string(),
            date,
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            location: None,
            description: None,
            source: ActivitySource::Manual,
            url: None,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()
    }

    #[test]
    fn person_filter_keeps_shared_activities() {
        let mut week = WeekData::new(monday());
        week.activities = vec![
            activity("a", Some("anna"), monday()),
            activity("b", Some("ben"), monday()),
            activity("s", None, monday()),
            activity("t", Some("anna"), monday() + Duration::days(1)),
        ];

        let ids = |v: Vec<&Activity>| v.into_iter().map(|a| a.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(week.activities_for_day(monday(), None)), vec!["a", "b", "s"]);
        assert_eq!(ids(week.activities_for_day(monday(), Some("anna"))), vec!["a", "s"]);
    }

    #[test]
    fn saved_activities_only_land_in_their_week() {
        let mut week = WeekData::new(monday());
        week.apply_saved(activity("a", Some("anna"), monday()));
        week.apply_saved(activity("next", Some("anna"), monday() + Duration::days(7)));
        assert_eq!(week.activities.len(), 1);

        // Edit moves "a" into the following week
        week.apply_saved(activity("a", Some("anna"), monday() + Duration::days(8)));
        assert!(week.activities.is_empty());

        let mut edited = activity("b", None, monday() + Duration::days(6));
        week.apply_saved(edited.clone());
        edited.title = "renamed".to_string();
        week.apply_saved(edited);
        assert_eq!(week.activities.len(), 1);
        assert_eq!(week.activities[0].title, "renamed");

        week.remove("b");
        assert!(week.activities.is_empty());
    }

    #[test]
    fn weekends_hidden_unless_needed() {
        let wednesday = monday() + Duration::days(2);
        let mut week = WeekData::new(monday());
        assert_eq!(week.visible_days(wednesday).len(), 5);

        week.activities.push(activity("match", Some("ben"), monday() + Duration::days(5)));
        assert_eq!(week.visible_days(wednesday).len(), 7);

        let empty = WeekData::new(monday());
        assert_eq!(empty.visible_days(monday() + Duration::days(6)).len(), 7);
    }
}
