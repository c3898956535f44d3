use chrono::{Duration, Local, NaiveDate, Utc};
use eframe::egui;
use egui::{Color32, RichText};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::api::{
    image_mime_type, parse_start_time, week_start, Activity, ActivitySource, ApiError,
    FamilyMember, HomeDashClient, NewActivity,
};
use crate::config::{ClockFormat, Config, ViewMode};
use crate::layout::parse_time_to_minutes;
use crate::sync::{reconcile_members, ReconcileOutcome};
use super::theme::{self, member_color, to_hex_color};
use super::views::{self, WeekData};

pub struct HomeDashApp {
    config: Config,
    state: AppState,

    // Data
    week_data: WeekData,
    members: Vec<FamilyMember>,

    // Activity dialog
    show_dialog: bool,
    dialog: ActivityForm,
    pending_delete: Option<Activity>,

    // Settings dialog
    show_settings: bool,
    settings_base_url: String,
    settings_token: String,
    settings_clock_format: ClockFormat,
    settings_start_hour: u8,
    settings_end_hour: u8,
    settings_stale_minutes: i64,
    settings_colors: Vec<(String, Color32)>,  // (member id, color)

    // School plan import dialog
    show_import: bool,
    import_path: String,
    import_member: Option<String>,

    // Status
    status_message: Option<(String, bool)>, // (message, is_error)
    // A save, delete or import is running
    saving: bool,
    week_loads: WeekLoads,
    is_offline: bool,
    // Check Spond freshness once the week in flight has loaded
    reconcile_after_load: bool,

    // Async communication
    runtime: tokio::runtime::Runtime,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AppState {
    Setup,
    Main,
}

enum AsyncResult {
    WeekLoaded(NaiveDate, Vec<FamilyMember>, Vec<Activity>),
    WeekLoadFailed(NaiveDate, Option<String>),  // (week, error; None when offline)
    ActivitySaved(Activity),
    ActivityDeleted(String),
    SpondReconciled(Vec<ReconcileOutcome>),
    SchoolPlanImported(usize),
    Error(String),
    Offline,
}

/// Tracks the single week fetch allowed in flight
#[derive(Debug, Default)]
struct WeekLoads {
    in_flight: Option<NaiveDate>,
    // A fetch was requested while one was running
    refetch: bool,
}

impl WeekLoads {
    /// Claim the fetch slot for `week`. False while another fetch runs.
    fn start(&mut self, week: NaiveDate) -> bool {
        if self.in_flight.is_some() {
            self.refetch = true;
            return false;
        }
        self.in_flight = Some(week);
        true
    }

    /// Release the slot after `week` finished or failed. Returns the week
    /// that still has to be fetched: the shown one, if the view moved on or
    /// asked again meanwhile.
    fn finish(&mut self, week: NaiveDate, shown: NaiveDate) -> Option<NaiveDate> {
        self.in_flight = None;
        let refetch = std::mem::take(&mut self.refetch);
        (refetch || week != shown).then_some(shown)
    }

    fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Editable copy of an activity
#[derive(Debug, Clone, Default)]
struct ActivityForm {
    activity_id: Option<String>,
    member_id: Option<String>,
    title: String,
    date: String,
    start_time: String,
    end_time: String,
    location: String,
    description: String,
    source: ActivitySource,
    url: Option<String>,
    error: Option<String>,
}

impl ActivityForm {
    fn for_new(date: NaiveDate, start_time: &str, member_id: Option<String>) -> Self {
        let end_time = parse_time_to_minutes(start_time)
            .map(|m| crate::layout::Minutes(m.0.saturating_add(60).min(23 * 60 + 59)).to_string())
            .unwrap_or_default();
        Self {
            member_id,
            date: date.format("%Y-%m-%d").to_string(),
            start_time: start_time.to_string(),
            end_time,
            ..Self::default()
        }
    }

    fn for_edit(activity: &Activity) -> Self {
        Self {
            activity_id: Some(activity.id.clone()),
            member_id: activity.member_id.clone(),
            title: activity.title.clone(),
            date: activity.date.format("%Y-%m-%d").to_string(),
            start_time: activity.start_time.clone(),
            end_time: activity.end_time.clone(),
            location: activity.location.clone().unwrap_or_default(),
            description: activity.description.clone().unwrap_or_default(),
            source: activity.source,
            url: activity.url.clone(),
            error: None,
        }
    }

    /// Build the request body, or a message for the user
    fn to_new_activity(&self) -> Result<NewActivity, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| "Date must be YYYY-MM-DD".to_string())?;
        let start_time = parse_start_time(&self.start_time)
            .ok_or_else(|| "Start time is not a valid time".to_string())?;
        let end_time = parse_start_time(&self.end_time)
            .ok_or_else(|| "End time is not a valid time".to_string())?;

        // The layout assumes every activity ends after it starts
        let start = parse_time_to_minutes(&start_time).map_err(|e| e.to_string())?;
        let end = parse_time_to_minutes(&end_time).map_err(|e| e.to_string())?;
        if end <= start {
            return Err("End time must be after start time".to_string());
        }

        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        Ok(NewActivity {
            member_id: self.member_id.clone(),
            title: title.to_string(),
            date,
            start_time,
            end_time,
            location: optional(&self.location),
            description: optional(&self.description),
            source: self.source,
        })
    }
}

impl HomeDashApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let config = Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config unreadable; starting from defaults");
            Config::default()
        });
        theme::setup_fonts(&cc.egui_ctx);
        theme::setup_theme(&cc.egui_ctx);
        let state = if config.is_configured() {
            AppState::Main
        } else {
            AppState::Setup
        };

        let runtime = tokio::runtime::Runtime::new()?;
        let (result_tx, result_rx) = channel();
        let today = Local::now().date_naive();

        let mut app = Self {
            show_settings: false,
            settings_base_url: config.api_base_url.clone(),
            settings_token: String::new(),
            settings_clock_format: config.clock_format,
            settings_start_hour: config.schedule_start_hour,
            settings_end_hour: config.schedule_end_hour,
            settings_stale_minutes: config.spond_stale_after_minutes,
            settings_colors: Vec::new(),
            config,
            state,
            week_data: WeekData::new(week_start(today)),
            members: Vec::new(),
            show_dialog: false,
            dialog: ActivityForm::default(),
            pending_delete: None,
            show_import: false,
            import_path: String::new(),
            import_member: None,
            status_message: None,
            saving: false,
            week_loads: WeekLoads::default(),
            is_offline: false,
            reconcile_after_load: false,
            runtime,
            result_rx,
            result_tx,
        };

        if state == AppState::Main {
            app.load_week(app.week_data.week_start, true);
        }

        Ok(app)
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::WeekLoaded(week, members, activities) => {
                    self.is_offline = false;
                    if let Some(shown) = self.week_loads.finish(week, self.week_data.week_start) {
                        self.load_week(shown, false);
                        continue;
                    }
                    self.members = members;
                    self.week_data.activities = activities;
                    if self.reconcile_after_load {
                        self.reconcile_after_load = false;
                        self.reconcile_spond();
                    }
                }
                AsyncResult::WeekLoadFailed(week, error) => {
                    match error {
                        Some(msg) => {
                            self.is_offline = false;
                            self.status_message = Some((msg, true));
                        }
                        None => self.is_offline = true,
                    }
                    if let Some(shown) = self.week_loads.finish(week, self.week_data.week_start) {
                        self.load_week(shown, false);
                    }
                }
                AsyncResult::ActivitySaved(activity) => {
                    self.saving = false;
                    self.show_dialog = false;
                    self.week_data.apply_saved(activity);
                }
                AsyncResult::ActivityDeleted(id) => {
                    self.saving = false;
                    self.show_dialog = false;
                    self.week_data.remove(&id);
                }
                AsyncResult::SpondReconciled(outcomes) => {
                    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
                    if failed > 0 {
                        self.status_message = Some((format!("Spond check failed for {} member(s)", failed), true));
                    }
                    if outcomes.iter().any(|o| o.triggered) {
                        self.load_week(self.week_data.week_start, false);
                    }
                }
                AsyncResult::SchoolPlanImported(count) => {
                    self.saving = false;
                    self.show_import = false;
                    self.status_message = Some((format!("Imported {} activities from school plan", count), false));
                    self.load_week(self.week_data.week_start, false);
                }
                AsyncResult::Error(msg) => {
                    self.saving = false;
                    self.is_offline = false;
                    self.status_message = Some((msg, true));
                }
                AsyncResult::Offline => {
                    self.saving = false;
                    self.is_offline = true;
                    self.status_message = None;
                }
            }
        }
    }

    /// Log a failed request. None when the server could not be reached.
    fn describe_failure(context: &str, err: &anyhow::Error) -> Option<String> {
        tracing::error!(error = %err, "{}", context);
        (!ApiError::is_offline(err)).then(|| format!("{}: {}", context, err))
    }

    fn send_failure(tx: &Sender<AsyncResult>, context: &str, err: anyhow::Error) {
        let result = match Self::describe_failure(context, &err) {
            Some(msg) => AsyncResult::Error(msg),
            None => AsyncResult::Offline,
        };
        let _ = tx.send(result);
    }

    fn load_week(&mut self, week_start_date: NaiveDate, reconcile: bool) {
        self.reconcile_after_load |= reconcile;
        if !self.config.is_configured() {
            return;
        }

        if self.week_data.week_start != week_start_date {
            self.week_data = WeekData::new(week_start_date);
        }

        // The running fetch reloads the shown week when it finishes
        if !self.week_loads.start(week_start_date) {
            return;
        }

        let config = self.config.clone();
        let tx = self.result_tx.clone();
        let end_date = week_start_date + Duration::days(6);

        self.runtime.spawn(async move {
            let result = async {
                let client = HomeDashClient::new(&config)?;
                let members = client.list_family_members().await?;
                let activities = client.list_activities(week_start_date, end_date).await?;
                Ok::<_, anyhow::Error>((members, activities))
            }.await;

            match result {
                Ok((members, activities)) => {
                    tracing::debug!(week = %week_start_date, activities = activities.len(), "week loaded");
                    let _ = tx.send(AsyncResult::WeekLoaded(week_start_date, members, activities));
                }
                Err(e) => {
                    let error = Self::describe_failure("Failed to load week", &e);
                    let _ = tx.send(AsyncResult::WeekLoadFailed(week_start_date, error));
                }
            }
        });
    }

    /// Fire-and-forget Spond freshness check for the loaded members
    fn reconcile_spond(&mut self) {
        if !self.members.iter().any(|m| m.has_spond()) {
            return;
        }

        let config = self.config.clone();
        let members = self.members.clone();
        let tx = self.result_tx.clone();

        self.runtime.spawn(async move {
            let client = match HomeDashClient::new(&config) {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping Spond check");
                    return;
                }
            };
            let outcomes = reconcile_members(&client, &members, Utc::now(), config.spond_stale_after()).await;
            let _ = tx.send(AsyncResult::SpondReconciled(outcomes));
        });
    }

    fn open_add_dialog(&mut self, date: NaiveDate, start_time: &str) {
        let member = match self.config.view_mode {
            ViewMode::Person => self.config.selected_member.clone(),
            ViewMode::Week => None,
        };
        self.dialog = ActivityForm::for_new(date, start_time, member);
        self.show_dialog = true;
    }

    fn open_edit_dialog(&mut self, activity: &Activity) {
        self.dialog = ActivityForm::for_edit(activity);
        self.show_dialog = true;
    }

    fn save_dialog(&mut self) {
        let request = match self.dialog.to_new_activity() {
            Ok(request) => request,
            Err(msg) => {
                self.dialog.error = Some(msg);
                return;
            }
        };
        self.dialog.error = None;
        self.saving = true;

        let config = self.config.clone();
        let tx = self.result_tx.clone();
        let activity_id = self.dialog.activity_id.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = HomeDashClient::new(&config)?;
                match &activity_id {
                    Some(id) => client.update_activity(id, &request).await,
                    None => client.create_activity(&request).await,
                }
            }.await;

            match result {
                Ok(activity) => {
                    let _ = tx.send(AsyncResult::ActivitySaved(activity));
                }
                Err(e) => Self::send_failure(&tx, "Failed to save activity", e),
            }
        });
    }

    fn delete_activity(&mut self, activity: Activity) {
        self.saving = true;
        let config = self.config.clone();
        let tx = self.result_tx.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = HomeDashClient::new(&config)?;
                client.delete_activity(&activity.id).await
            }.await;

            match result {
                Ok(()) => {
                    let _ = tx.send(AsyncResult::ActivityDeleted(activity.id));
                }
                Err(e) => Self::send_failure(&tx, "Failed to delete activity", e),
            }
        });
    }

    fn import_school_plan(&mut self) {
        let Some(member_id) = self.import_member.clone() else {
            self.status_message = Some(("Choose who the school plan belongs to".to_string(), true));
            return;
        };
        let path = PathBuf::from(self.import_path.trim());
        let image = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.status_message = Some((format!("Could not read {}: {}", path.display(), e), true));
                return;
            }
        };
        let mime_type = image_mime_type(&path);
        self.saving = true;

        let config = self.config.clone();
        let tx = self.result_tx.clone();

        self.runtime.spawn(async move {
            let result = async {
                let client = HomeDashClient::new(&config)?;
                let drafts = client.extract_school_plan(&member_id, &image, mime_type).await?;
                let mut created = 0;
                for mut draft in drafts {
                    draft.member_id = Some(member_id.clone());
                    draft.source = ActivitySource::SchoolPlan;
                    // One bad row should not lose the rest of the plan
                    match client.create_activity(&draft).await {
                        Ok(_) => created += 1,
                        Err(e) => tracing::warn!(title = %draft.title, error = %e, "skipping school plan entry"),
                    }
                }
                Ok::<_, anyhow::Error>(created)
            }.await;

            match result {
                Ok(count) => {
                    let _ = tx.send(AsyncResult::SchoolPlanImported(count));
                }
                Err(e) => Self::send_failure(&tx, "School plan import failed", e),
            }
        });
    }

    fn open_settings(&mut self) {
        self.settings_base_url = self.config.api_base_url.clone();
        self.settings_token.clear();
        self.settings_clock_format = self.config.clock_format;
        self.settings_start_hour = self.config.schedule_start_hour;
        self.settings_end_hour = self.config.schedule_end_hour;
        self.settings_stale_minutes = self.config.spond_stale_after_minutes;
        self.settings_colors = self.members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), member_color(&self.config, Some(&m.id), Some(i))))
            .collect();
        self.show_settings = true;
    }

    fn save_settings(&mut self) {
        let connection_changed =
            self.config.api_base_url != self.settings_base_url.trim()
            || !self.settings_token.is_empty();

        self.config.api_base_url = self.settings_base_url.trim().to_string();
        if !self.settings_token.is_empty() {
            self.config.api_token = Some(self.settings_token.clone());
        }
        self.config.clock_format = self.settings_clock_format;
        self.config.schedule_end_hour = self.settings_end_hour.clamp(1, 24);
        self.config.schedule_start_hour = self.settings_start_hour.min(self.config.schedule_end_hour - 1);
        self.config.spond_stale_after_minutes = self.settings_stale_minutes.max(0);
        for (member_id, color) in &self.settings_colors {
            self.config.set_member_color(member_id, &to_hex_color(*color));
        }

        match self.config.save() {
            Ok(()) => {
                self.show_settings = false;
                if self.config.is_configured() && self.state == AppState::Setup {
                    self.state = AppState::Main;
                }
                if connection_changed {
                    self.load_week(self.week_data.week_start, true);
                }
            }
            Err(e) => {
                self.status_message = Some((format!("Failed to save: {}", e), true));
            }
        }
    }

    fn render_setup(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("HomeDash setup");
            ui.add_space(20.0);
            ui.label("Connect to your HomeDash server to get started.");
            ui.add_space(20.0);
        });

        egui::Grid::new("setup_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("Server:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_base_url)
                        .hint_text("https://homedash.local/api")
                        .desired_width(350.0)
                );
                ui.end_row();

                ui.label("Access token:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings_token)
                        .password(true)
                        .hint_text("Paste your access token here")
                        .desired_width(350.0)
                );
                ui.end_row();
            });

        ui.add_space(20.0);
        if ui.button("Save and connect").clicked() {
            self.save_settings();
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let (button_bg, button_text) = theme::button_colors();

            egui::Frame::none()
                .fill(button_bg)
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::symmetric(8.0, 4.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let left_arrow = ui.add(egui::Label::new(
                            RichText::new(egui_phosphor::regular::CARET_LEFT).size(14.0).color(button_text)
                        ).sense(egui::Sense::click()));
                        if left_arrow.clicked() {
                            self.load_week(self.week_data.week_start - Duration::days(7), true);
                        }

                        let start = self.week_data.week_start;
                        let end = start + Duration::days(6);
                        let date_text = format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y"));
                        ui.label(RichText::new(date_text).size(14.0).color(button_text));

                        let right_arrow = ui.add(egui::Label::new(
                            RichText::new(egui_phosphor::regular::CARET_RIGHT).size(14.0).color(button_text)
                        ).sense(egui::Sense::click()));
                        if right_arrow.clicked() {
                            self.load_week(self.week_data.week_start + Duration::days(7), true);
                        }
                    });
                });

            if ui.button("Today").clicked() {
                self.load_week(week_start(Local::now().date_naive()), true);
            }

            ui.add_space(16.0);
            let mut view_mode = self.config.view_mode;
            ui.selectable_value(&mut view_mode, ViewMode::Week, format!("{} Family", egui_phosphor::regular::USERS_THREE));
            ui.selectable_value(&mut view_mode, ViewMode::Person, format!("{} Person", egui_phosphor::regular::USER));
            if view_mode != self.config.view_mode {
                self.config.view_mode = view_mode;
                if self.config.selected_member.is_none() {
                    self.config.selected_member = self.members.first().map(|m| m.id.clone());
                }
                let _ = self.config.save();
            }

            if self.config.view_mode == ViewMode::Person {
                let selected_name = self.config.selected_member.as_deref()
                    .and_then(|id| self.members.iter().find(|m| m.id == id))
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| "Choose member".to_string());
                let mut selected = self.config.selected_member.clone();
                egui::ComboBox::from_label("")
                    .selected_text(selected_name)
                    .show_ui(ui, |ui| {
                        for member in &self.members {
                            ui.selectable_value(&mut selected, Some(member.id.clone()), &member.name);
                        }
                    });
                if selected != self.config.selected_member {
                    self.config.selected_member = selected;
                    let _ = self.config.save();
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(egui_phosphor::regular::GEAR).on_hover_text("Settings").clicked() {
                    self.open_settings();
                }
                if ui.button(egui_phosphor::regular::IMAGE).on_hover_text("Import school plan").clicked() {
                    self.import_member = self.config.selected_member.clone()
                        .or_else(|| self.members.first().map(|m| m.id.clone()));
                    self.show_import = true;
                }
                if ui.button(egui_phosphor::regular::ARROWS_CLOCKWISE).on_hover_text("Refresh").clicked() {
                    self.load_week(self.week_data.week_start, true);
                }
                if self.saving || self.week_loads.is_loading() {
                    ui.spinner();
                }
                if self.is_offline {
                    ui.label(RichText::new(format!("{} Offline", egui_phosphor::regular::WIFI_SLASH))
                        .color(Color32::from_rgb(0xe5, 0xaa, 0x00)));
                }
            });
        });

        if let Some((msg, is_error)) = self.status_message.clone() {
            ui.horizontal(|ui| {
                let color = if is_error { Color32::from_rgb(0xe5, 0x4d, 0x42) } else { theme::ACCENT };
                ui.label(RichText::new(msg).color(color));
                if ui.small_button(egui_phosphor::regular::X).clicked() {
                    self.status_message = None;
                }
            });
        }
    }

    fn render_main(&mut self, ui: &mut egui::Ui) {
        self.render_header(ui);
        ui.add_space(8.0);

        let result = match (self.config.view_mode, self.config.selected_member.as_deref()) {
            (ViewMode::Person, Some(member_id)) => {
                views::render_person_week_view(ui, &self.week_data, &self.members, &self.config, member_id)
            }
            _ => views::render_week_view(ui, &self.week_data, &self.members, &self.config),
        };

        if let Some(activity) = result.edit_activity {
            self.open_edit_dialog(&activity);
        } else if let Some((date, start_time)) = result.add_at {
            self.open_add_dialog(date, &start_time);
        }
    }

    fn render_activity_dialog(&mut self, ctx: &egui::Context) {
        let title = if self.dialog.activity_id.is_some() { "Edit activity" } else { "New activity" };
        let mut open = true;
        let mut save = false;
        let mut delete = false;

        egui::Window::new(title)
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Grid::new("activity_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Title");
                        ui.add(egui::TextEdit::singleline(&mut self.dialog.title).desired_width(300.0));
                        ui.end_row();

                        ui.label("Who");
                        let who = self.dialog.member_id.as_deref()
                            .and_then(|id| self.members.iter().find(|m| m.id == id))
                            .map(|m| m.name.clone())
                            .unwrap_or_else(|| "Whole family".to_string());
                        egui::ComboBox::from_label(" ")
                            .selected_text(who)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(&mut self.dialog.member_id, None, "Whole family");
                                for member in &self.members {
                                    ui.selectable_value(&mut self.dialog.member_id, Some(member.id.clone()), &member.name);
                                }
                            });
                        ui.end_row();

                        ui.label("Date");
                        ui.add(egui::TextEdit::singleline(&mut self.dialog.date)
                            .hint_text("YYYY-MM-DD")
                            .desired_width(120.0));
                        ui.end_row();

                        ui.label("Time");
                        ui.horizontal(|ui| {
                            ui.add(egui::TextEdit::singleline(&mut self.dialog.start_time)
                                .hint_text("09:00")
                                .desired_width(70.0));
                            ui.label("to");
                            ui.add(egui::TextEdit::singleline(&mut self.dialog.end_time)
                                .hint_text("10:00")
                                .desired_width(70.0));
                        });
                        ui.end_row();

                        ui.label("Location");
                        ui.add(egui::TextEdit::singleline(&mut self.dialog.location).desired_width(300.0));
                        ui.end_row();

                        ui.label("Notes");
                        ui.add(egui::TextEdit::multiline(&mut self.dialog.description)
                            .desired_rows(3)
                            .desired_width(300.0));
                        ui.end_row();
                    });

                if self.dialog.source != ActivitySource::Manual {
                    ui.label(RichText::new(format!("From {}", self.dialog.source.label()))
                        .color(Color32::from_rgb(0x70, 0x70, 0x68)));
                }

                if let Some(error) = &self.dialog.error {
                    ui.label(RichText::new(error).color(Color32::from_rgb(0xe5, 0x4d, 0x42)));
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.add_enabled(!self.saving, egui::Button::new("Save")).clicked() {
                        save = true;
                    }
                    if let Some(url) = &self.dialog.url {
                        if ui.button(format!("{} Open link", egui_phosphor::regular::ARROW_SQUARE_OUT)).clicked() {
                            if let Err(e) = open::that(url) {
                                tracing::warn!(%url, error = %e, "could not open link");
                            }
                        }
                    }
                    if self.dialog.activity_id.is_some()
                        && ui.button(RichText::new("Delete").color(Color32::from_rgb(0xe5, 0x4d, 0x42))).clicked()
                    {
                        delete = true;
                    }
                });
            });

        if !open {
            self.show_dialog = false;
        }
        if save {
            self.save_dialog();
        }
        if delete {
            self.pending_delete = self.dialog.activity_id.as_ref()
                .and_then(|id| self.week_data.activities.iter().find(|a| &a.id == id))
                .cloned();
        }
    }

    fn render_delete_confirm(&mut self, ctx: &egui::Context) {
        let Some(activity) = self.pending_delete.clone() else {
            return;
        };
        let mut decided = false;

        egui::Window::new("Delete activity?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("\"{}\" on {} will be removed.", activity.title, activity.date.format("%a %b %-d")));
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        self.delete_activity(activity.clone());
                        decided = true;
                    }
                    if ui.button("Cancel").clicked() {
                        decided = true;
                    }
                });
            });

        if decided {
            self.pending_delete = None;
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let mut open = true;
        let mut save = false;
        let section_color = Color32::from_rgb(140, 140, 160);

        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(RichText::new("Server").color(section_color).strong());
                egui::Grid::new("server_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("URL");
                        ui.add(egui::TextEdit::singleline(&mut self.settings_base_url).desired_width(300.0));
                        ui.end_row();

                        ui.label("Access token");
                        ui.add(egui::TextEdit::singleline(&mut self.settings_token)
                            .password(true)
                            .hint_text("Leave blank to keep existing")
                            .desired_width(300.0));
                        ui.end_row();
                    });

                ui.add_space(12.0);
                ui.label(RichText::new("Calendar").color(section_color).strong());
                egui::Grid::new("calendar_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Clock");
                        ui.horizontal(|ui| {
                            ui.selectable_value(&mut self.settings_clock_format, ClockFormat::Hour24, "14:30");
                            ui.selectable_value(&mut self.settings_clock_format, ClockFormat::Hour12, "2:30pm");
                        });
                        ui.end_row();

                        ui.label("Day starts");
                        ui.add(egui::Slider::new(&mut self.settings_start_hour, 0..=23).suffix(":00"));
                        ui.end_row();

                        ui.label("Day ends");
                        ui.add(egui::Slider::new(&mut self.settings_end_hour, 1..=24).suffix(":00"));
                        ui.end_row();

                        ui.label("Spond resync after");
                        ui.add(egui::Slider::new(&mut self.settings_stale_minutes, 5..=240).suffix(" min"));
                        ui.end_row();
                    });

                if !self.settings_colors.is_empty() {
                    ui.add_space(12.0);
                    ui.label(RichText::new("Member colors").color(section_color).strong());
                    egui::Grid::new("color_grid")
                        .num_columns(2)
                        .spacing([20.0, 10.0])
                        .show(ui, |ui| {
                            for (member_id, color) in &mut self.settings_colors {
                                let name = self.members.iter()
                                    .find(|m| &m.id == member_id)
                                    .map(|m| m.name.as_str())
                                    .unwrap_or(member_id.as_str());
                                ui.label(name);
                                ui.color_edit_button_srgba(color);
                                ui.end_row();
                            }
                        });
                }

                ui.add_space(12.0);
                if ui.button("Save").clicked() {
                    save = true;
                }
            });

        if !open {
            self.show_settings = false;
        }
        if save {
            self.save_settings();
        }
    }

    fn render_import(&mut self, ctx: &egui::Context) {
        let mut open = true;
        let mut import = false;

        egui::Window::new("Import school plan")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("A photo or screenshot of the timetable is read and turned into activities.");
                egui::Grid::new("import_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Image file");
                        ui.add(egui::TextEdit::singleline(&mut self.import_path)
                            .hint_text("/path/to/plan.jpg")
                            .desired_width(300.0));
                        ui.end_row();

                        ui.label("For");
                        let who = self.import_member.as_deref()
                            .and_then(|id| self.members.iter().find(|m| m.id == id))
                            .map(|m| m.name.clone())
                            .unwrap_or_else(|| "Choose member".to_string());
                        egui::ComboBox::from_label("  ")
                            .selected_text(who)
                            .show_ui(ui, |ui| {
                                for member in &self.members {
                                    ui.selectable_value(&mut self.import_member, Some(member.id.clone()), &member.name);
                                }
                            });
                        ui.end_row();
                    });

                ui.add_space(8.0);
                if ui.add_enabled(!self.saving && !self.import_path.trim().is_empty(), egui::Button::new("Import")).clicked() {
                    import = true;
                }
            });

        if !open {
            self.show_import = false;
        }
        if import {
            self.import_school_plan();
        }
    }
}

impl eframe::App for HomeDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pinch-to-zoom (trackpad pinch or Ctrl+scroll)
        let zoom_delta = ctx.input(|i| i.zoom_delta());
        if zoom_delta != 1.0 {
            self.config.font_scale = (self.config.font_scale * zoom_delta).clamp(0.75, 2.5);
            if (zoom_delta - 1.0).abs() > 0.01 {
                let _ = self.config.save();
            }
        }
        ctx.set_pixels_per_point(self.config.font_scale);

        self.check_async_results();

        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            AppState::Setup => self.render_setup(ui),
            AppState::Main => self.render_main(ui),
        });

        if self.show_dialog {
            self.render_activity_dialog(ctx);
        }
        if self.pending_delete.is_some() {
            self.render_delete_confirm(ctx);
        }
        if self.show_settings {
            self.render_settings(ctx);
        }
        if self.show_import {
            self.render_import(ctx);
        }

        // Keep polling while background work is in flight
        if self.saving || self.week_loads.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(start: &str, end: &str) -> ActivityForm {
        ActivityForm {
            title: "Piano lesson".to_string(),
            date: "2026-10-21".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..ActivityForm::default()
        }
    }

    #[test]
    fn form_normalizes_times() {
        let request = form("4pm", "16:45").to_new_activity().unwrap();
        assert_eq!(request.start_time, "16:00");
        assert_eq!(request.end_time, "16:45");
        assert_eq!(request.location, None);
        assert_eq!(request.source, ActivitySource::Manual);
    }

    #[test]
    fn form_rejects_non_positive_duration() {
        assert!(form("10:00", "10:00").to_new_activity().is_err());
        assert!(form("11:00", "10:00").to_new_activity().is_err());
    }

    #[test]
    fn form_requires_title_and_date() {
        let mut f = form("10:00", "11:00");
        f.title = "  ".to_string();
        assert_eq!(f.to_new_activity().unwrap_err(), "Title is required");

        let mut f = form("10:00", "11:00");
        f.date = "21.10.2026".to_string();
        assert!(f.to_new_activity().is_err());
    }

    #[test]
    fn week_change_during_fetch_reloads_shown_week() {
        let this_week = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let next_week = this_week + Duration::days(7);
        let mut loads = WeekLoads::default();

        assert!(loads.start(this_week));
        // User pages forward while the first fetch runs
        assert!(!loads.start(next_week));
        assert!(loads.is_loading());

        assert_eq!(loads.finish(this_week, next_week), Some(next_week));
        assert!(!loads.is_loading());
        assert!(loads.start(next_week));
        assert_eq!(loads.finish(next_week, next_week), None);
    }

    #[test]
    fn refresh_during_fetch_fetches_again() {
        let week = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut loads = WeekLoads::default();

        assert!(loads.start(week));
        assert!(!loads.start(week));
        assert_eq!(loads.finish(week, week), Some(week));

        assert!(loads.start(week));
        assert_eq!(loads.finish(week, week), None);
    }

    #[test]
    fn new_form_defaults_to_one_hour() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let f = ActivityForm::for_new(date, "17:15", Some("anna".to_string()));
        assert_eq!(f.end_time, "18:15");
        assert_eq!(f.date, "2026-10-21");
        assert_eq!(f.member_id.as_deref(), Some("anna"));

        let late = ActivityForm::for_new(date, "23:30", None);
        assert_eq!(late.end_time, "23:59");
    }
}
