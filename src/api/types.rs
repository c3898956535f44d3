use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::layout::ScheduledActivity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: String,
    pub name: String,
    /// Set when the member's club activities are pulled from Spond
    #[serde(rename = "spondGroupId", default)]
    pub spond_group_id: Option<String>,
}

impl FamilyMember {
    pub fn has_spond(&self) -> bool {
        self.spond_group_id.as_deref().is_some_and(|g| !g.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    #[default]
    Manual,
    Spond,
    Ical,
    SchoolPlan,
}

impl ActivitySource {
    pub fn label(&self) -> &'static str {
        match self {
            ActivitySource::Manual => "Manual",
            ActivitySource::Spond => "Spond",
            ActivitySource::Ical => "Calendar feed",
            ActivitySource::SchoolPlan => "School plan",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// None for activities shared by the whole family
    #[serde(rename = "memberId", default)]
    pub member_id: Option<String>,
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "startTime")]
    pub start_time: String,  // "HH:MM"
    #[serde(rename = "endTime")]
    pub end_time: String,    // "HH:MM"
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: ActivitySource,
    #[serde(default)]
    pub url: Option<String>,
}

impl ScheduledActivity for Activity {
    fn start_time(&self) -> &str {
        &self.start_time
    }

    fn end_time(&self) -> &str {
        &self.end_time
    }
}

impl Activity {
    pub fn belongs_to(&self, member_id: &str) -> bool {
        match &self.member_id {
            Some(id) => id == member_id,
            None => true,
        }
    }
}

/// Body for creating or replacing an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    #[serde(rename = "memberId", default)]
    pub member_id: Option<String>,
    pub title: String,
    pub date: NaiveDate,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub source: ActivitySource,
}

impl From<&Activity> for NewActivity {
    fn from(activity: &Activity) -> Self {
        Self {
            member_id: activity.member_id.clone(),
            title: activity.title.clone(),
            date: activity.date,
            start_time: activity.start_time.clone(),
            end_time: activity.end_time.clone(),
            location: activity.location.clone(),
            description: activity.description.clone(),
            source: activity.source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpondSyncStatus {
    #[serde(rename = "memberId")]
    pub member_id: String,
    #[serde(rename = "lastSyncedAt", default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(rename = "inProgress", default)]
    pub in_progress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolPlanRequest {
    #[serde(rename = "memberId")]
    pub member_id: String,
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolPlanExtraction {
    #[serde(default)]
    pub activities: Vec<NewActivity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_deserializes_from_backend_json() {
        let json = r#"{
            "id": "42",
            "memberId": "m1",
            "title": "Football practice",
            "date": "2026-10-19",
            "startTime": "17:30",
            "endTime": "19:00",
            "source": "spond",
            "url": "https://spond.com/client/sponds/abc"
        }"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.source, ActivitySource::Spond);
        assert_eq!(activity.date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(ScheduledActivity::start_time(&activity), "17:30");
        assert!(activity.location.is_none());
        assert!(activity.belongs_to("m1"));
        assert!(!activity.belongs_to("m2"));
    }

    #[test]
    fn shared_activity_belongs_to_everyone() {
        let json = r#"{"id": "7", "title": "Dinner at grandma's", "date": "2026-10-18",
                       "startTime": "18:00", "endTime": "20:00"}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.source, ActivitySource::Manual);
        assert!(activity.belongs_to("anyone"));
    }

    #[test]
    fn new_activity_omits_empty_optionals() {
        let draft = NewActivity {
            member_id: Some("m2".to_string()),
            title: "Math".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            start_time: "08:15".to_string(),
            end_time: "09:00".to_string(),
            location: None,
            description: None,
            source: ActivitySource::SchoolPlan,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["memberId"], "m2");
        assert_eq!(value["source"], "school_plan");
        assert!(value.get("location").is_none());
    }

    #[test]
    fn sync_status_tolerates_never_synced() {
        let status: SpondSyncStatus = serde_json::from_str(r#"{"memberId": "m1"}"#).unwrap();
        assert!(status.last_synced_at.is_none());
        assert!(!status.in_progress);
    }
}
