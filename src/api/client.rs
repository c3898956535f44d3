use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDate;
use reqwest::{header, Client, Response};
use thiserror::Error;

use super::types::*;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {status} - {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("could not reach HomeDash: {0}")]
    Unreachable(#[source] reqwest::Error),
}

impl ApiError {
    /// True when the error came from the network, not from the server
    pub fn is_offline(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unreachable(_)))
    }
}

pub struct HomeDashClient {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl HomeDashClient {
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.api_token.as_ref()
            .context("API token not configured")?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            auth_header: format!("Bearer {}", token),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request
            .header(header::AUTHORIZATION, &self.auth_header)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "HomeDash request failed");
            return Err(ApiError::Status { status, body }.into());
        }

        Ok(response)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET");
        let response = self.send(self.client.get(&url)).await?;
        response.json::<T>().await
            .with_context(|| format!("Invalid response from {}", endpoint))
    }

    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "POST");
        let response = self.send(self.client.post(&url).json(body)).await?;
        response.json::<T>().await
            .with_context(|| format!("Invalid response from {}", endpoint))
    }

    async fn put<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "PUT");
        let response = self.send(self.client.put(&url).json(body)).await?;
        response.json::<T>().await
            .with_context(|| format!("Invalid response from {}", endpoint))
    }

    /// All family members
    pub async fn list_family_members(&self) -> Result<Vec<FamilyMember>> {
        self.get("/family-members").await
    }

    /// Activities dated within `start..=end`
    pub async fn list_activities(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Activity>> {
        let endpoint = activities_query(start, end);
        self.get(&endpoint).await
    }

    pub async fn create_activity(&self, activity: &NewActivity) -> Result<Activity> {
        self.post("/activities", activity).await
    }

    pub async fn update_activity(&self, id: &str, activity: &NewActivity) -> Result<Activity> {
        let endpoint = format!("/activities/{}", urlencoding::encode(id));
        self.put(&endpoint, activity).await
    }

    pub async fn delete_activity(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("/activities/{}", urlencoding::encode(id)));
        tracing::debug!(%url, "DELETE");
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    /// When the member's Spond activities were last pulled
    pub async fn spond_sync_status(&self, member_id: &str) -> Result<SpondSyncStatus> {
        let endpoint = format!("/spond/status/{}", urlencoding::encode(member_id));
        self.get(&endpoint).await
    }

    /// Ask the backend to pull the member's Spond activities now
    pub async fn trigger_spond_sync(&self, member_id: &str) -> Result<()> {
        let url = self.url(&format!("/spond/sync/{}", urlencoding::encode(member_id)));
        tracing::debug!(%url, "POST");
        self.send(self.client.post(&url)).await?;
        Ok(())
    }

    /// Send a photo of a school timetable for extraction.
    /// Returns activity drafts; nothing is stored until they are created.
    pub async fn extract_school_plan(
        &self,
        member_id: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<NewActivity>> {
        let request = SchoolPlanRequest {
            member_id: member_id.to_string(),
            image_base64: STANDARD.encode(image),
            mime_type: mime_type.to_string(),
        };
        let extraction: SchoolPlanExtraction = self.post("/school-plan/extract", &request).await?;
        tracing::info!(
            member_id,
            activities = extraction.activities.len(),
            "school plan extracted"
        );
        Ok(extraction.activities)
    }
}

fn activities_query(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "/activities?startDate={}&endDate={}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Guess an image MIME type from the file extension
pub fn image_mime_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}
