//! Spond sync-on-view.
//!
//! When a week is shown, every member linked to Spond is checked and a
//! backend resync is requested if their last pull is too old. Failures are
//! logged per member and never stop the pass; the next view retries.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::api::{FamilyMember, HomeDashClient, SpondSyncStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Fresh,
    Stale,
    NeverSynced,
    /// A sync is already running on the backend
    InProgress,
}

impl SyncDecision {
    pub fn needs_sync(self) -> bool {
        matches!(self, SyncDecision::Stale | SyncDecision::NeverSynced)
    }
}

pub fn decide(status: &SpondSyncStatus, now: DateTime<Utc>, stale_after: Duration) -> SyncDecision {
    if status.in_progress {
        return SyncDecision::InProgress;
    }
    match status.last_synced_at {
        None => SyncDecision::NeverSynced,
        Some(last) if now - last >= stale_after => SyncDecision::Stale,
        Some(_) => SyncDecision::Fresh,
    }
}

/// Where sync status comes from and where resyncs are requested
pub trait SpondSyncSource {
    async fn sync_status(&self, member_id: &str) -> Result<SpondSyncStatus>;
    async fn trigger_sync(&self, member_id: &str) -> Result<()>;
}

impl SpondSyncSource for HomeDashClient {
    async fn sync_status(&self, member_id: &str) -> Result<SpondSyncStatus> {
        self.spond_sync_status(member_id).await
    }

    async fn trigger_sync(&self, member_id: &str) -> Result<()> {
        self.trigger_spond_sync(member_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub member_id: String,
    /// None when the status check itself failed
    pub decision: Option<SyncDecision>,
    pub triggered: bool,
    pub error: Option<String>,
}

/// Check each Spond-linked member and trigger a resync where needed
pub async fn reconcile_members<S: SpondSyncSource>(
    source: &S,
    members: &[FamilyMember],
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Vec<ReconcileOutcome> {
    let mut outcomes = Vec::new();

    for member in members.iter().filter(|m| m.has_spond()) {
        outcomes.push(reconcile_member(source, member, now, stale_after).await);
    }

    outcomes
}

async fn reconcile_member<S: SpondSyncSource>(
    source: &S,
    member: &FamilyMember,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome {
        member_id: member.id.clone(),
        decision: None,
        triggered: false,
        error: None,
    };

    let status = match source.sync_status(&member.id).await {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!(member = %member.id, error = %e, "Spond status check failed");
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    let decision = decide(&status, now, stale_after);
    outcome.decision = Some(decision);

    if !decision.needs_sync() {
        tracing::debug!(member = %member.id, ?decision, "Spond sync not needed");
        return outcome;
    }

    tracing::info!(member = %member.id, ?decision, "triggering Spond sync");
    match source.trigger_sync(&member.id).await {
        Ok(()) => outcome.triggered = true,
        Err(e) => {
            tracing::warn!(member = %member.id, error = %e, "Spond sync trigger failed");
            outcome.error = Some(e.to_string());
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSource {
        statuses: HashMap<String, SpondSyncStatus>,
        failing_trigger: Option<String>,
        triggered: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(statuses: Vec<SpondSyncStatus>) -> Self {
            Self {
                statuses: statuses.into_iter().map(|s| (s.member_id.clone(), s)).collect(),
                failing_trigger: None,
                triggered: Mutex::new(Vec::new()),
            }
        }
    }

    impl SpondSyncSource for FakeSource {
        async fn sync_status(&self, member_id: &str) -> Result<SpondSyncStatus> {
            self.statuses
                .get(member_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no status for {}", member_id))
        }

        async fn trigger_sync(&self, member_id: &str) -> Result<()> {
            if self.failing_trigger.as_deref() == Some(member_id) {
                anyhow::bail!("backend busy");
            }
            self.triggered.lock().unwrap().push(member_id.to_string());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-10-18T12:00:00Z".parse().unwrap()
    }

    fn member(id: &str, spond: bool) -> FamilyMember {
        FamilyMember {
            id: id.to_string(),
            name: id.to_uppercase(),
            spond_group_id: spond.then(|| format!("group-{}", id)),
        }
    }

    fn status(id: &str, minutes_ago: Option<i64>) -> SpondSyncStatus {
        SpondSyncStatus {
            member_id: id.to_string(),
            last_synced_at: minutes_ago.map(|m| now() - Duration::minutes(m)),
            in_progress: false,
        }
    }

    #[test]
    fn decision_follows_staleness_threshold() {
        let threshold = Duration::minutes(30);
        assert_eq!(decide(&status("a", Some(5)), now(), threshold), SyncDecision::Fresh);
        assert_eq!(decide(&status("a", Some(30)), now(), threshold), SyncDecision::Stale);
        assert_eq!(decide(&status("a", None), now(), threshold), SyncDecision::NeverSynced);

        let mut running = status("a", None);
        running.in_progress = true;
        assert_eq!(decide(&running, now(), threshold), SyncDecision::InProgress);
        assert!(!SyncDecision::InProgress.needs_sync());
    }

    #[tokio::test]
    async fn triggers_only_stale_spond_members() {
        let source = FakeSource::new(vec![
            status("anna", Some(120)),
            status("ben", Some(2)),
            status("cleo", None),
        ]);
        let members = [member("anna", true), member("ben", true), member("cleo", true), member("dad", false)];

        let outcomes = reconcile_members(&source, &members, now(), Duration::minutes(30)).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(*source.triggered.lock().unwrap(), vec!["anna".to_string(), "cleo".to_string()]);
        assert!(outcomes.iter().all(|o| o.error.is_none()));
        assert_eq!(outcomes[1].decision, Some(SyncDecision::Fresh));
        assert!(!outcomes[1].triggered);
    }

    #[tokio::test]
    async fn failures_are_reported_and_do_not_stop_the_pass() {
        let mut source = FakeSource::new(vec![status("anna", None), status("cleo", None)]);
        source.failing_trigger = Some("anna".to_string());
        let members = [member("anna", true), member("ben", true), member("cleo", true)];

        let outcomes = reconcile_members(&source, &members, now(), Duration::minutes(30)).await;

        assert_eq!(outcomes[0].error.as_deref(), Some("backend busy"));
        assert!(!outcomes[0].triggered);
        // ben has no status at all
        assert_eq!(outcomes[1].decision, None);
        assert!(outcomes[1].error.is_some());
        assert!(outcomes[2].triggered);
    }
}
