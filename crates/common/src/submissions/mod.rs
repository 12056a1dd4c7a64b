//! Submission workflow
//!
//! The status transition engine over `Submission.is_active` × `status_id`,
//! plus the service that orchestrates it against the store and the
//! reference-data cache. New submissions start at the status with the
//! minimum display order; updates follow the two-branch rule set from the
//! workflow (deactivate-with-reason vs. plain status change).

use crate::cache::{keys, MemoryCache};
use crate::db::models::{Submission, SubmissionStatus};
use crate::db::{Repository, SubmissionView};
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Display name of the status that triggers approval notifications.
/// Resolved against reference data once per catalog load — call sites never
/// compare hard-coded status ids.
pub const AWAITING_APPROVAL_STATUS_NAME: &str = "Waiting for Approval";

/// Requested changes to a submission
///
/// `status_id == 0` is the "no change" sentinel, honored only by the
/// make-inactive branch; the active branch writes the id through
/// unconditionally. The asymmetry is compatibility behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubmission {
    pub status_id: i32,
    pub make_inactive: bool,
    pub reason: Option<String>,
    pub shipment_date: Option<DateTime<Utc>>,
}

/// Result of a successful update, carrying the fan-out trigger decision
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub view: SubmissionView,
    /// True when the requested status resolves to the awaiting-approval
    /// stage; the caller triggers notification fan-out on it.
    pub awaiting_approval: bool,
}

/// The cached submission status list with workflow lookups
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    statuses: Vec<SubmissionStatus>,
}

impl StatusCatalog {
    /// Wrap a loaded status list
    pub fn new(statuses: Vec<SubmissionStatus>) -> Self {
        Self { statuses }
    }

    /// The initial status for new submissions: minimum display order.
    /// An empty catalog is a configuration fault, never silently defaulted.
    pub fn initial(&self) -> Result<&SubmissionStatus> {
        initial_status(&self.statuses)
    }

    /// Id of the awaiting-approval status, if reference data defines one
    pub fn awaiting_approval_id(&self) -> Option<i32> {
        self.statuses
            .iter()
            .find(|s| s.status_name.eq_ignore_ascii_case(AWAITING_APPROVAL_STATUS_NAME))
            .map(|s| s.id)
    }

    /// Whether a status id resolves to the awaiting-approval stage
    pub fn is_awaiting_approval(&self, status_id: i32) -> bool {
        self.awaiting_approval_id()
            .is_some_and(|id| id == status_id)
    }
}

/// Select the status with the globally minimum display order
fn initial_status(statuses: &[SubmissionStatus]) -> Result<&SubmissionStatus> {
    statuses
        .iter()
        .min_by_key(|s| s.display_order)
        .ok_or_else(|| AppError::Configuration {
            message: "Wish list submission statuses not found".to_string(),
        })
}

/// Apply a requested update to a submission row
///
/// Shipment date is set whenever present, independent of the other fields.
/// The make-inactive branch records the reason as given (no validation) and
/// honors the zero-sentinel; the other branch overwrites the status id
/// unconditionally. Both touch `last_modified`.
fn apply_update(
    mut submission: Submission,
    update: &UpdateSubmission,
    now: DateTime<Utc>,
) -> Submission {
    if let Some(shipment) = update.shipment_date {
        submission.shipment_date = Some(shipment.into());
    }

    if update.make_inactive {
        submission.is_active = false;
        submission.last_modified = now.into();
        submission.reason = update.reason.clone();
        if update.status_id != 0 {
            submission.status_id = update.status_id;
        }
    } else {
        submission.status_id = update.status_id;
        submission.last_modified = now.into();
    }

    submission
}

/// Submission lifecycle service over the store and reference-data cache
pub struct SubmissionService {
    repo: Repository,
    cache: Arc<MemoryCache>,
}

impl SubmissionService {
    /// Create a new submission service
    pub fn new(repo: Repository, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Load the status catalog through the reference-data cache
    pub async fn status_catalog(&self) -> Result<StatusCatalog> {
        let repo = self.repo.clone();
        let statuses = self
            .cache
            .get_or_load(&keys::submission_statuses(), || async move {
                repo.load_statuses().await
            })
            .await?;

        Ok(StatusCatalog::new(statuses))
    }

    /// List all active submissions, joined with user and status
    pub async fn list_active(&self) -> Result<Vec<SubmissionView>> {
        self.repo.list_active_submissions().await
    }

    /// Get one submission as a joined view
    pub async fn get(&self, id: i32) -> Result<Option<SubmissionView>> {
        self.repo.find_submission_view(id).await
    }

    /// List one user's submissions, active or not
    pub async fn list_by_user(&self, user_id: i32) -> Result<Vec<SubmissionView>> {
        self.repo.list_submissions_by_user(user_id).await
    }

    /// Create a submission at the workflow's initial status
    pub async fn create(&self, user_id: i32) -> Result<SubmissionView> {
        let catalog = self.status_catalog().await?;
        let initial = catalog.initial()?;

        let now = Utc::now();
        let inserted = self.repo.insert_submission(user_id, initial.id, now).await?;

        metrics::record_submission("created");
        info!(
            submission_id = inserted.id,
            user_id,
            status_id = inserted.status_id,
            "Submission created"
        );

        self.view_of(inserted.id).await
    }

    /// Apply a status update; absent submissions yield `None`
    pub async fn update(&self, id: i32, update: UpdateSubmission) -> Result<Option<UpdateOutcome>> {
        let Some(existing) = self.repo.find_submission(id).await? else {
            return Ok(None);
        };

        let catalog = self.status_catalog().await?;
        let awaiting_approval = catalog.is_awaiting_approval(update.status_id);

        let now = Utc::now();
        let updated = apply_update(existing, &update, now);
        self.repo.update_submission(updated).await?;

        metrics::record_submission(if update.make_inactive {
            "deactivated"
        } else {
            "status_changed"
        });

        let view = self.view_of(id).await?;
        Ok(Some(UpdateOutcome {
            view,
            awaiting_approval,
        }))
    }

    /// Unconditional hard delete; bypasses transition validation
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let existed = self.repo.delete_submission(id).await?;
        if existed {
            info!(submission_id = id, "Submission deleted");
        }
        Ok(existed)
    }

    async fn view_of(&self, id: i32) -> Result<SubmissionView> {
        self.repo
            .find_submission_view(id)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Submission {} vanished after write", id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn status(id: i32, display_order: i32, name: &str) -> SubmissionStatus {
        let now = Utc::now().into();
        SubmissionStatus {
            id,
            status_name: name.to_string(),
            status_description: None,
            display_order,
            created_date: now,
            last_modified_date: now,
        }
    }

    fn submission(status_id: i32) -> Submission {
        let created = Utc::now() - Duration::hours(1);
        Submission {
            id: 7,
            user_id: 42,
            status_id,
            is_active: true,
            reason: Some(String::new()),
            submission_date: created.into(),
            last_modified: created.into(),
            shipment_date: None,
        }
    }

    #[test]
    fn test_initial_status_is_minimum_display_order() {
        // Insertion order and id order both disagree with display order
        let statuses = vec![
            status(3, 5, "Approved"),
            status(1, 1, "Waiting for Approval"),
            status(2, 10, "Shipped"),
        ];

        let catalog = StatusCatalog::new(statuses);
        assert_eq!(catalog.initial().unwrap().id, 1);
    }

    #[test]
    fn test_empty_catalog_is_configuration_error() {
        let catalog = StatusCatalog::new(vec![]);

        match catalog.initial() {
            Err(AppError::Configuration { .. }) => {}
            other => panic!("expected configuration error, got {:?}", other.map(|s| s.id)),
        }
    }

    #[test]
    fn test_awaiting_approval_resolved_by_name() {
        let catalog = StatusCatalog::new(vec![
            status(5, 2, "Approved"),
            status(9, 1, "WAITING FOR APPROVAL"),
        ]);

        assert_eq!(catalog.awaiting_approval_id(), Some(9));
        assert!(catalog.is_awaiting_approval(9));
        assert!(!catalog.is_awaiting_approval(5));
        assert!(!catalog.is_awaiting_approval(0));
    }

    #[test]
    fn test_awaiting_approval_absent_from_catalog() {
        let catalog = StatusCatalog::new(vec![status(5, 2, "Approved")]);
        assert_eq!(catalog.awaiting_approval_id(), None);
        assert!(!catalog.is_awaiting_approval(1));
    }

    #[test]
    fn test_make_inactive_with_zero_sentinel_keeps_status() {
        let update = UpdateSubmission {
            status_id: 0,
            make_inactive: true,
            reason: Some("changed mind".into()),
            shipment_date: None,
        };

        let result = apply_update(submission(1), &update, Utc::now());

        assert_eq!(result.status_id, 1);
        assert!(!result.is_active);
        assert_eq!(result.reason.as_deref(), Some("changed mind"));
    }

    #[test]
    fn test_make_inactive_with_status_updates_it() {
        let update = UpdateSubmission {
            status_id: 4,
            make_inactive: true,
            reason: None,
            shipment_date: None,
        };

        let result = apply_update(submission(1), &update, Utc::now());

        assert_eq!(result.status_id, 4);
        assert!(!result.is_active);
        // Reason recorded as given, even absent
        assert_eq!(result.reason, None);
    }

    #[test]
    fn test_active_branch_overwrites_status_unconditionally() {
        let update = UpdateSubmission {
            status_id: 0,
            make_inactive: false,
            reason: None,
            shipment_date: None,
        };

        let result = apply_update(submission(3), &update, Utc::now());

        // The active branch has no zero-sentinel guard
        assert_eq!(result.status_id, 0);
        assert!(result.is_active);
    }

    #[test]
    fn test_shipment_date_set_independently() {
        let shipped = Utc::now();
        let update = UpdateSubmission {
            status_id: 2,
            make_inactive: false,
            reason: None,
            shipment_date: Some(shipped),
        };

        let result = apply_update(submission(1), &update, Utc::now());
        assert_eq!(result.shipment_date, Some(shipped.into()));

        let inactive_update = UpdateSubmission {
            make_inactive: true,
            shipment_date: Some(shipped),
            ..Default::default()
        };
        let result = apply_update(submission(1), &inactive_update, Utc::now());
        assert_eq!(result.shipment_date, Some(shipped.into()));
    }

    #[test]
    fn test_last_modified_is_monotonic() {
        let now = Utc::now();
        let update = UpdateSubmission {
            status_id: 2,
            ..Default::default()
        };

        let before = submission(1);
        let submitted = before.submission_date;
        let result = apply_update(before, &update, now);

        assert!(result.last_modified >= submitted);
        assert_eq!(result.last_modified, Into::<DateTime<chrono::FixedOffset>>::into(now));
    }
}
