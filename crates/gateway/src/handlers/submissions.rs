//! Submission workflow handlers
//!
//! Create and update trigger the approval notification fan-out when the
//! submission lands in the awaiting-approval stage; the decision is made by
//! the workflow service against reference data, never by comparing status
//! ids here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use wishbox_common::{
    db::Repository,
    errors::{AppError, Result},
    notify::ApprovalNotifier,
    submissions::{SubmissionService, UpdateSubmission},
    SubmissionView,
};

/// Request to create a new submission
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,
}

/// Request to update a submission's workflow state
#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionRequest {
    #[serde(default)]
    pub status_id: i32,

    #[serde(default)]
    pub make_inactive: bool,

    pub reason: Option<String>,

    pub shipment_date: Option<DateTime<Utc>>,
}

impl From<UpdateSubmissionRequest> for UpdateSubmission {
    fn from(request: UpdateSubmissionRequest) -> Self {
        UpdateSubmission {
            status_id: request.status_id,
            make_inactive: request.make_inactive,
            reason: request.reason,
            shipment_date: request.shipment_date,
        }
    }
}

/// Submission view response
#[derive(Serialize)]
pub struct SubmissionResponse {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub status_id: i32,
    pub status_name: String,
    pub is_active: bool,
    pub reason: String,
    pub submission_date: String,
    pub last_modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment_date: Option<String>,
}

impl From<SubmissionView> for SubmissionResponse {
    fn from(view: SubmissionView) -> Self {
        Self {
            id: view.id,
            user_id: view.user_id,
            user_name: view.user_name,
            status_id: view.status_id,
            status_name: view.status_name,
            is_active: view.is_active,
            reason: view.reason.unwrap_or_default(),
            submission_date: view.submission_date.to_rfc3339(),
            last_modified: view.last_modified.to_rfc3339(),
            shipment_date: view.shipment_date.map(|d| d.to_rfc3339()),
        }
    }
}

fn submission_service(state: &AppState) -> SubmissionService {
    SubmissionService::new(Repository::new(state.db.clone()), state.cache.clone())
}

fn approval_notifier(state: &AppState) -> ApprovalNotifier {
    ApprovalNotifier::new(
        Repository::new(state.db.clone()),
        state.notifier.clone(),
        state.config.notifications.clone(),
    )
}

/// List all active submissions
pub async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>> {
    let submissions = submission_service(&state).list_active().await?;
    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}

/// Get one submission
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>> {
    let submission = submission_service(&state)
        .get(id)
        .await?
        .ok_or(AppError::SubmissionNotFound { id })?;

    Ok(Json(submission.into()))
}

/// List one user's submissions, active or not
pub async fn list_user_submissions(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<SubmissionResponse>>> {
    let submissions = submission_service(&state).list_by_user(user_id).await?;
    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}

/// Create a submission and request approval
pub async fn create_submission(
    State(state): State<AppState>,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let submission = submission_service(&state).create(request.user_id).await?;

    approval_notifier(&state)
        .notify_approval_needed(submission.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(submission.into())))
}

/// Update a submission's workflow state
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateSubmissionRequest>,
) -> Result<Json<SubmissionResponse>> {
    let outcome = submission_service(&state)
        .update(id, request.into())
        .await?
        .ok_or(AppError::SubmissionNotFound { id })?;

    if outcome.awaiting_approval {
        approval_notifier(&state)
            .notify_approval_needed(outcome.view.user_id)
            .await?;
    }

    Ok(Json(outcome.view.into()))
}

/// Delete a submission
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let existed = submission_service(&state).delete(id).await?;
    if !existed {
        return Err(AppError::SubmissionNotFound { id });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_defaults() {
        // Omitted fields fall back to the workflow's no-op values
        let request: UpdateSubmissionRequest =
            serde_json::from_str(r#"{"reason": "changed mind"}"#).unwrap();

        assert_eq!(request.status_id, 0);
        assert!(!request.make_inactive);
        assert_eq!(request.reason.as_deref(), Some("changed mind"));
        assert!(request.shipment_date.is_none());
    }

    #[test]
    fn test_create_request_validation() {
        let request = CreateSubmissionRequest { user_id: 0 };
        assert!(request.validate().is_err());

        let request = CreateSubmissionRequest { user_id: 42 };
        assert!(request.validate().is_ok());
    }
}
