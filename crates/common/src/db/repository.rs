//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling. Submission reads always materialize
//! the joined user and status display names into [`SubmissionView`];
//! raw foreign keys are never returned alone.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QuerySelect, RelationTrait, Select, Set, Unchanged,
};
use serde::{Deserialize, Serialize};

/// Joined projection of a submission with user and status display data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct SubmissionView {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub status_id: i32,
    pub status_name: String,
    pub is_active: bool,
    pub reason: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub shipment_date: Option<DateTime<Utc>>,
}

/// Projection of a setting row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingView {
    pub name: String,
    pub value: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Submission Operations
    // ========================================================================

    /// Base query joining submissions with user and status display names
    fn submission_view_query() -> Select<SubmissionEntity> {
        SubmissionEntity::find()
            .column_as(UserColumn::Username, "user_name")
            .column_as(SubmissionStatusColumn::StatusName, "status_name")
            .join(JoinType::InnerJoin, SubmissionRelation::User.def())
            .join(JoinType::InnerJoin, SubmissionRelation::Status.def())
    }

    /// List submissions with the active flag set, joined with user and status
    pub async fn list_active_submissions(&self) -> Result<Vec<SubmissionView>> {
        Self::submission_view_query()
            .filter(SubmissionColumn::IsActive.eq(true))
            .into_model::<SubmissionView>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a submission by ID as a joined view
    pub async fn find_submission_view(&self, id: i32) -> Result<Option<SubmissionView>> {
        Self::submission_view_query()
            .filter(SubmissionColumn::Id.eq(id))
            .into_model::<SubmissionView>()
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List one user's submissions, active or not, as joined views
    pub async fn list_submissions_by_user(&self, user_id: i32) -> Result<Vec<SubmissionView>> {
        Self::submission_view_query()
            .filter(SubmissionColumn::UserId.eq(user_id))
            .into_model::<SubmissionView>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a raw submission row (for the update path)
    pub async fn find_submission(&self, id: i32) -> Result<Option<Submission>> {
        SubmissionEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a new submission
    pub async fn insert_submission(
        &self,
        user_id: i32,
        status_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        let submission = SubmissionActiveModel {
            user_id: Set(user_id),
            status_id: Set(status_id),
            is_active: Set(true),
            reason: Set(Some(String::new())),
            submission_date: Set(now.into()),
            last_modified: Set(now.into()),
            shipment_date: Set(None),
            ..Default::default()
        };

        submission.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Write back a mutated submission row
    pub async fn update_submission(&self, submission: Submission) -> Result<Submission> {
        let active = SubmissionActiveModel {
            id: Unchanged(submission.id),
            user_id: Set(submission.user_id),
            status_id: Set(submission.status_id),
            is_active: Set(submission.is_active),
            reason: Set(submission.reason),
            submission_date: Set(submission.submission_date),
            last_modified: Set(submission.last_modified),
            shipment_date: Set(submission.shipment_date),
        };

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete a submission by ID; returns whether a row existed
    pub async fn delete_submission(&self, id: i32) -> Result<bool> {
        let result = SubmissionEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Status Operations (read-only reference data)
    // ========================================================================

    /// Load the full submission status list
    pub async fn load_statuses(&self) -> Result<Vec<SubmissionStatus>> {
        SubmissionStatusEntity::find()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Setting Operations (read-only reference data)
    // ========================================================================

    /// Find a setting by its normalized (trimmed, lowercased) name
    pub async fn find_setting_by_name(&self, normalized_name: &str) -> Result<Option<Setting>> {
        SettingEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(SettingColumn::Name)))
                    .eq(normalized_name.to_string()),
            )
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Load all settings
    pub async fn list_settings(&self) -> Result<Vec<Setting>> {
        SettingEntity::find()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // User Operations (read-only, recipient resolution)
    // ========================================================================

    /// Find a user by ID
    pub async fn find_user(&self, id: i32) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Email addresses of all admin users
    pub async fn admin_emails(&self) -> Result<Vec<String>> {
        UserEntity::find()
            .select_only()
            .column(UserColumn::Email)
            .filter(UserColumn::IsAdmin.eq(true))
            .into_tuple::<String>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}
