//! Submission status reference entity
//!
//! Effectively static reference data: loaded once, cached for 24 hours,
//! managed out-of-band. The status with the minimum display order is the
//! initial status for every new submission.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wish_list_submission_statuses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub status_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub status_description: Option<String>,

    pub display_order: i32,

    pub created_date: DateTimeWithTimeZone,

    pub last_modified_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
