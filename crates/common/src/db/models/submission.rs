//! Wish list submission entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wish_list_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub status_id: i32,

    pub is_active: bool,

    /// Populated only when the submission is deactivated
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,

    pub submission_date: DateTimeWithTimeZone,

    pub last_modified: DateTimeWithTimeZone,

    pub shipment_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::submission_status::Entity",
        from = "Column::StatusId",
        to = "super::submission_status::Column::Id"
    )]
    Status,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::submission_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
