//! User entity
//!
//! Read-only from this core's view: user records are managed elsewhere and
//! consumed here for submission views and notification recipient resolution.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub username: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    pub is_admin: bool,

    #[sea_orm(column_type = "Text")]
    pub email: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub parent_email1: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub parent_email2: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub parent_phone1: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub parent_phone2: Option<String>,

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
