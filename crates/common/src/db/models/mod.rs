//! SeaORM entity models
//!
//! Database entities for the Wishbox submission workflow

mod setting;
mod submission;
mod submission_status;
mod user;

pub use submission::{
    ActiveModel as SubmissionActiveModel, Column as SubmissionColumn, Entity as SubmissionEntity,
    Model as Submission, Relation as SubmissionRelation,
};

pub use submission_status::{
    ActiveModel as SubmissionStatusActiveModel, Column as SubmissionStatusColumn,
    Entity as SubmissionStatusEntity, Model as SubmissionStatus,
};

pub use setting::{
    ActiveModel as SettingActiveModel, Column as SettingColumn, Entity as SettingEntity,
    Model as Setting,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};
