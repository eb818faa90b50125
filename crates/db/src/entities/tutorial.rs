//! Tutorial entity - a categorized link to an instructional video.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tutorial")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Submitter.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    pub video_link: String,

    #[sea_orm(indexed)]
    pub category: String,

    /// Number of likes. Only the like ledger writes this column.
    #[sea_orm(default_value = 0)]
    pub like_count: i32,

    #[sea_orm(default_value = false)]
    pub approved: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
