//! Item like entity - the durable fact that one user currently likes one item.
//!
//! A like points at either a shot or a tutorial through `(item_kind, item_id)`.
//! Because the target table depends on the kind there is no foreign key on
//! `item_id`; removing an item's likes is the like ledger's job.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a likeable item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[sea_orm(string_value = "shot")]
    Shot,
    #[sea_orm(string_value = "tutorial")]
    Tutorial,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shot => f.write_str("shot"),
            Self::Tutorial => f.write_str("tutorial"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who liked the item.
    #[sea_orm(indexed)]
    pub user_id: String,

    pub item_kind: ItemKind,

    #[sea_orm(indexed)]
    pub item_id: String,

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
