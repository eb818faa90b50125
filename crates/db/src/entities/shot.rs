//! Shot entity - an uploaded photo of a golf shot with its playing conditions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Compass point used for wind direction and flag position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum Compass {
    #[sea_orm(string_value = "N")]
    N,
    #[sea_orm(string_value = "S")]
    S,
    #[sea_orm(string_value = "E")]
    E,
    #[sea_orm(string_value = "W")]
    W,
    #[sea_orm(string_value = "NE")]
    NE,
    #[sea_orm(string_value = "SE")]
    SE,
    #[sea_orm(string_value = "SW")]
    SW,
    #[sea_orm(string_value = "NW")]
    NW,
    #[sea_orm(string_value = "Center")]
    Center,
}

impl Compass {
    /// Display label, matching the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::S => "S",
            Self::E => "E",
            Self::W => "W",
            Self::NE => "NE",
            Self::SE => "SE",
            Self::SW => "SW",
            Self::NW => "NW",
            Self::Center => "Center",
        }
    }
}

/// Wind speed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum WindUnit {
    #[sea_orm(string_value = "MPH")]
    #[serde(rename = "MPH")]
    Mph,
    #[sea_orm(string_value = "KM/H")]
    #[serde(rename = "KM/H")]
    Kmh,
    #[sea_orm(string_value = "m/s")]
    #[serde(rename = "m/s")]
    Ms,
}

impl WindUnit {
    /// Largest wind speed the game allows in this unit.
    #[must_use]
    pub const fn max_speed(self) -> i32 {
        match self {
            Self::Mph => 33,
            Self::Kmh => 54,
            Self::Ms => 15,
        }
    }

    /// Display label, matching the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mph => "MPH",
            Self::Kmh => "KM/H",
            Self::Ms => "m/s",
        }
    }
}

/// Shot distance unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum DistanceUnit {
    #[sea_orm(string_value = "yds")]
    #[serde(rename = "yds")]
    Yards,
    #[sea_orm(string_value = "m")]
    #[serde(rename = "m")]
    Meters,
}

impl DistanceUnit {
    /// Display label, matching the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yards => "yds",
            Self::Meters => "m",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shot")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Uploader.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Title composed from the playing conditions.
    pub title: String,

    /// Storage key of the image file.
    pub file_key: String,

    /// Optional link to a video of the shot.
    #[sea_orm(nullable)]
    pub video_link: Option<String>,

    pub hole_number: i32,
    pub wind_speed: i32,
    pub wind_unit: WindUnit,
    pub wind_direction: Compass,
    pub flag_position: Compass,
    pub shot_distance: i32,
    pub distance_unit: DistanceUnit,

    /// Number of likes. Only the like ledger writes this column.
    #[sea_orm(default_value = 0)]
    pub like_count: i32,

    /// Visible in the gallery once a moderator approves it.
    #[sea_orm(default_value = false)]
    pub approved: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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
