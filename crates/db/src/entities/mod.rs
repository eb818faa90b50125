//! Database entities.

#![allow(missing_docs)]

pub mod item_like;
pub mod notification;
pub mod shot;
pub mod tutorial;
pub mod user;

pub use item_like::Entity as ItemLike;
pub use notification::Entity as Notification;
pub use shot::Entity as Shot;
pub use tutorial::Entity as Tutorial;
pub use user::Entity as User;
