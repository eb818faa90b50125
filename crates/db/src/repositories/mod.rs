//! Repository layer for database operations.

mod like;
mod notification;
mod shot;
mod tutorial;
mod user;

pub use like::LikeRepository;
pub use notification::NotificationRepository;
pub use shot::{ShotRepository, ShotSearch};
pub use tutorial::TutorialRepository;
pub use user::UserRepository;
