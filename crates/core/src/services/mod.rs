//! Business logic services.

#![allow(missing_docs)]

pub mod like_ledger;
pub mod moderation;
pub mod notification;
pub mod shot;
pub mod tutorial;
pub mod user;

pub use like_ledger::LikeLedger;
pub use moderation::{ModerationQueue, ModerationService, RejectInput};
pub use notification::{NotificationResponse, NotificationService};
pub use shot::{GALLERY_PAGE_SIZE, GalleryPage, ImageUpload, ShotDetails, ShotResponse, ShotService};
pub use tutorial::{CreateTutorialInput, TutorialResponse, TutorialService};
pub use user::{RegisterInput, SignInInput, SignedIn, UserService};
