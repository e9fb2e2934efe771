//! Document models and their lifecycle hooks.
//!
//! Hooks are explicit: creation payloads pass through `from_new`
//! constructors (validation, slug derivation, normalization) and patches
//! through `normalized()` before they ever reach the store.

pub mod review;
pub mod slug;
pub mod tour;
pub mod user;
pub mod validate;

pub use review::{NewReview, Review, ReviewUpdate};
pub use tour::{Difficulty, GeoPoint, NewTour, Tour, TourStop, TourUpdate};
pub use user::{GuideProfile, NewUser, Role, User, UserUpdate};
pub use validate::FieldError;
