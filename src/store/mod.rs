//! Storage boundary.
//!
//! The document database lives behind a driver; this module defines that
//! boundary as the [`DocumentStore`] trait.
//! [`MemoryStore`] is the in-process implementation used by tests and local
//! runs. Known failure shapes surface as [`StoreError`] and are translated
//! by the error layer before reaching clients.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    Difficulty, GuideProfile, Review, ReviewUpdate, Tour, TourUpdate, User, UserUpdate,
};

pub mod memory;
pub mod query;

pub use memory::MemoryStore;
pub use query::TourQuery;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure shapes the storage layer can produce.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// An id that does not parse as a document identifier.
    #[error("invalid identifier: {0}")]
    MalformedId(String),

    /// A write collided with a unique field.
    #[error("duplicate value for unique field {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// No document matched the identifier.
    #[error("no {resource} found")]
    NotFound { resource: &'static str },

    /// Driver-level failure.
    #[error("storage failure: {0}")]
    Internal(String),
}

/// A tour with its references resolved, for the view layer.
#[derive(Debug, Clone)]
pub struct TourPage {
    pub tour: Tour,
    pub guides: Vec<GuideProfile>,
    pub reviews: Vec<Review>,
}

/// Aggregated statistics per difficulty level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourStats {
    pub difficulty: Difficulty,
    pub num_tours: usize,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// The driver boundary: every persistence operation the backend needs.
///
/// Read-family tour operations take a [`TourQuery`]; the query carries the
/// default scoping (secret exclusion, guide resolution) explicitly.
pub trait DocumentStore: Send + Sync {
    // Tours ------------------------------------------------------------

    /// Inserts a tour built by [`Tour::from_new`]; enforces name uniqueness.
    fn insert_tour(&self, tour: Tour) -> StoreResult<Tour>;

    /// Runs a list query, returning projected documents.
    fn query_tours(&self, query: &TourQuery) -> StoreResult<Vec<Value>>;

    /// Fetches one tour by id through the standard query path.
    fn find_tour(&self, id: &str, query: &TourQuery) -> StoreResult<Value>;

    /// Applies a normalized patch. Secret tours are invisible to this path
    /// like every other find-family operation.
    fn update_tour(&self, id: &str, patch: TourUpdate) -> StoreResult<Value>;

    /// Deletes a tour. Reviews referencing it are left in place.
    fn delete_tour(&self, id: &str) -> StoreResult<()>;

    /// Difficulty-level aggregation over non-secret tours.
    fn tour_stats(&self) -> StoreResult<Vec<TourStats>>;

    /// Typed lookup by slug for the view layer.
    fn find_tour_page(&self, slug: &str) -> StoreResult<TourPage>;

    // Users ------------------------------------------------------------

    fn insert_user(&self, user: User) -> StoreResult<User>;
    fn list_users(&self) -> StoreResult<Vec<User>>;
    fn find_user(&self, id: &str) -> StoreResult<User>;
    fn update_user(&self, id: &str, patch: UserUpdate) -> StoreResult<User>;
    fn delete_user(&self, id: &str) -> StoreResult<()>;

    // Reviews ----------------------------------------------------------

    fn insert_review(&self, review: Review) -> StoreResult<Review>;
    /// Lists reviews, optionally scoped to one tour.
    fn list_reviews(&self, tour: Option<uuid::Uuid>) -> StoreResult<Vec<Review>>;
    fn find_review(&self, id: &str) -> StoreResult<Review>;
    fn update_review(&self, id: &str, patch: ReviewUpdate) -> StoreResult<Review>;
    fn delete_review(&self, id: &str) -> StoreResult<()>;
}
