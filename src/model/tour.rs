//! The tour document: the primary bookable-product record.
//!
//! Writes flow through typed structs so the lifecycle hooks (slug
//! derivation, validation, ratings normalization) run in one place;
//! reads are projected to JSON documents by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug::slugify;
use super::validate::{self, FieldError};

/// Tour difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

/// A GeoJSON-style point with optional display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default)]
    pub kind: PointKind,
    /// Longitude, latitude.
    pub coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Geometry tag; only points are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    #[default]
    Point,
}

/// A stop on the tour itinerary: a point tagged with the tour day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourStop {
    #[serde(flatten)]
    pub point: GeoPoint,
    pub day: u32,
}

/// A stored tour document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    /// Derived from `name` at creation; never independently settable.
    pub slug: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    pub ratings_average: f64,
    pub ratings_quantity: u64,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image_cover: String,
    pub images: Vec<String>,
    /// Excluded from the default read projection by the query path.
    pub created_at: DateTime<Utc>,
    pub start_dates: Vec<DateTime<Utc>>,
    pub secret_tour: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_location: Option<GeoPoint>,
    pub locations: Vec<TourStop>,
    /// Weak references to User documents, resolved at query time.
    pub guides: Vec<Uuid>,
}

impl Tour {
    /// Builds a storable document from a creation payload.
    ///
    /// This is the pre-create hook chain: full validation, slug derivation
    /// and ratings normalization, in that order. The returned document is
    /// ready for the store, which only adds uniqueness enforcement.
    pub fn from_new(new: NewTour) -> Result<Self, Vec<FieldError>> {
        validate::validate_new_tour(&new)?;

        let name = new.name.trim().to_string();
        let slug = slugify(&name);

        Ok(Self {
            id: Uuid::new_v4(),
            slug,
            name,
            duration: new.duration,
            max_group_size: new.max_group_size,
            difficulty: new.difficulty,
            ratings_average: validate::round_rating(new.ratings_average),
            ratings_quantity: new.ratings_quantity,
            price: new.price,
            price_discount: new.price_discount,
            summary: new.summary.trim().to_string(),
            description: new.description.map(|d| d.trim().to_string()),
            image_cover: new.image_cover,
            images: new.images,
            created_at: Utc::now(),
            start_dates: new.start_dates,
            secret_tour: new.secret_tour,
            start_location: new.start_location,
            locations: new.locations,
            guides: new.guides,
        })
    }

    /// Computed at read time: tour length in weeks.
    pub fn duration_weeks(&self) -> f64 {
        f64::from(self.duration) / 7.0
    }
}

/// Payload for creating a tour.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTour {
    pub name: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    #[serde(default = "default_rating")]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: u64,
    pub price: f64,
    #[serde(default)]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    #[serde(default)]
    pub start_location: Option<GeoPoint>,
    #[serde(default)]
    pub locations: Vec<TourStop>,
    #[serde(default)]
    pub guides: Vec<Uuid>,
}

fn default_rating() -> f64 {
    4.5
}

/// Partial update for a tour. Absent fields are left untouched.
///
/// `slug` is not part of the patch surface, and the discount validator does
/// not run here (creation-only, preserved behavior).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourUpdate {
    pub name: Option<String>,
    pub duration: Option<u32>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<u64>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<GeoPoint>,
    pub locations: Option<Vec<TourStop>>,
    pub guides: Option<Vec<Uuid>>,
}

impl TourUpdate {
    /// Runs the update hook chain: per-field validation plus ratings
    /// normalization, returning the patch ready for the store.
    pub fn normalized(mut self) -> Result<Self, Vec<FieldError>> {
        validate::validate_tour_update(&self)?;

        if let Some(name) = self.name.take() {
            self.name = Some(name.trim().to_string());
        }
        if let Some(summary) = self.summary.take() {
            self.summary = Some(summary.trim().to_string());
        }
        if let Some(rating) = self.ratings_average {
            self.ratings_average = Some(validate::round_rating(rating));
        }

        Ok(self)
    }
}

#[cfg(test)]
pub mod test_fixtures {
    use super::*;

    /// A valid creation payload with the given name.
    pub fn new_tour(name: &str) -> NewTour {
        NewTour {
            name: name.to_string(),
            duration: 7,
            max_group_size: 15,
            difficulty: Difficulty::Medium,
            ratings_average: 4.5,
            ratings_quantity: 0,
            price: 497.0,
            price_discount: None,
            summary: "Breathtaking hike through quiet forest trails".to_string(),
            description: None,
            image_cover: "tour-1-cover.jpg".to_string(),
            images: Vec::new(),
            start_dates: Vec::new(),
            secret_tour: false,
            start_location: None,
            locations: Vec::new(),
            guides: Vec::new(),
        }
    }
}
