//! Review documents.
//!
//! A review references one tour and one user by id. Both references are
//! weak: deleting a tour leaves its reviews in place (orphaning policy,
//! see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate::FieldError;

/// A stored review document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub tour: Uuid,
    pub user: Uuid,
}

impl Review {
    /// Builds a storable review from a creation payload.
    pub fn from_new(new: NewReview) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let review = new.review.trim().to_string();
        if review.is_empty() {
            errors.push(FieldError::new("review", "Review cannot be empty."));
        }
        if !(1.0..=5.0).contains(&new.rating) {
            errors.push(FieldError::new(
                "rating",
                "Rating must be between 1.0 and 5.0.",
            ));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            review,
            rating: new.rating,
            created_at: Utc::now(),
            tour: new.tour,
            user: new.user,
        })
    }
}

/// Payload for creating a review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub review: String,
    pub rating: f64,
    pub tour: Uuid,
    pub user: Uuid,
}

/// Partial update for a review.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub review: Option<String>,
    pub rating: Option<f64>,
}

impl ReviewUpdate {
    /// Validates the fields present in the patch.
    pub fn normalized(self) -> Result<Self, Vec<FieldError>> {
        if let Some(rating) = self.rating {
            if !(1.0..=5.0).contains(&rating) {
                return Err(vec![FieldError::new(
                    "rating",
                    "Rating must be between 1.0 and 5.0.",
                )]);
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review() -> NewReview {
        NewReview {
            review: "Loved every minute of it".to_string(),
            rating: 4.0,
            tour: Uuid::new_v4(),
            user: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_from_new_accepts_valid() {
        assert!(Review::from_new(new_review()).is_ok());
    }

    #[test]
    fn test_rating_bounds() {
        let mut payload = new_review();
        payload.rating = 0.5;
        assert!(Review::from_new(payload.clone()).is_err());
        payload.rating = 5.5;
        assert!(Review::from_new(payload).is_err());
    }

    #[test]
    fn test_empty_review_rejected() {
        let mut payload = new_review();
        payload.review = "   ".to_string();
        assert!(Review::from_new(payload).is_err());
    }

    #[test]
    fn test_update_validates_rating() {
        let patch = ReviewUpdate {
            rating: Some(6.0),
            ..ReviewUpdate::default()
        };
        assert!(patch.normalized().is_err());
    }
}
