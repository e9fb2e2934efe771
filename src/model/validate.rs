//! Document validators for the tour model.
//!
//! Validators are pure functions over an immutable snapshot of the candidate
//! document. They return either ok or the full list of field errors, and are
//! invoked explicitly from the insert/update code paths; nothing dispatches
//! them implicitly.

use super::tour::{NewTour, TourUpdate};

/// Minimum tour name length.
pub const NAME_MIN: usize = 10;

/// Maximum tour name length.
pub const NAME_MAX: usize = 40;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Result of running a validator: ok, or every field error found.
pub type ValidationResult = Result<(), Vec<FieldError>>;

/// Rounds a rating to one decimal place.
///
/// Applied on every ratingsAverage write regardless of entry point, so the
/// stored value always equals `round(input * 10) / 10`.
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Validates a full document at creation time.
///
/// This is the only place the priceDiscount comparison runs; partial updates
/// do not re-evaluate it (see [`validate_tour_update`]).
pub fn validate_new_tour(tour: &NewTour) -> ValidationResult {
    let mut errors = Vec::new();

    check_name(tour.name.trim(), &mut errors);
    check_rating(round_rating(tour.ratings_average), &mut errors);

    if let Some(discount) = tour.price_discount {
        if discount >= tour.price {
            errors.push(FieldError::new(
                "priceDiscount",
                format!("Discount price ({discount}) must be below regular price."),
            ));
        }
    }

    if tour.summary.trim().is_empty() {
        errors.push(FieldError::new("summary", "Tour must have a summary."));
    }
    if tour.image_cover.trim().is_empty() {
        errors.push(FieldError::new(
            "imageCover",
            "Tour must have a cover image.",
        ));
    }

    finish(errors)
}

/// Validates the fields present in a partial update.
///
/// The priceDiscount-below-price comparison is intentionally absent here:
/// the original system only evaluates it in document-creation context, and
/// that creation-only scope is preserved as observable API behavior.
pub fn validate_tour_update(patch: &TourUpdate) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(name) = &patch.name {
        check_name(name.trim(), &mut errors);
    }
    if let Some(rating) = patch.ratings_average {
        check_rating(round_rating(rating), &mut errors);
    }
    if let Some(summary) = &patch.summary {
        if summary.trim().is_empty() {
            errors.push(FieldError::new("summary", "Tour must have a summary."));
        }
    }
    if let Some(cover) = &patch.image_cover {
        if cover.trim().is_empty() {
            errors.push(FieldError::new(
                "imageCover",
                "Tour must have a cover image.",
            ));
        }
    }

    finish(errors)
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let len = name.chars().count();
    if len < NAME_MIN || len > NAME_MAX {
        errors.push(FieldError::new(
            "name",
            format!("Tour name must have between {NAME_MIN} and {NAME_MAX} characters."),
        ));
    }
}

fn check_rating(rating: f64, errors: &mut Vec<FieldError>) {
    if !(1.0..=5.0).contains(&rating) {
        errors.push(FieldError::new(
            "ratingsAverage",
            "Rating must be between 1.0 and 5.0.",
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
