//! Tour model invariants: slug derivation, ratings normalization, the
//! creation-only discount validator and default query scoping.

use serde_json::json;

use tourbase::model::slug::slugify;
use tourbase::model::validate::round_rating;
use tourbase::model::{NewTour, Tour, TourUpdate};
use tourbase::store::{DocumentStore, MemoryStore, TourQuery};

fn payload(name: &str) -> NewTour {
    serde_json::from_value(json!({
        "name": name,
        "duration": 7,
        "maxGroupSize": 15,
        "difficulty": "medium",
        "price": 497.0,
        "summary": "Breathtaking hike through quiet forest trails",
        "imageCover": "tour-1-cover.jpg"
    }))
    .unwrap()
}

#[test]
fn slug_is_deterministic_and_idempotent() {
    let a = slugify("The Forest Hiker");
    let b = slugify("The Forest Hiker");
    assert_eq!(a, b);
    assert_eq!(slugify(&a), a);
    assert_eq!(a, "the-forest-hiker");
}

#[test]
fn slug_derived_on_every_insert() {
    let tour = Tour::from_new(payload("The  Snow   Adventurer")).unwrap();
    assert_eq!(tour.slug, "the-snow-adventurer");
}

#[test]
fn ratings_writes_are_normalized_everywhere() {
    // Insert path.
    let mut create = payload("The Forest Hiker");
    create.ratings_average = 4.57;
    let tour = Tour::from_new(create).unwrap();
    assert_eq!(tour.ratings_average, round_rating(4.57));
    assert_eq!(tour.ratings_average, 4.6);

    // Update path, through the store.
    let store = MemoryStore::new();
    let tour = store.insert_tour(tour).unwrap();
    let patch: TourUpdate = serde_json::from_value(json!({"ratingsAverage": 3.14159})).unwrap();
    let doc = store
        .update_tour(&tour.id.to_string(), patch.normalized().unwrap())
        .unwrap();
    assert_eq!(doc["ratingsAverage"], 3.1);
}

#[test]
fn ratings_outside_range_rejected() {
    let mut create = payload("The Forest Hiker");
    create.ratings_average = 5.2;
    assert!(Tour::from_new(create).is_err());

    let patch: TourUpdate = serde_json::from_value(json!({"ratingsAverage": 0.4})).unwrap();
    assert!(patch.normalized().is_err());
}

#[test]
fn discount_enforced_at_creation_only() {
    // Creation: rejected when discount >= price.
    let mut create = payload("The Forest Hiker");
    create.price_discount = Some(497.0);
    assert!(Tour::from_new(create).is_err());

    let mut create = payload("The Forest Hiker");
    create.price_discount = Some(450.0);
    let tour = Tour::from_new(create).unwrap();

    // Update: the same violation passes, preserved quirk.
    let store = MemoryStore::new();
    let tour = store.insert_tour(tour).unwrap();
    let patch: TourUpdate = serde_json::from_value(json!({"priceDiscount": 900.0})).unwrap();
    let doc = store
        .update_tour(&tour.id.to_string(), patch.normalized().unwrap())
        .unwrap();
    assert_eq!(doc["priceDiscount"], 900.0);
    assert_eq!(doc["price"], 497.0);
}

#[test]
fn standard_reads_never_return_secret_tours() {
    let store = MemoryStore::new();
    store.insert_tour(Tour::from_new(payload("The Forest Hiker")).unwrap()).unwrap();

    let mut secret = payload("The Hidden Valley");
    secret.secret_tour = true;
    store.insert_tour(Tour::from_new(secret).unwrap()).unwrap();

    let docs = store.query_tours(&TourQuery::new()).unwrap();
    assert_eq!(docs.len(), 1);
    assert!(docs.iter().all(|d| d["secretTour"] == false));

    let all = store.query_tours(&TourQuery::new().include_secret()).unwrap();
    assert_eq!(all.len(), 2);
}
