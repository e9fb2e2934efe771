//! In-memory implementation of the storage boundary.
//!
//! Backs tests and local runs. A production deployment replaces this with a
//! driver-backed implementation of [`DocumentStore`]; the read pipeline here
//! (scope filter, projection, field filters, sort, paginate, select) mirrors
//! what the driver would be asked to do.

use std::sync::RwLock;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::model::validate::round_rating;
use crate::model::{Difficulty, GuideProfile, Review, ReviewUpdate, Tour, TourUpdate, User, UserUpdate};

use super::query::{compare_values, FieldSelection, TourQuery};
use super::{DocumentStore, StoreError, StoreResult, TourPage, TourStats};

/// Process-local document store.
pub struct MemoryStore {
    tours: RwLock<Vec<Tour>>,
    users: RwLock<Vec<User>>,
    reviews: RwLock<Vec<Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tours: RwLock::new(Vec::new()),
            users: RwLock::new(Vec::new()),
            reviews: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Internal("lock poisoned".to_string())
}

fn internal(err: serde_json::Error) -> StoreError {
    StoreError::Internal(err.to_string())
}

/// Parses a path identifier; anything that is not a UUID is a malformed id.
fn parse_id(id: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| StoreError::MalformedId(id.to_string()))
}

/// Serializes one tour with its query-time joins and derived fields.
///
/// `createdAt` stays in the document at this stage so sorting can use it;
/// [`apply_selection`] removes it afterwards unless explicitly selected.
fn project_tour(
    tour: &Tour,
    query: &TourQuery,
    users: &[User],
    reviews: &[Review],
) -> StoreResult<Value> {
    let mut doc = serde_json::to_value(tour).map_err(internal)?;
    let obj = match doc.as_object_mut() {
        Some(obj) => obj,
        None => return Err(StoreError::Internal("tour is not an object".to_string())),
    };

    obj.insert("durationWeeks".to_string(), json!(tour.duration_weeks()));

    if query.guides_populated() {
        let profiles = tour
            .guides
            .iter()
            .filter_map(|guide_id| users.iter().find(|u| u.id == *guide_id))
            .map(|user| serde_json::to_value(GuideProfile::from(user)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        obj.insert("guides".to_string(), Value::Array(profiles));
    }

    if query.reviews_included() {
        let joined = reviews
            .iter()
            .filter(|r| r.tour == tour.id)
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        obj.insert("reviews".to_string(), Value::Array(joined));
    }

    Ok(doc)
}

/// Applies the default projection and any explicit field selection.
fn apply_selection(mut doc: Value, query: &TourQuery) -> Value {
    if let Some(obj) = doc.as_object_mut() {
        let created_selected = matches!(
            query.fields(),
            Some(FieldSelection::Include(fields)) if fields.iter().any(|f| f == "createdAt")
        );
        if !created_selected {
            obj.remove("createdAt");
        }

        match query.fields() {
            Some(FieldSelection::Include(fields)) => {
                obj.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
            }
            Some(FieldSelection::Exclude(fields)) => {
                obj.retain(|key, _| !fields.iter().any(|f| f == key));
            }
            None => {}
        }
    }
    doc
}

fn sort_documents(docs: &mut [Value], query: &TourQuery) {
    docs.sort_by(|a, b| {
        for key in query.sort() {
            let left = a.get(&key.field).unwrap_or(&Value::Null);
            let right = b.get(&key.field).unwrap_or(&Value::Null);
            let mut cmp = compare_values(left, right);
            if !key.ascending {
                cmp = -cmp;
            }
            if cmp < 0 {
                return std::cmp::Ordering::Less;
            }
            if cmp > 0 {
                return std::cmp::Ordering::Greater;
            }
        }
        std::cmp::Ordering::Equal
    });
}

impl DocumentStore for MemoryStore {
    fn insert_tour(&self, tour: Tour) -> StoreResult<Tour> {
        let mut tours = self.tours.write().map_err(poisoned)?;
        if tours.iter().any(|t| t.name == tour.name) {
            return Err(StoreError::Duplicate {
                field: "name",
                value: tour.name,
            });
        }
        tours.push(tour.clone());
        Ok(tour)
    }

    fn query_tours(&self, query: &TourQuery) -> StoreResult<Vec<Value>> {
        let tours = self.tours.read().map_err(poisoned)?;
        let users = self.users.read().map_err(poisoned)?;
        let reviews = self.reviews.read().map_err(poisoned)?;

        let mut docs = Vec::new();
        for tour in tours.iter() {
            if tour.secret_tour && !query.secret_included() {
                continue;
            }
            let doc = project_tour(tour, query, &users, &reviews)?;
            if query.filters().iter().all(|f| f.matches(&doc)) {
                docs.push(doc);
            }
        }

        sort_documents(&mut docs, query);

        Ok(docs
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .map(|doc| apply_selection(doc, query))
            .collect())
    }

    fn find_tour(&self, id: &str, query: &TourQuery) -> StoreResult<Value> {
        let tour_id = parse_id(id)?;
        let tours = self.tours.read().map_err(poisoned)?;
        let users = self.users.read().map_err(poisoned)?;
        let reviews = self.reviews.read().map_err(poisoned)?;

        let tour = tours
            .iter()
            .find(|t| t.id == tour_id && (query.secret_included() || !t.secret_tour))
            .ok_or(StoreError::NotFound { resource: "tour" })?;

        let doc = project_tour(tour, query, &users, &reviews)?;
        Ok(apply_selection(doc, query))
    }

    fn update_tour(&self, id: &str, patch: TourUpdate) -> StoreResult<Value> {
        let tour_id = parse_id(id)?;
        let mut tours = self.tours.write().map_err(poisoned)?;

        if let Some(name) = &patch.name {
            if tours.iter().any(|t| t.id != tour_id && &t.name == name) {
                return Err(StoreError::Duplicate {
                    field: "name",
                    value: name.clone(),
                });
            }
        }

        let index = tours
            .iter()
            .position(|t| t.id == tour_id && !t.secret_tour)
            .ok_or(StoreError::NotFound { resource: "tour" })?;
        let tour = &mut tours[index];

        if let Some(name) = patch.name {
            tour.name = name;
        }
        if let Some(duration) = patch.duration {
            tour.duration = duration;
        }
        if let Some(size) = patch.max_group_size {
            tour.max_group_size = size;
        }
        if let Some(difficulty) = patch.difficulty {
            tour.difficulty = difficulty;
        }
        if let Some(rating) = patch.ratings_average {
            tour.ratings_average = round_rating(rating);
        }
        if let Some(quantity) = patch.ratings_quantity {
            tour.ratings_quantity = quantity;
        }
        if let Some(price) = patch.price {
            tour.price = price;
        }
        if let Some(discount) = patch.price_discount {
            tour.price_discount = Some(discount);
        }
        if let Some(summary) = patch.summary {
            tour.summary = summary;
        }
        if let Some(description) = patch.description {
            tour.description = Some(description);
        }
        if let Some(cover) = patch.image_cover {
            tour.image_cover = cover;
        }
        if let Some(images) = patch.images {
            tour.images = images;
        }
        if let Some(dates) = patch.start_dates {
            tour.start_dates = dates;
        }
        if let Some(secret) = patch.secret_tour {
            tour.secret_tour = secret;
        }
        if let Some(location) = patch.start_location {
            tour.start_location = Some(location);
        }
        if let Some(locations) = patch.locations {
            tour.locations = locations;
        }
        if let Some(guides) = patch.guides {
            tour.guides = guides;
        }

        let tour = tours[index].clone();
        drop(tours);

        let users = self.users.read().map_err(poisoned)?;
        let reviews = self.reviews.read().map_err(poisoned)?;
        let query = TourQuery::new();
        let doc = project_tour(&tour, &query, &users, &reviews)?;
        Ok(apply_selection(doc, &query))
    }

    fn delete_tour(&self, id: &str) -> StoreResult<()> {
        let tour_id = parse_id(id)?;
        let mut tours = self.tours.write().map_err(poisoned)?;
        let index = tours
            .iter()
            .position(|t| t.id == tour_id && !t.secret_tour)
            .ok_or(StoreError::NotFound { resource: "tour" })?;
        tours.remove(index);
        // Reviews referencing the tour are orphaned on purpose.
        Ok(())
    }

    fn tour_stats(&self) -> StoreResult<Vec<TourStats>> {
        let tours = self.tours.read().map_err(poisoned)?;

        let mut stats = Vec::new();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Difficult] {
            let group: Vec<&Tour> = tours
                .iter()
                .filter(|t| !t.secret_tour && t.difficulty == difficulty)
                .collect();
            if group.is_empty() {
                continue;
            }

            let count = group.len() as f64;
            let avg_rating = group.iter().map(|t| t.ratings_average).sum::<f64>() / count;
            let avg_price = group.iter().map(|t| t.price).sum::<f64>() / count;
            let min_price = group.iter().map(|t| t.price).fold(f64::INFINITY, f64::min);
            let max_price = group
                .iter()
                .map(|t| t.price)
                .fold(f64::NEG_INFINITY, f64::max);

            stats.push(TourStats {
                difficulty,
                num_tours: group.len(),
                avg_rating: round_rating(avg_rating),
                avg_price: (avg_price * 100.0).round() / 100.0,
                min_price,
                max_price,
            });
        }

        Ok(stats)
    }

    fn find_tour_page(&self, slug: &str) -> StoreResult<TourPage> {
        let tours = self.tours.read().map_err(poisoned)?;
        let users = self.users.read().map_err(poisoned)?;
        let reviews = self.reviews.read().map_err(poisoned)?;

        let tour = tours
            .iter()
            .find(|t| t.slug == slug && !t.secret_tour)
            .ok_or(StoreError::NotFound { resource: "tour" })?;

        let guides = tour
            .guides
            .iter()
            .filter_map(|guide_id| users.iter().find(|u| u.id == *guide_id))
            .map(GuideProfile::from)
            .collect();
        let tour_reviews = reviews.iter().filter(|r| r.tour == tour.id).cloned().collect();

        Ok(TourPage {
            tour: tour.clone(),
            guides,
            reviews: tour_reviews,
        })
    }

    fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate {
                field: "email",
                value: user.email,
            });
        }
        users.push(user.clone());
        Ok(user)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.clone())
    }

    fn find_user(&self, id: &str) -> StoreResult<User> {
        let user_id = parse_id(id)?;
        let users = self.users.read().map_err(poisoned)?;
        users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound { resource: "user" })
    }

    fn update_user(&self, id: &str, patch: UserUpdate) -> StoreResult<User> {
        let user_id = parse_id(id)?;
        let mut users = self.users.write().map_err(poisoned)?;

        if let Some(email) = &patch.email {
            if users.iter().any(|u| u.id != user_id && &u.email == email) {
                return Err(StoreError::Duplicate {
                    field: "email",
                    value: email.clone(),
                });
            }
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::NotFound { resource: "user" })?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(photo) = patch.photo {
            user.photo = Some(photo);
        }
        user.version += 1;

        Ok(user.clone())
    }

    fn delete_user(&self, id: &str) -> StoreResult<()> {
        let user_id = parse_id(id)?;
        let mut users = self.users.write().map_err(poisoned)?;
        let index = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or(StoreError::NotFound { resource: "user" })?;
        users.remove(index);
        Ok(())
    }

    fn insert_review(&self, review: Review) -> StoreResult<Review> {
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        reviews.push(review.clone());
        Ok(review)
    }

    fn list_reviews(&self, tour: Option<Uuid>) -> StoreResult<Vec<Review>> {
        let reviews = self.reviews.read().map_err(poisoned)?;
        let mut listed: Vec<Review> = reviews
            .iter()
            .filter(|r| tour.map_or(true, |t| r.tour == t))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    fn find_review(&self, id: &str) -> StoreResult<Review> {
        let review_id = parse_id(id)?;
        let reviews = self.reviews.read().map_err(poisoned)?;
        reviews
            .iter()
            .find(|r| r.id == review_id)
            .cloned()
            .ok_or(StoreError::NotFound { resource: "review" })
    }

    fn update_review(&self, id: &str, patch: ReviewUpdate) -> StoreResult<Review> {
        let review_id = parse_id(id)?;
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        let review = reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or(StoreError::NotFound { resource: "review" })?;

        if let Some(text) = patch.review {
            review.review = text;
        }
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }

        Ok(review.clone())
    }

    fn delete_review(&self, id: &str) -> StoreResult<()> {
        let review_id = parse_id(id)?;
        let mut reviews = self.reviews.write().map_err(poisoned)?;
        let index = reviews
            .iter()
            .position(|r| r.id == review_id)
            .ok_or(StoreError::NotFound { resource: "review" })?;
        reviews.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tour::test_fixtures::new_tour;
    use crate::model::{NewReview, NewUser, Role};
    use crate::store::query::{FieldFilter, FilterOp, SortKey};

    fn store_with(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for name in names {
            let tour = Tour::from_new(new_tour(name)).unwrap();
            store.insert_tour(tour).unwrap();
        }
        store
    }

    fn insert_secret(store: &MemoryStore, name: &str) -> Tour {
        let mut payload = new_tour(name);
        payload.secret_tour = true;
        let tour = Tour::from_new(payload).unwrap();
        store.insert_tour(tour.clone()).unwrap();
        tour
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let store = store_with(&["The Forest Hiker"]);
        let tour = Tour::from_new(new_tour("The Forest Hiker")).unwrap();
        let err = store.insert_tour(tour).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "name", .. }));
    }

    #[test]
    fn test_query_excludes_secret_tours() {
        let store = store_with(&["The Forest Hiker"]);
        insert_secret(&store, "The Hidden Valley");

        let docs = store.query_tours(&TourQuery::new()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "The Forest Hiker");
    }

    #[test]
    fn test_include_secret_override() {
        let store = store_with(&["The Forest Hiker"]);
        insert_secret(&store, "The Hidden Valley");

        let docs = store
            .query_tours(&TourQuery::new().include_secret())
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_default_projection_hides_created_at() {
        let store = store_with(&["The Forest Hiker"]);
        let docs = store.query_tours(&TourQuery::new()).unwrap();
        assert!(docs[0].get("createdAt").is_none());
        assert!(docs[0].get("durationWeeks").is_some());
    }

    #[test]
    fn test_guides_resolved_with_projection() {
        let store = MemoryStore::new();
        let guide = User::from_new(NewUser {
            name: "Aarav Lund".to_string(),
            email: "aarav@example.com".to_string(),
            role: Role::Guide,
            photo: None,
        })
        .unwrap();
        let guide = store.insert_user(guide).unwrap();

        let mut payload = new_tour("The Forest Hiker");
        payload.guides = vec![guide.id];
        store.insert_tour(Tour::from_new(payload).unwrap()).unwrap();

        let docs = store.query_tours(&TourQuery::new()).unwrap();
        let guides = docs[0]["guides"].as_array().unwrap();
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0]["name"], "Aarav Lund");
        assert!(guides[0].get("passwordChangedAt").is_none());
    }

    #[test]
    fn test_filter_and_sort() {
        let store = MemoryStore::new();
        for (name, price) in [
            ("The Forest Hiker One", 400.0),
            ("The Forest Hiker Two", 200.0),
            ("The Forest Hiker Ten", 600.0),
        ] {
            let mut payload = new_tour(name);
            payload.price = price;
            store.insert_tour(Tour::from_new(payload).unwrap()).unwrap();
        }

        let query = TourQuery::new()
            .filter(FieldFilter::new("price", FilterOp::Gte, json!(300)))
            .sort_by(vec![SortKey {
                field: "price".to_string(),
                ascending: true,
            }]);
        let docs = store.query_tours(&query).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["price"], 400.0);
        assert_eq!(docs[1]["price"], 600.0);
    }

    #[test]
    fn test_find_tour_malformed_id() {
        let store = store_with(&[]);
        let err = store.find_tour("not-a-uuid", &TourQuery::new()).unwrap_err();
        assert!(matches!(err, StoreError::MalformedId(_)));
    }

    #[test]
    fn test_find_tour_joins_reviews_on_request() {
        let store = store_with(&["The Forest Hiker"]);
        let docs = store.query_tours(&TourQuery::new()).unwrap();
        let id = docs[0]["id"].as_str().unwrap().to_string();
        let tour_id = Uuid::parse_str(&id).unwrap();

        store
            .insert_review(
                Review::from_new(NewReview {
                    review: "Wonderful trip".to_string(),
                    rating: 5.0,
                    tour: tour_id,
                    user: Uuid::new_v4(),
                })
                .unwrap(),
            )
            .unwrap();

        let doc = store.find_tour(&id, &TourQuery::new().with_reviews()).unwrap();
        assert_eq!(doc["reviews"].as_array().unwrap().len(), 1);

        let plain = store.find_tour(&id, &TourQuery::new()).unwrap();
        assert!(plain.get("reviews").is_none());
    }

    #[test]
    fn test_update_does_not_rederive_slug() {
        let store = store_with(&["The Forest Hiker"]);
        let docs = store.query_tours(&TourQuery::new()).unwrap();
        let id = docs[0]["id"].as_str().unwrap().to_string();

        let patch = TourUpdate {
            name: Some("The Mountain Biker".to_string()),
            ..TourUpdate::default()
        };
        let doc = store.update_tour(&id, patch).unwrap();
        assert_eq!(doc["name"], "The Mountain Biker");
        assert_eq!(doc["slug"], "the-forest-hiker");
    }

    #[test]
    fn test_update_invisible_for_secret_tour() {
        let store = MemoryStore::new();
        let secret = insert_secret(&store, "The Hidden Valley");

        let err = store
            .update_tour(&secret.id.to_string(), TourUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "tour" }));
    }

    #[test]
    fn test_delete_orphans_reviews() {
        let store = store_with(&["The Forest Hiker"]);
        let docs = store.query_tours(&TourQuery::new()).unwrap();
        let id = docs[0]["id"].as_str().unwrap().to_string();
        let tour_id = Uuid::parse_str(&id).unwrap();

        store
            .insert_review(
                Review::from_new(NewReview {
                    review: "Wonderful trip".to_string(),
                    rating: 5.0,
                    tour: tour_id,
                    user: Uuid::new_v4(),
                })
                .unwrap(),
            )
            .unwrap();

        store.delete_tour(&id).unwrap();
        assert_eq!(store.list_reviews(None).unwrap().len(), 1);
    }

    #[test]
    fn test_stats_skip_secret_tours() {
        let store = store_with(&["The Forest Hiker"]);
        insert_secret(&store, "The Hidden Valley");

        let stats = store.tour_stats().unwrap();
        let total: usize = stats.iter().map(|s| s.num_tours).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_find_tour_page_by_slug() {
        let store = store_with(&["The Forest Hiker"]);
        let page = store.find_tour_page("the-forest-hiker").unwrap();
        assert_eq!(page.tour.name, "The Forest Hiker");
        assert!(page.reviews.is_empty());
    }

    #[test]
    fn test_user_email_uniqueness() {
        let store = MemoryStore::new();
        let payload = NewUser {
            name: "Aarav Lund".to_string(),
            email: "aarav@example.com".to_string(),
            role: Role::User,
            photo: None,
        };
        store
            .insert_user(User::from_new(payload.clone()).unwrap())
            .unwrap();
        let err = store
            .insert_user(User::from_new(payload).unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email", .. }));
    }
}
