//! Explicit query builder for tour reads.
//!
//! Every tour read call site passes through [`TourQuery`], which makes the
//! default query scoping visible instead of injecting it behind the scenes:
//! a fresh query excludes secret tours and resolves guide references, and
//! the call site has to opt out explicitly.

use serde_json::Value;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: usize = 100;

/// Comparison operators supported by field filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    /// Parses the bracket-operator suffix of a query key, e.g. `price[gte]`.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "eq" => Some(FilterOp::Eq),
            "ne" => Some(FilterOp::Ne),
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            "in" => Some(FilterOp::In),
            _ => None,
        }
    }
}

/// A single field comparison, matched against projected documents.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Whether a document satisfies this filter.
    pub fn matches(&self, doc: &Value) -> bool {
        let field_value = match doc.get(&self.field) {
            Some(v) => v,
            None => return false,
        };

        match self.op {
            FilterOp::Eq => field_value == &self.value,
            FilterOp::Ne => field_value != &self.value,
            FilterOp::Gt => compare_values(field_value, &self.value) > 0,
            FilterOp::Gte => compare_values(field_value, &self.value) >= 0,
            FilterOp::Lt => compare_values(field_value, &self.value) < 0,
            FilterOp::Lte => compare_values(field_value, &self.value) <= 0,
            FilterOp::In => match &self.value {
                Value::Array(candidates) => candidates.contains(field_value),
                _ => false,
            },
        }
    }
}

/// Compares two JSON values for ordering; numbers numerically, strings
/// lexicographically (RFC 3339 timestamps order chronologically this way).
pub fn compare_values(a: &Value, b: &Value) -> i32 {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            if a < b {
                -1
            } else if a > b {
                1
            } else {
                0
            }
        }
        (Value::String(a), Value::String(b)) => match a.cmp(b) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        },
        _ => 0,
    }
}

/// A sort clause.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

/// Field projection for list output.
#[derive(Debug, Clone)]
pub enum FieldSelection {
    /// Keep only the listed fields (plus `id`).
    Include(Vec<String>),
    /// Drop the listed fields.
    Exclude(Vec<String>),
}

/// Builder for tour read operations.
#[derive(Debug, Clone)]
pub struct TourQuery {
    include_secret: bool,
    populate_guides: bool,
    include_reviews: bool,
    filters: Vec<FieldFilter>,
    sort: Vec<SortKey>,
    fields: Option<FieldSelection>,
    page: usize,
    limit: usize,
}

impl Default for TourQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl TourQuery {
    /// The standard read scope: secret tours excluded, guides resolved,
    /// newest first.
    pub fn new() -> Self {
        Self {
            include_secret: false,
            populate_guides: true,
            include_reviews: false,
            filters: Vec::new(),
            sort: vec![SortKey {
                field: "createdAt".to_string(),
                ascending: false,
            }],
            fields: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Opts in to secret tours. The only way they become visible.
    pub fn include_secret(mut self) -> Self {
        self.include_secret = true;
        self
    }

    /// Skips guide resolution, returning raw reference ids.
    pub fn without_guides(mut self) -> Self {
        self.populate_guides = false;
        self
    }

    /// Joins the tour's reviews into the result (single-document reads).
    pub fn with_reviews(mut self) -> Self {
        self.include_reviews = true;
        self
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replaces the sort order.
    pub fn sort_by(mut self, keys: Vec<SortKey>) -> Self {
        if !keys.is_empty() {
            self.sort = keys;
        }
        self
    }

    pub fn select(mut self, fields: FieldSelection) -> Self {
        self.fields = Some(fields);
        self
    }

    /// 1-based page and page size.
    pub fn paginate(mut self, page: usize, limit: usize) -> Self {
        self.page = page.max(1);
        if limit > 0 {
            self.limit = limit;
        }
        self
    }

    pub fn secret_included(&self) -> bool {
        self.include_secret
    }

    pub fn guides_populated(&self) -> bool {
        self.populate_guides
    }

    pub fn reviews_included(&self) -> bool {
        self.include_reviews
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn fields(&self) -> Option<&FieldSelection> {
        self.fields.as_ref()
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_scope_excludes_secret_and_populates() {
        let query = TourQuery::new();
        assert!(!query.secret_included());
        assert!(query.guides_populated());
        assert!(!query.reviews_included());
    }

    #[test]
    fn test_include_secret_is_explicit() {
        assert!(TourQuery::new().include_secret().secret_included());
    }

    #[test]
    fn test_eq_filter() {
        let filter = FieldFilter::new("difficulty", FilterOp::Eq, json!("easy"));
        assert!(filter.matches(&json!({"difficulty": "easy"})));
        assert!(!filter.matches(&json!({"difficulty": "medium"})));
    }

    #[test]
    fn test_numeric_range_filters() {
        let filter = FieldFilter::new("price", FilterOp::Gte, json!(400));
        assert!(filter.matches(&json!({"price": 497.0})));
        assert!(filter.matches(&json!({"price": 400})));
        assert!(!filter.matches(&json!({"price": 399.5})));
    }

    #[test]
    fn test_in_filter() {
        let filter = FieldFilter::new(
            "difficulty",
            FilterOp::In,
            json!(["easy", "medium"]),
        );
        assert!(filter.matches(&json!({"difficulty": "medium"})));
        assert!(!filter.matches(&json!({"difficulty": "difficult"})));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let filter = FieldFilter::new("price", FilterOp::Gt, json!(1));
        assert!(!filter.matches(&json!({"name": "x"})));
    }

    #[test]
    fn test_default_sort_newest_first() {
        let query = TourQuery::new();
        assert_eq!(query.sort()[0].field, "createdAt");
        assert!(!query.sort()[0].ascending);
    }

    #[test]
    fn test_pagination_offset() {
        let query = TourQuery::new().paginate(3, 10);
        assert_eq!(query.offset(), 20);
        assert_eq!(query.limit(), 10);
    }
}
