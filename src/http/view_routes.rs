//! Server-rendered views.
//!
//! Thin HTML rendering over the same store reads the API uses. The tour
//! page embeds its location data as a JSON attribute for the external
//! map-display widget to pick up.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::error::AppResult;
use crate::store::TourQuery;

use super::AppState;

pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/tour/:slug", get(tour_page))
}

async fn overview(State(state): State<AppState>) -> AppResult<Html<String>> {
    let docs = state.store.query_tours(&TourQuery::new())?;

    let mut cards = String::new();
    for doc in &docs {
        let name = doc.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let slug = doc.get("slug").and_then(|v| v.as_str()).unwrap_or("");
        let summary = doc.get("summary").and_then(|v| v.as_str()).unwrap_or("");
        let duration = doc.get("duration").and_then(|v| v.as_u64()).unwrap_or(0);
        let price = doc.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0);

        cards.push_str(&format!(
            "<article class=\"card\">\
             <h2><a href=\"/tour/{slug}\">{}</a></h2>\
             <p>{}</p>\
             <p>{duration} days &middot; ${price}</p>\
             </article>",
            escape(name),
            escape(summary),
        ));
    }

    Ok(Html(layout("All Tours", &cards)))
}

async fn tour_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Html<String>> {
    let page = state.store.find_tour_page(&slug)?;
    let tour = &page.tour;

    let locations = serde_json::to_string(&tour.locations).unwrap_or_else(|_| "[]".to_string());

    let mut body = format!(
        "<h1>{}</h1><p>{}</p><p>{} days &middot; {} people &middot; ${}</p>",
        escape(&tour.name),
        escape(&tour.summary),
        tour.duration,
        tour.max_group_size,
        tour.price,
    );

    if !page.guides.is_empty() {
        body.push_str("<ul class=\"guides\">");
        for guide in &page.guides {
            body.push_str(&format!("<li>{}</li>", escape(&guide.name)));
        }
        body.push_str("</ul>");
    }

    if !page.reviews.is_empty() {
        body.push_str("<ul class=\"reviews\">");
        for review in &page.reviews {
            body.push_str(&format!(
                "<li>{} &mdash; {}/5</li>",
                escape(&review.review),
                review.rating,
            ));
        }
        body.push_str("</ul>");
    }

    body.push_str(&format!(
        "<div id=\"map\" data-locations=\"{}\"></div>",
        escape(&locations),
    ));

    Ok(Html(layout(&tour.name, &body)))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html lang=\"en\">\
         <head>\
         <meta charset=\"utf-8\">\
         <title>{} | Tourbase</title>\
         <link rel=\"stylesheet\" href=\"/css/style.css\">\
         </head>\
         <body><main>{body}</main></body>\
         </html>",
        escape(title),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attribute_safe() {
        assert_eq!(escape("a\"b<c>"), "a&quot;b&lt;c&gt;");
    }

    #[test]
    fn test_layout_links_stylesheet() {
        let html = layout("All Tours", "<p>x</p>");
        assert!(html.contains("/css/style.css"));
        assert!(html.contains("All Tours | Tourbase"));
    }
}
