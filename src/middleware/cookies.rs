//! Cookie parsing into a structured request extension.

use std::collections::HashMap;

use axum::extract::Request;
use axum::http::header::COOKIE;
use axum::middleware::Next;
use axum::response::Response;

/// Cookies sent with the request, available to downstream stages.
#[derive(Debug, Clone, Default)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses the `Cookie` header into a [`Cookies`] extension.
pub async fn parse_cookies(mut req: Request, next: Next) -> Response {
    let cookies = req
        .headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(parse_header)
        .unwrap_or_default();
    req.extensions_mut().insert(cookies);
    next.run(req).await
}

fn parse_header(header: &str) -> Cookies {
    let mut map = HashMap::new();
    for pair in header.split(';') {
        if let Some((name, value)) = pair.split_once('=') {
            map.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    Cookies(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let cookies = parse_header("session=abc123; theme=dark");
        assert_eq!(cookies.get("session"), Some("abc123"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.get("missing"), None);
    }

    #[test]
    fn test_parse_ignores_malformed_pairs() {
        let cookies = parse_header("flag; session=abc");
        assert_eq!(cookies.get("session"), Some("abc"));
        assert_eq!(cookies.get("flag"), None);
    }
}
