use axum::extract::MatchedPath;
use axum::http::Request;
use uuid::Uuid;

/// Placeholder substituted for dynamic path segments.
pub const DYNAMIC_SEGMENT: &str = ":id";

/// Shortest all-hex segment treated as an identifier (object ids, hashes).
const MIN_HEX_ID_LEN: usize = 16;

/// Route identifier used to group latency samples.
///
/// Prefers the router's matched template (`/api/items/:id`); requests that
/// never went through axum routing fall back to [`normalize_path`].
pub fn route_of<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| normalize_path(req.uri().path()))
}

/// Replace identifier-looking segments with [`DYNAMIC_SEGMENT`] so that
/// `/users/42` and `/users/43` share one route key.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_dynamic(segment) {
                DYNAMIC_SEGMENT
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_dynamic(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if Uuid::parse_str(segment).is_ok() {
        return true;
    }
    segment.len() >= MIN_HEX_ID_LEN && segment.bytes().all(|b| b.is_ascii_hexdigit())
}
