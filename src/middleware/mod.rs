pub mod instrument;
pub mod route;

pub use instrument::{internal_error_response, track_requests, RequestMeta, RouteParams};
pub use route::{normalize_path, route_of};
