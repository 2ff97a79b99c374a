use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::route::route_of;
use crate::monitoring::percentiles::round2;
use crate::monitoring::{ErrorContext, Monitor, RequestLogEntry, TrackedError};

/// Path parameters handed to instrumented handlers. Empty for static routes.
pub type RouteParams = HashMap<String, String>;

/// Everything the wrapper records about a request, captured before the
/// handler takes ownership of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub route: String,
    /// Attribution only; never trusted for authorization. Recorded exactly
    /// as sent, with non-UTF-8 bytes replaced. `None` only when the header
    /// is absent.
    pub actor_id: Option<String>,
}

impl RequestMeta {
    pub fn from_request<B>(req: &axum::http::Request<B>, actor_header: &HeaderName) -> Self {
        let actor_id = req
            .headers()
            .get(actor_header)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        Self {
            method: req.method().as_str().to_owned(),
            path: req.uri().path().to_owned(),
            route: route_of(req),
            actor_id,
        }
    }

    fn error_context(&self) -> ErrorContext {
        ErrorContext {
            route: self.route.clone(),
            method: self.method.clone(),
            actor_id: self.actor_id.clone(),
        }
    }
}

/// The only failure body callers ever see. Handler error text stays in the
/// error tracker.
pub fn internal_error_response() -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let body = serde_json::json!({
        "error":  "Internal server error",
        "status": status.as_u16(),
    });
    (status, Json(body)).into_response()
}

impl Monitor {
    /// Drive one handler invocation and record its outcome.
    ///
    /// `Ok` responses are returned untouched. An `Err` or a panic is
    /// recorded in the error tracker and replaced by
    /// [`internal_error_response`]. Either way the request is logged and its
    /// latency sampled under `meta.route`.
    pub async fn observe<Fut, R, E>(&self, meta: RequestMeta, handler: Fut) -> Response
    where
        Fut: Future<Output = Result<R, E>>,
        R: IntoResponse,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let start = Instant::now();
        let outcome = AssertUnwindSafe(handler).catch_unwind().await;
        let duration_ms = round2(start.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(Ok(ok)) => {
                let response = ok.into_response();
                let status = response.status().as_u16();
                self.record(&meta, status, duration_ms);
                tracing::debug!(
                    method = %meta.method,
                    path = %meta.path,
                    status,
                    duration_ms,
                    "request"
                );
                response
            }
            Ok(Err(err)) => {
                let err: Box<dyn Error + Send + Sync> = err.into();
                let tracked = self.errors().track_error(err.as_ref(), meta.error_context());
                self.fail(&meta, &tracked, duration_ms)
            }
            Err(payload) => {
                let tracked = self.errors().track_panic(&*payload, meta.error_context());
                self.fail(&meta, &tracked, duration_ms)
            }
        }
    }

    fn fail(&self, meta: &RequestMeta, tracked: &TrackedError, duration_ms: f64) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
        self.record(meta, status, duration_ms);
        tracing::error!(
            error_id = %tracked.id,
            method = %meta.method,
            route = %meta.route,
            duration_ms,
            error = %tracked.message,
            "handler failed"
        );
        internal_error_response()
    }

    fn record(&self, meta: &RequestMeta, status: u16, duration_ms: f64) {
        self.requests().log_request(RequestLogEntry {
            method: meta.method.clone(),
            path: meta.path.clone(),
            status,
            duration_ms,
            actor_id: meta.actor_id.clone(),
            timestamp: Utc::now(),
        });
        self.performance().track_performance(&meta.route, duration_ms);
    }

    /// Wrap a fallible async handler into an axum handler.
    ///
    /// ```ignore
    /// let monitor = Arc::new(Monitor::default());
    /// let app = Router::new().route(
    ///     "/api/items/:id",
    ///     get(monitor.instrument(|_req, params| async move {
    ///         let id = params.get("id").cloned().unwrap_or_default();
    ///         Ok::<_, String>(Json(id))
    ///     })),
    /// );
    /// ```
    pub fn instrument<H, Fut, R, E>(
        self: &Arc<Self>,
        handler: H,
    ) -> impl Fn(Option<Path<RouteParams>>, Request) -> BoxFuture<'static, Response>
           + Clone
           + Send
           + Sync
           + 'static
    where
        H: Fn(Request, RouteParams) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoResponse + Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + Send + 'static,
    {
        let monitor = Arc::clone(self);
        move |params: Option<Path<RouteParams>>, req: Request| {
            let monitor = Arc::clone(&monitor);
            let handler = handler.clone();
            async move {
                let meta = RequestMeta::from_request(&req, monitor.actor_header());
                let params = params.map(|Path(p)| p).unwrap_or_default();
                // Calling the handler inside the observed future keeps panics
                // raised before its first await inside catch_unwind.
                monitor
                    .observe(meta, async move { handler(req, params).await })
                    .await
            }
            .boxed()
        }
    }

    /// Same as [`Monitor::instrument`] for handlers that do no async work.
    pub fn instrument_sync<H, R, E>(
        self: &Arc<Self>,
        handler: H,
    ) -> impl Fn(Option<Path<RouteParams>>, Request) -> BoxFuture<'static, Response>
           + Clone
           + Send
           + Sync
           + 'static
    where
        H: Fn(Request, RouteParams) -> Result<R, E> + Clone + Send + Sync + 'static,
        R: IntoResponse + Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + Send + 'static,
    {
        self.instrument(move |req, params| std::future::ready(handler(req, params)))
    }
}

/// Router-wide alternative to [`Monitor::instrument`], installed with
/// `axum::middleware::from_fn_with_state`.
///
/// Handlers behind it have already turned their errors into responses, so
/// only panics reach the error tracker; a handler's own 5xx response is
/// logged with its real status and returned unmodified.
pub async fn track_requests(State(monitor): State<Arc<Monitor>>, req: Request, next: Next) -> Response {
    let meta = RequestMeta::from_request(&req, monitor.actor_header());
    monitor
        .observe(meta, async move { Ok::<_, Infallible>(next.run(req).await) })
        .await
}
