//! HTTP metrics middleware.
//!
//! Applied as the outermost layer so it captures every response, including
//! framework-level errors that occur before a handler runs (404, 405, body
//! deserialization 400s).

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::{Duration, Instant};

use crate::observability::metrics::{normalize_endpoint, record_http_request};

/// Metric labels resolved from a request before the handler chain consumes
/// it. The endpoint is normalized here so the label set stays bounded no
/// matter what the raw path contained.
struct RequestLabels {
    method: String,
    endpoint: String,
}

impl RequestLabels {
    fn resolve(request: &Request) -> Self {
        Self {
            method: request.method().to_string(),
            endpoint: normalize_endpoint(request.uri().path()),
        }
    }

    fn record(self, status: StatusCode, elapsed: Duration) {
        record_http_request(&self.method, &self.endpoint, status.as_u16(), elapsed);
    }
}

/// Record method, normalized endpoint, status code and duration for every
/// response.
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let labels = RequestLabels::resolve(&request);
    let started = Instant::now();

    let response = next.run(request).await;

    labels.record(response.status(), started.elapsed());
    response
}
