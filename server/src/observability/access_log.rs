//! Per-request access log.
//!
//! Emits one event per request under the `access` target, with the fields of
//! the combined log format as structured data plus the formatted line.

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, Method, Version},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

/// One served request.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub remote_addr: Option<SocketAddr>,
    pub time: DateTime<Utc>,
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub status: u16,
    pub size: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl fmt::Display for AccessRecord {
    /// `host - - [time] "request" status size "referer" "user agent"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self
            .remote_addr
            .map_or_else(|| "-".to_string(), |addr| addr.ip().to_string());
        let size = self
            .size
            .map_or_else(|| "-".to_string(), |s| s.to_string());

        write!(
            f,
            "{host} - - [{}] \"{} {} {:?}\" {} {size} \"{}\" \"{}\"",
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.target,
            self.version,
            self.status,
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Middleware that logs every request once the response is ready.
pub async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let time = Utc::now();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let method = request.method().clone();
    let target = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), |pq| pq.as_str().to_string());
    let version = request.version();
    let referer = header_value(request.headers(), header::REFERER);
    let user_agent = header_value(request.headers(), header::USER_AGENT);

    let response = next.run(request).await;

    let record = AccessRecord {
        remote_addr,
        time,
        method,
        target,
        version,
        status: response.status().as_u16(),
        size: header_value(response.headers(), header::CONTENT_LENGTH)
            .and_then(|v| v.parse().ok()),
        referer,
        user_agent,
    };

    tracing::info!(
        target: "access",
        remote_addr = ?record.remote_addr,
        method = %record.method,
        path = %record.target,
        status = record.status,
        size = record.size,
        latency_ms = started.elapsed().as_millis() as u64,
        "{record}"
    );

    response
}
