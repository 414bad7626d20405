//! HTTP front end for the proxy.
//!
//! Every path and method lands on one handler. The target comes from the
//! `url` query parameter; method, headers and body of the inbound request are
//! replayed against it through the shared fetcher.

use crate::error::DispatchError;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::{RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use hoard_client::fetch::{is_hop_by_hop, to_fields, to_header_map};
use hoard_client::parse_target;
use hoard_core::{Fetcher, Headers, RequestDescriptor, ResponseDescriptor};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Query parameter carrying the target URL.
pub const TARGET_PARAM: &str = "url";

/// Inbound headers that describe the hop to the proxy rather than the request.
const NOT_FORWARDED: &[&str] = &["host", "content-length", "accept-encoding"];

/// Response headers the server frames itself.
const NOT_RELAYED: &[&str] = &["content-length", "content-encoding"];

/// Shared state for the HTTP server.
pub struct ProxyState {
    pub fetcher: Arc<dyn Fetcher>,
}

impl ProxyState {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

pub type SharedState = Arc<ProxyState>;

/// Create the HTTP router.
pub fn create_router(state: SharedState) -> Router {
    Router::new().fallback(proxy).with_state(state)
}

/// Start the HTTP server.
pub async fn start_server(state: SharedState, addr: SocketAddr) -> std::io::Result<()> {
    let router = create_router(state);
    info!("Starting proxy on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

async fn proxy(
    State(state): State<SharedState>, method: Method, headers: HeaderMap, RawQuery(query): RawQuery, body: Bytes,
) -> Result<Response, DispatchError> {
    let target = target_param(query.as_deref()).ok_or(DispatchError::MissingTarget)?;
    let url = parse_target(&target).map_err(|e| DispatchError::InvalidTarget(e.to_string()))?;

    let req = RequestDescriptor::new(url, method.as_str(), forwarded_headers(&headers), String::from_utf8_lossy(&body))?;

    // The fetch runs on its own task so a client hanging up does not cancel
    // the origin call or the cache write that follows it.
    let fetcher = state.fetcher.clone();
    let res = tokio::spawn(async move { fetcher.fetch(&req).await })
        .await
        .map_err(|e| DispatchError::Task(e.to_string()))??;

    Ok(write_back(&res))
}

fn target_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

fn forwarded_headers(headers: &HeaderMap) -> Headers {
    let mut fields = to_fields(headers);
    fields.retain(|name, _| !is_hop_by_hop(name) && !NOT_FORWARDED.contains(&name.as_str()));
    fields
}

fn write_back(res: &ResponseDescriptor) -> Response {
    let status = StatusCode::from_u16(res.status()).unwrap_or(StatusCode::BAD_GATEWAY);
    let relayed = res
        .headers()
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name) && !NOT_RELAYED.iter().any(|h| h.eq_ignore_ascii_case(name)));

    (status, to_header_map(relayed), Body::from(res.body().to_string())).into_response()
}
