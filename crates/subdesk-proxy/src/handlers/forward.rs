//! Request forwarding to the upstream API

use crate::state::ProxyState;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::sync::Arc;
use subdesk_infra::{get_request_id, ErrorResponse};

/// Largest request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const PROXY_ERROR_DETAILS: &str = "Check proxy server console for more information";

/// Connection-level headers that must not cross the proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Headers to send upstream: hop-by-hop and `Host` removed, forwarding
/// headers added.
pub fn upstream_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len() + 2);
    for (name, value) in incoming {
        if is_hop_by_hop(name) || name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert("x-forwarded-for", HeaderValue::from_static("127.0.0.1"));
    headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
    headers
}

fn header_or_unset(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Not set")
        .to_string()
}

/// One log line per request.
pub async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "Request");
    next.run(request).await
}

fn proxy_error(status: StatusCode, message: String) -> Response {
    let body = ErrorResponse::new("Proxy error")
        .with_message(message)
        .with_details(PROXY_ERROR_DETAILS);
    (status, Json(body)).into_response()
}

/// Forward the request to `<target><path>?<query>` and relay the answer.
pub async fn forward(State(state): State<Arc<ProxyState>>, request: Request) -> Response {
    let request_id = get_request_id(&request).unwrap_or_default();
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target_url = state.target_url(path_and_query);

    let authorization = if parts.headers.contains_key(header::AUTHORIZATION) {
        "Bearer [HIDDEN]"
    } else {
        "Not set"
    };
    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        original_url = %path_and_query,
        target_url = %target_url,
        authorization,
        content_type = %header_or_unset(&parts.headers, "content-type"),
        environment = %header_or_unset(&parts.headers, "environment"),
        "Proxying request"
    );

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, url = %path_and_query, "Failed to read request body");
            return proxy_error(StatusCode::PAYLOAD_TOO_LARGE, e.to_string());
        }
    };

    let upstream = state
        .client
        .request(parts.method.clone(), &target_url)
        .headers(upstream_headers(&parts.headers))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, url = %path_and_query, "Proxy error");
            return proxy_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let status = upstream.status();
    tracing::info!(status = status.as_u16(), "Proxy response");
    if status == StatusCode::NOT_FOUND {
        tracing::warn!(
            path = %path_and_query,
            target_url = %target_url,
            "404 from upstream, endpoint may not exist"
        );
    }

    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, url = %path_and_query, "Failed to read upstream body");
            return proxy_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hop_by_hop_and_host() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer k"));
        incoming.insert("environment", HeaderValue::from_static("marinestream"));

        let headers = upstream_headers(&incoming);

        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer k");
        assert_eq!(headers.get("environment").unwrap(), "marinestream");
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "127.0.0.1");
        assert_eq!(headers.get("x-forwarded-proto").unwrap(), "http");
    }

    #[test]
    fn target_url_keeps_query() {
        let state = ProxyState::new("https://api.idiana.io/").unwrap();
        assert_eq!(
            state.target_url("/api/v3/flows?name=hull"),
            "https://api.idiana.io/api/v3/flows?name=hull"
        );
    }
}
