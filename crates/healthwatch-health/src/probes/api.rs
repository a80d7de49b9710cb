//! `api_response` probe: latency and status of the service's status endpoint.

use std::time::Instant;

use http_body_util::BodyExt;
use serde_json::{Value, json};
use tracing::debug;

use healthwatch_core::config::ApiCheckConfig;
use healthwatch_core::{Details, ProbeVerdict};

use crate::evaluator::Probe;

/// Recorded as `response_time` when no response arrived at all.
pub const INFINITE_LATENCY: &str = "inf";

/// Result of one GET against the status endpoint.
#[derive(Debug)]
struct StatusResponse {
    status: http::StatusCode,
    body: bytes::Bytes,
}

/// Probe `{api_url}/status`.
///
/// Passes iff the endpoint answers 2xx and the round trip took less than
/// `config.threshold` seconds. The whole exchange is bounded by
/// `config.timeout()`; a timeout or transport error fails the probe with
/// an infinite latency.
pub async fn probe(api_url: &str, config: &ApiCheckConfig) -> ProbeVerdict {
    let url = format!("{}/status", api_url.trim_end_matches('/'));
    let name = Probe::ApiResponse.name();

    let started = Instant::now();
    let outcome = tokio::time::timeout(config.timeout(), http_get(&url)).await;
    let elapsed = started.elapsed().as_secs_f64();

    let mut detail = Details::new();
    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            debug!(%url, error = %e, "status probe failed");
            detail.insert("error".into(), json!(e));
            detail.insert("response_time".into(), json!(INFINITE_LATENCY));
            return ProbeVerdict::new(name, false, detail);
        }
        Err(_) => {
            debug!(%url, "status probe timed out");
            detail.insert(
                "error".into(),
                json!(format!("timed out after {:?}", config.timeout())),
            );
            detail.insert("response_time".into(), json!(INFINITE_LATENCY));
            return ProbeVerdict::new(name, false, detail);
        }
    };

    detail.insert("status_code".into(), json!(response.status.as_u16()));
    detail.insert("response_time".into(), json!(elapsed));

    if !response.status.is_success() {
        debug!(%url, status = %response.status, "status probe non-2xx");
        detail.insert("error".into(), json!("non-success status code"));
        return ProbeVerdict::new(name, false, detail);
    }

    detail.insert("threshold".into(), json!(config.threshold));
    if let Ok(data) = serde_json::from_slice::<Value>(&response.body) {
        detail.insert("data".into(), data);
    }

    ProbeVerdict::new(name, elapsed < config.threshold, detail)
}

/// Plain HTTP/1.1 GET over a fresh connection.
async fn http_get(url: &str) -> Result<StatusResponse, String> {
    let uri: http::Uri = url.parse().map_err(|e| format!("invalid url {url}: {e}"))?;
    if uri.scheme_str() != Some("http") {
        return Err(format!("unsupported scheme in {url}, only http:// is probed"));
    }
    let authority = uri
        .authority()
        .ok_or_else(|| format!("missing host in {url}"))?
        .clone();
    let address = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));

    let stream = tokio::net::TcpStream::connect(&address)
        .await
        .map_err(|e| format!("connection to {address} failed: {e}"))?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| format!("handshake failed: {e}"))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let req = http::Request::builder()
        .method("GET")
        .uri(path)
        .header("host", authority.as_str())
        .header("user-agent", "healthwatch/0.1")
        .body(http_body_util::Empty::<bytes::Bytes>::new())
        .map_err(|e| format!("invalid request: {e}"))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| format!("reading body failed: {e}"))?
        .to_bytes();

    Ok(StatusResponse { status, body })
}
