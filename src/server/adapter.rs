// HTTP adapter module
// Converts hyper requests into inbound events and handler results back into responses

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;

use crate::api::{self, HandlerResponse, HandlerResult};
use crate::logger;
use crate::routing::Event;

/// Why a request never reached the router
#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    PayloadTooLarge,
    BadBody(String),
}

impl Rejection {
    pub fn into_response(self) -> HandlerResponse {
        match self {
            Self::PayloadTooLarge => api_message(413, "Payload Too Large"),
            Self::BadBody(reason) => api_message(400, &reason),
        }
    }
}

fn api_message(status_code: u16, message: &str) -> HandlerResponse {
    HandlerResponse {
        status_code,
        body: serde_json::json!({ "message": message }).to_string(),
    }
}

/// Decode `a=1&b=x%20y` into a map; later duplicates win
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Build the HTTP-style event the router consumes
///
/// With a stage configured the path is prefixed with `/<stage>`, the
/// way a staged gateway delivers it.
pub fn build_event(
    method: &str,
    path: &str,
    query: Option<&str>,
    body: Option<String>,
    stage: Option<&str>,
) -> Event {
    let mut event = match stage {
        Some(stage) => Event::http(method, &format!("/{stage}{path}")).with_stage(stage),
        None => Event::http(method, path),
    };
    for (name, value) in query.map(parse_query).unwrap_or_default() {
        event = event.with_query(&name, &value);
    }
    if let Some(body) = body {
        event = event.with_body(body);
    }
    event
}

/// Read the request body, bounded by `max_body_size`
pub async fn read_body(req: Request<Incoming>, max_body_size: u64) -> Result<Option<String>, Rejection> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > max_body_size) {
        return Err(Rejection::PayloadTooLarge);
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(Rejection::PayloadTooLarge)
        }
        Err(e) => return Err(Rejection::BadBody(format!("Failed to read body: {e}"))),
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|_| Rejection::BadBody("Body is not valid UTF-8".to_string()))
}

/// Collapse a router result into the response to send
///
/// Unhandled errors are logged and become a generic 500.
pub fn resolve_result(result: HandlerResult<HandlerResponse>) -> HandlerResponse {
    match result {
        Ok(response) => response,
        Err(e) => {
            logger::log_error(&format!("Unhandled error: {e}"));
            api::internal_error("Internal Server Error")
        }
    }
}

/// Build JSON response
pub fn to_http(response: HandlerResponse) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}
