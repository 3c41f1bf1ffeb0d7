// Handler response module

use serde::Serialize;
use serde_json::json;

use crate::logger;

/// HTTP-shaped handler result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    /// JSON text
    pub body: String,
}

impl HandlerResponse {
    /// Parse the body back into JSON
    #[cfg(test)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Build JSON response
pub fn json_response<T: Serialize>(status_code: u16, body: &T) -> HandlerResponse {
    match serde_json::to_string(body) {
        Ok(body) => HandlerResponse { status_code, body },
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            HandlerResponse {
                status_code: 500,
                body: r#"{"message":"Internal Server Error"}"#.to_string(),
            }
        }
    }
}

/// 200 with a JSON body
pub fn ok<T: Serialize>(body: &T) -> HandlerResponse {
    json_response(200, body)
}

/// `{"message": ...}` with the given status
pub fn message(status_code: u16, message: &str) -> HandlerResponse {
    json_response(status_code, &json!({ "message": message }))
}

/// 400 Bad Request response
pub fn bad_request(msg: &str) -> HandlerResponse {
    message(400, msg)
}

/// 404 Not Found response
pub fn not_found(msg: &str) -> HandlerResponse {
    message(404, msg)
}

/// 500 response; detail stays in the log
pub fn internal_error(msg: &str) -> HandlerResponse {
    message(500, msg)
}

/// 400 whose body is a bare JSON string naming the route
pub fn unsupported_route(route_key: &str) -> HandlerResponse {
    json_response(400, &format!("Unsupported method or route: {route_key}"))
}
