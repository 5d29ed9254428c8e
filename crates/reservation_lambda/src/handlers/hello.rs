use reservation_core::error::ApiError;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::handlers::http::{normalize_http_event, ApiGatewayResponse};

pub const HELLO_MESSAGE: &str = "Hello from Lambda";

/// Function URL reply. The body repeats the status next to the message.
fn hello_response(status_code: u16, message: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({ "Content-Type": "application/json" }),
        body: json!({ "statusCode": status_code, "message": message }).to_string(),
    }
}

pub fn handle_hello_event(event: Value) -> ApiGatewayResponse {
    let request = match normalize_http_event(event) {
        Ok(request) => request,
        Err(message) => return hello_response(400, &message),
    };

    if request.method.eq_ignore_ascii_case("GET") && request.path == "/hello" {
        info!(component = "hello", event = "hello_served");
        return hello_response(200, HELLO_MESSAGE);
    }

    let rejection = ApiError::UnsupportedRoute {
        method: request.method,
        path: request.path,
    };
    warn!(component = "hello", event = "request_rejected", error_kind = rejection.kind());
    hello_response(rejection.status_code(), &rejection.public_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("body should be json")
    }

    #[test]
    fn greets_on_get_hello() {
        let response = handle_hello_event(json!({
            "rawPath": "/hello",
            "requestContext": {"http": {"method": "GET"}}
        }));

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(
            body(&response),
            json!({"statusCode": 200, "message": "Hello from Lambda"})
        );

        let payload = serde_json::to_value(&response).expect("response should serialize");
        assert!(payload["body"].is_string());
    }

    #[test]
    fn rejects_other_routes_with_method_and_path() {
        let response = handle_hello_event(json!({
            "rawPath": "/goodbye",
            "requestContext": {"http": {"method": "POST"}}
        }));

        assert_eq!(response.status_code, 400);
        assert_eq!(
            body(&response),
            json!({
                "statusCode": 400,
                "message": "Bad request syntax or unsupported method. Request path: /goodbye. HTTP method: POST"
            })
        );
    }
}
