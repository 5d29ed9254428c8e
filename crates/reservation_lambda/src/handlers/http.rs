use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use reservation_core::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// HTTP request extracted from an API Gateway (v1 or v2) or Function URL event.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub request_context: Value,
    body: Value,
    body_is_base64: bool,
}

impl HttpRequest {
    /// Decodes the body into `T`; an absent body reads as `{}`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let payload = match &self.body {
            Value::Null => json!({}),
            Value::Object(_) => self.body.clone(),
            Value::String(text) if text.trim().is_empty() => json!({}),
            Value::String(text) => {
                let decoded = if self.body_is_base64 {
                    let bytes = STANDARD.decode(text.trim()).map_err(|error| {
                        ApiError::Validation(format!("Malformed base64 body: {error}"))
                    })?;
                    String::from_utf8(bytes)
                        .map_err(|error| ApiError::Validation(format!("Malformed body: {error}")))?
                } else {
                    text.clone()
                };
                serde_json::from_str(&decoded)
                    .map_err(|error| ApiError::Validation(format!("Malformed JSON body: {error}")))?
            }
            _ => {
                return Err(ApiError::Validation(
                    "Request body must be a JSON object".to_string(),
                ))
            }
        };

        if !payload.is_object() {
            return Err(ApiError::Validation(
                "Request body must be a JSON object".to_string(),
            ));
        }

        serde_json::from_value(payload)
            .map_err(|error| ApiError::Validation(format!("Malformed request: {error}")))
    }
}

pub fn normalize_http_event(event: Value) -> Result<HttpRequest, String> {
    let Value::Object(mut object) = event else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let request_context = object.remove("requestContext").unwrap_or(Value::Null);
    let method = request_context
        .pointer("/http/method")
        .and_then(Value::as_str)
        .or_else(|| object.get("httpMethod").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    // REST API `path` is already relative to the stage; only `rawPath` carries it.
    let stage = request_context.get("stage").and_then(Value::as_str);
    let path = match object.get("rawPath").and_then(Value::as_str) {
        Some(raw_path) => strip_stage(raw_path, stage),
        None => object.get("path").and_then(Value::as_str).unwrap_or("/"),
    }
    .to_string();

    let body_is_base64 = object
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let body = object.remove("body").unwrap_or(Value::Null);

    Ok(HttpRequest {
        method,
        path,
        request_context,
        body,
        body_is_base64,
    })
}

/// HTTP API `rawPath` carries a named stage as its first segment.
fn strip_stage<'a>(path: &'a str, stage: Option<&str>) -> &'a str {
    let Some(stage) = stage.filter(|stage| !stage.is_empty() && *stage != "$default") else {
        return path;
    };

    match path.strip_prefix('/').and_then(|rest| rest.strip_prefix(stage)) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

fn default_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Headers": "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Methods": "*",
        "Accept-Version": "*",
    })
}

pub fn success_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: default_headers(),
            body,
        },
        Err(error) => error_response(&ApiError::BackendUnavailable(format!(
            "failed to serialize response: {error}"
        ))),
    }
}

pub fn error_response(error: &ApiError) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code: error.status_code(),
        headers: default_headers(),
        body: json!({ "message": error.public_message() }).to_string(),
    }
}
