// ABOUTME: Viewer request event and synthesized response types
// ABOUTME: JSON-compatible with CloudFront viewer-request events

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Viewer-request event delivered by the edge platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerEvent {
    #[serde(rename = "Records")]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub cf: CloudFrontRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudFrontRecord {
    #[serde(default)]
    pub config: EventConfig,
    pub request: ViewerRequest,
}

/// Distribution-level details of the event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    /// Correlation id for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The viewer request, kept as the exact object received so it can be
/// handed back untouched on pass-through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerRequest(Map<String, Value>);

/// A single header value in CloudFront form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// Response generated at the edge instead of going to the origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerResponse {
    pub status: u16,
    pub status_description: String,
    /// Keyed by lowercase header name
    pub headers: BTreeMap<String, Vec<HeaderEntry>>,
    pub body: String,
}

/// Result of handling one viewer event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Continue with the original request
    PassThrough(ViewerRequest),
    /// Answer the viewer directly
    Respond(ViewerResponse),
}

impl ViewerEvent {
    /// Event holding a single request record
    pub fn new(request: ViewerRequest, request_id: Option<String>) -> Self {
        Self {
            records: vec![EventRecord {
                cf: CloudFrontRecord {
                    config: EventConfig {
                        request_id,
                        extra: Map::new(),
                    },
                    request,
                },
            }],
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Take the first record's request and correlation id
    pub fn into_first(self) -> Option<(ViewerRequest, Option<String>)> {
        self.records
            .into_iter()
            .next()
            .map(|record| (record.cf.request, record.cf.config.request_id))
    }
}

impl ViewerRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("uri".into(), Value::String(uri.into()));
        Self(fields)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Request path, if present
    pub fn uri(&self) -> Option<&str> {
        self.0.get("uri").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl ViewerResponse {
    pub fn new(status: u16, status_description: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_description: status_description.into(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Set a header, replacing any previous value
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(
            name.to_ascii_lowercase(),
            vec![HeaderEntry {
                key: name.to_string(),
                value: value.into(),
            }],
        );
        self
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(|entry| entry.value.as_str())
    }
}

impl Outcome {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EVENT: &str = r#"{
        "Records": [{
            "cf": {
                "config": {
                    "distributionDomainName": "d111111abcdef8.cloudfront.net",
                    "distributionId": "EDFDVBD6EXAMPLE",
                    "eventType": "viewer-request",
                    "requestId": "4TyzHTaYWb1GX1qTfsHhEqV6HUDd_BzoBZnwfnvQc_1oF26ClkoUSEQ=="
                },
                "request": {
                    "clientIp": "203.0.113.178",
                    "headers": {
                        "host": [{"key": "Host", "value": "d111111abcdef8.cloudfront.net"}]
                    },
                    "method": "GET",
                    "querystring": "",
                    "uri": "/errors/404.html"
                }
            }
        }]
    }"#;

    #[test]
    fn test_parse_cloudfront_event() {
        let event = ViewerEvent::from_json(EVENT).unwrap();
        let (request, request_id) = event.into_first().unwrap();

        assert_eq!(request.uri(), Some("/errors/404.html"));
        assert_eq!(
            request_id.as_deref(),
            Some("4TyzHTaYWb1GX1qTfsHhEqV6HUDd_BzoBZnwfnvQc_1oF26ClkoUSEQ==")
        );
        assert_eq!(request.fields()["method"], json!("GET"));
    }

    #[test]
    fn test_request_serializes_back_unchanged() {
        let raw = r#"{"clientIp":"203.0.113.178","method":"GET","querystring":"a=1","uri":"/index.html","headers":{}}"#;
        let request: ViewerRequest = serde_json::from_str(raw).unwrap();

        assert_eq!(serde_json::to_string(&request).unwrap(), raw);
        assert_eq!(
            Outcome::PassThrough(request).to_json().unwrap(),
            raw
        );
    }

    #[test]
    fn test_missing_config_and_request_id() {
        let event = ViewerEvent::from_json(r#"{"Records":[{"cf":{"request":{"uri":"/"}}}]}"#).unwrap();
        let (_, request_id) = event.into_first().unwrap();
        assert_eq!(request_id, None);

        let empty = ViewerEvent::from_json(r#"{"Records":[]}"#).unwrap();
        assert!(empty.into_first().is_none());
    }

    #[test]
    fn test_response_json_shape() {
        let response = ViewerResponse::new(200, "OK", "<p>hi</p>")
            .with_header("Cache-Control", "max-age=100")
            .with_header("Content-Type", "text/html");

        let value: Value = serde_json::from_str(&Outcome::Respond(response.clone()).to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "status": 200,
                "statusDescription": "OK",
                "headers": {
                    "cache-control": [{"key": "Cache-Control", "value": "max-age=100"}],
                    "content-type": [{"key": "Content-Type", "value": "text/html"}]
                },
                "body": "<p>hi</p>"
            })
        );
        assert_eq!(response.header("content-type"), Some("text/html"));
    }
}
