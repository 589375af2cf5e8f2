//! One request/response cycle with the chat endpoint, and the rules that
//! turn whatever comes back into display text.

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use crate::locale::{Language, EMPTY_REPLY, UNKNOWN_ERROR};

/// Body of the outbound POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub text: String,
    pub client_id: String,
    pub language: String,
}

/// Status line and unparsed body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl RawReply {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status} {status_text} — {detail}")]
    Http {
        status: u16,
        status_text: String,
        detail: String,
    },
}

/// Sends a [`ChatRequest`] and hands back the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<RawReply, ExchangeError>;
}

/// Reports whether the machine currently has a network connection.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Parse the body as JSON; an unparseable body becomes `{"error": <raw>}`.
pub fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| {
        let mut wrapped = Map::new();
        wrapped.insert("error".to_string(), Value::String(raw.to_string()));
        Value::Object(wrapped)
    })
}

/// Turn a raw response into the assistant's display text, or the error the
/// exchange fails with.
pub fn classify(reply: &RawReply, language: Language) -> Result<String, ExchangeError> {
    let payload = parse_payload(&reply.body);

    if !reply.is_success() {
        if reply.status == 502 || reply.status == 404 {
            return Ok(language.network_unstable().to_string());
        }
        return Err(ExchangeError::Http {
            status: reply.status,
            status_text: reply.status_text.clone(),
            detail: error_detail(&payload, &reply.body),
        });
    }

    let text = match &payload {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                EMPTY_REPLY.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Value::Object(map) => {
            if let Some(text) = field_text(map, "text").or_else(|| field_text(map, "message")) {
                text
            } else if map.contains_key("text") || map.contains_key("message") {
                EMPTY_REPLY.to_string()
            } else if map.is_empty() {
                // `{}` signals upstream instability, not an empty answer
                language.network_unstable().to_string()
            } else {
                pretty(&payload)
            }
        }
        _ => pretty(&payload),
    };
    Ok(text)
}

/// First usable detail among `error`, `body`, `message`, the raw text.
fn error_detail(payload: &Value, raw: &str) -> String {
    if let Value::Object(map) = payload {
        for key in ["error", "body", "message"] {
            if let Some(detail) = field_text(map, key) {
                return detail;
            }
        }
    }
    if !raw.is_empty() {
        return raw.to_string();
    }
    UNKNOWN_ERROR.to_string()
}

/// A field with something to show: strings verbatim, other values as JSON.
/// Null and blank strings count as absent.
fn field_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// A prepared exchange, detached from the session so it can run on its own
/// task.
pub struct Exchange {
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
    request: ChatRequest,
    language: Language,
}

impl Exchange {
    pub fn new(
        transport: Arc<dyn Transport>,
        probe: Arc<dyn ConnectivityProbe>,
        request: ChatRequest,
        language: Language,
    ) -> Self {
        Self {
            transport,
            probe,
            request,
            language,
        }
    }

    /// Run the exchange to completion. Every failure is folded into the
    /// returned text.
    pub async fn run(self) -> String {
        let outcome = match self.transport.send(&self.request).await {
            Ok(reply) => {
                debug!("Chat endpoint replied {} ({} bytes)", reply.status, reply.body.len());
                classify(&reply, self.language)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!("Exchange failed: {}", e);
                self.failure_text(&e).await
            }
        }
    }

    async fn failure_text(&self, error: &ExchangeError) -> String {
        if self.probe.is_online().await {
            error.to_string()
        } else {
            self.language.offline().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> String {
        classify(&RawReply::new(200, "OK", body), Language::English).unwrap()
    }

    #[test]
    fn test_text_field_is_used() {
        assert_eq!(ok(r#"{"text":"hello"}"#), "hello");
    }

    #[test]
    fn test_text_preferred_over_message() {
        assert_eq!(ok(r#"{"message":"second","text":"first"}"#), "first");
        assert_eq!(ok(r#"{"message":"only message"}"#), "only message");
    }

    #[test]
    fn test_null_text_falls_through_to_message() {
        assert_eq!(ok(r#"{"text":null,"message":"fallback"}"#), "fallback");
    }

    #[test]
    fn test_blank_text_falls_through_to_message() {
        assert_eq!(ok(r#"{"text":"","message":"m"}"#), "m");
        assert_eq!(ok(r#"{"text":"  ","message":"m"}"#), "m");
    }

    #[test]
    fn test_blank_text_and_message_get_placeholder() {
        assert_eq!(ok(r#"{"text":""}"#), EMPTY_REPLY);
        assert_eq!(ok(r#"{"text":" ","message":""}"#), EMPTY_REPLY);
        assert_eq!(ok(r#"{"text":null}"#), EMPTY_REPLY);
    }

    #[test]
    fn test_http_error_skips_blank_fields() {
        assert_eq!(
            http_error(500, "Internal Server Error", r#"{"error":" ","message":"m"}"#),
            "HTTP 500 Internal Server Error — m"
        );
    }

    #[test]
    fn test_empty_object_means_unstable_network() {
        assert_eq!(ok("{}"), Language::English.network_unstable());
        assert_eq!(
            classify(&RawReply::new(200, "OK", "{}"), Language::Chinese).unwrap(),
            Language::Chinese.network_unstable()
        );
    }

    #[test]
    fn test_string_payload_is_trimmed() {
        assert_eq!(ok(r#""  hi there \n""#), "hi there");
    }

    #[test]
    fn test_blank_string_payload_gets_placeholder() {
        assert_eq!(ok(r#""   ""#), EMPTY_REPLY);
    }

    #[test]
    fn test_other_objects_are_pretty_printed() {
        assert_eq!(ok(r#"{"foo":"bar"}"#), "{\n  \"foo\": \"bar\"\n}");
    }

    #[test]
    fn test_arrays_are_pretty_printed() {
        assert_eq!(ok("[1,2]"), "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_unparseable_success_body_is_wrapped() {
        assert_eq!(ok("plain words"), "{\n  \"error\": \"plain words\"\n}");
    }

    #[test]
    fn test_404_and_502_mean_unstable_network() {
        for status in [404, 502] {
            let reply = RawReply::new(status, "whatever", r#"{"error":"ignored"}"#);
            assert_eq!(
                classify(&reply, Language::English).unwrap(),
                Language::English.network_unstable()
            );
        }
    }

    fn http_error(status: u16, status_text: &str, body: &str) -> String {
        classify(&RawReply::new(status, status_text, body), Language::English)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn test_http_error_prefers_error_then_body_then_message() {
        assert_eq!(
            http_error(500, "Internal Server Error", r#"{"error":"boom","body":"b","message":"m"}"#),
            "HTTP 500 Internal Server Error — boom"
        );
        assert_eq!(
            http_error(500, "Internal Server Error", r#"{"body":"b","message":"m"}"#),
            "HTTP 500 Internal Server Error — b"
        );
        assert_eq!(
            http_error(503, "Service Unavailable", r#"{"message":"m"}"#),
            "HTTP 503 Service Unavailable — m"
        );
    }

    #[test]
    fn test_http_error_falls_back_to_raw_text() {
        assert_eq!(
            http_error(500, "Internal Server Error", r#"{"detail":"x"}"#),
            r#"HTTP 500 Internal Server Error — {"detail":"x"}"#
        );
        assert_eq!(
            http_error(401, "Unauthorized", "go away"),
            "HTTP 401 Unauthorized — go away"
        );
    }

    #[test]
    fn test_http_error_with_empty_body_is_unknown() {
        // An empty body does not parse, so it is wrapped as {"error": ""}
        assert_eq!(
            http_error(500, "Internal Server Error", ""),
            "HTTP 500 Internal Server Error — unknown error"
        );
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = ChatRequest {
            text: "hi".to_string(),
            client_id: "abc".to_string(),
            language: "en".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({"text": "hi", "clientId": "abc", "language": "en"}));
    }
}
