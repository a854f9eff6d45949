use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use vodbridge_common::VideoUuid;

/// Body of `POST /api/convert`.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertRequest<'a> {
    pub video_url: &'a str,
    pub video_uuid: VideoUuid,
    pub callback_url: &'a str,
    pub site_url: &'a str,
    pub public_url_base: Option<&'a str>,
    pub upload_original: bool,
}

/// Body of the remove-from-queue and delete requests.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRef {
    pub video_uuid: VideoUuid,
}

/// Reply to a submission. Every field is optional; an empty or non-JSON
/// body yields the default value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitResponse {
    /// Correlation id the service is working on right now.
    #[serde(default, deserialize_with = "lenient_string")]
    pub currently_processing: Option<String>,

    /// Position in the remote queue, when the video was queued.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub queue_position: Option<i64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
}

impl SubmitResponse {
    /// Whether the service reported it started on this video immediately.
    pub fn is_processing(&self, uuid: VideoUuid) -> bool {
        self.currently_processing
            .as_deref()
            .and_then(|s| s.parse::<VideoUuid>().ok())
            .is_some_and(|current| current == uuid)
    }
}

/// Generic acknowledgement from remove-from-queue and delete.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteAck {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,

    /// Set on a 409 when the service is actively working on the video.
    #[serde(default)]
    pub is_processing: Option<bool>,
}

/// Result of asking the service to drop a queued video.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed(RemoteAck),
    /// The service has no queue-management endpoint (HTTP 404).
    NotSupported,
}

/// Snapshot of the remote queue. Fields beyond the known ones are passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    #[serde(default, deserialize_with = "lenient_string")]
    pub currently_processing: Option<String>,

    #[serde(default, deserialize_with = "lenient_i64")]
    pub queue_length: Option<i64>,

    #[serde(default)]
    pub queue: Vec<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Parse a JSON body leniently: empty or invalid bodies become `T::default()`.
pub(crate) fn parse_body<T>(body: &[u8]) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return T::default();
    }
    match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable response body");
            T::default()
        }
    }
}

/// Accept a string or a number, ignore anything else.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept an integer, a float (truncated), or a numeric string.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| value_as_i64(&v)))
}

/// Interpret a JSON value as an integer, truncating floats.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_request_shape() {
        let uuid = VideoUuid::new();
        let req = ConvertRequest {
            video_url: "https://videos.example.com/a.mp4",
            video_uuid: uuid,
            callback_url: "https://site.example.com/callback",
            site_url: "https://site.example.com",
            public_url_base: None,
            upload_original: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["video_uuid"], uuid.to_string());
        assert_eq!(json["upload_original"], true);
        assert!(json["public_url_base"].is_null());
    }

    #[test]
    fn test_submit_response_lenient() {
        let r: SubmitResponse = parse_body(br#"{"queue_position": "3"}"#);
        assert_eq!(r.queue_position, Some(3));
        assert_eq!(r.currently_processing, None);

        let r: SubmitResponse = parse_body(br#"{"queue_position": null, "currently_processing": ""}"#);
        assert_eq!(r, SubmitResponse::default());
    }

    #[test]
    fn test_empty_and_garbage_bodies() {
        assert_eq!(parse_body::<SubmitResponse>(b""), SubmitResponse::default());
        assert_eq!(parse_body::<SubmitResponse>(b"  \n"), SubmitResponse::default());
        assert_eq!(parse_body::<SubmitResponse>(b"<html>ok</html>"), SubmitResponse::default());
        assert_eq!(parse_body::<RemoteAck>(b"\"ok\""), RemoteAck::default());
    }

    #[test]
    fn test_is_processing_matches_uuid() {
        let uuid = VideoUuid::new();
        let r = SubmitResponse {
            currently_processing: Some(uuid.to_string()),
            ..Default::default()
        };
        assert!(r.is_processing(uuid));
        assert!(!r.is_processing(VideoUuid::new()));
        assert!(!SubmitResponse::default().is_processing(uuid));
    }

    #[test]
    fn test_queue_status_passthrough() {
        let q: QueueStatus = parse_body(
            br#"{"currently_processing": "abc", "queue_length": 2, "queue": ["x", "y"], "workers": 1}"#,
        );
        assert_eq!(q.queue_length, Some(2));
        assert_eq!(q.queue.len(), 2);
        assert_eq!(q.extra.get("workers"), Some(&Value::from(1)));
    }

    #[test]
    fn test_value_as_i64() {
        assert_eq!(value_as_i64(&Value::from(125)), Some(125));
        assert_eq!(value_as_i64(&Value::from(125.9)), Some(125));
        assert_eq!(value_as_i64(&Value::from(" 42 ")), Some(42));
        assert_eq!(value_as_i64(&Value::from("12.7")), Some(12));
        assert_eq!(value_as_i64(&Value::from("abc")), None);
        assert_eq!(value_as_i64(&Value::Bool(true)), None);
    }
}
