//! Plugin-call parameters and the defaults applied to them.

use std::collections::BTreeMap;

use bridge_traits::cast::{LoadRequest, MediaInfo, StreamType};
use core_cast::CastError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::content_type::{detect_content_type, is_hls, HLS_CONTENT_TYPE};

/// Arguments of `load_media`, as sent by the host.
///
/// Every field except `content_id` is optional. Times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadMediaParams {
    pub content_id: String,
    /// Defaults to an empty object.
    pub custom_data: Option<Value>,
    /// Defaults to detection from the URL.
    pub content_type: Option<String>,
    /// Zero or absent means unknown.
    pub duration: Option<f64>,
    /// Defaults to `LIVE` for HLS, `BUFFERED` otherwise.
    pub stream_type: Option<StreamType>,
    pub autoplay: bool,
    pub current_time: f64,
    pub metadata: Option<Value>,
    pub text_track_style: Option<Value>,
}

impl LoadMediaParams {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            ..Default::default()
        }
    }

    /// Apply the defaults and build the provider request.
    pub fn into_request(self) -> Result<LoadRequest, CastError> {
        let content_id = self.content_id.trim().to_string();
        if content_id.is_empty() {
            return Err(CastError::InvalidArgument(
                "contentId is required".to_string(),
            ));
        }
        if !self.current_time.is_finite() || self.current_time < 0.0 {
            return Err(CastError::InvalidArgument(format!(
                "currentTime must be a non-negative number, got {}",
                self.current_time
            )));
        }

        let content_type = detect_content_type(&content_id, self.content_type.as_deref());
        let stream_type = self.stream_type.unwrap_or(if is_hls(&content_type) {
            StreamType::Live
        } else {
            StreamType::Buffered
        });
        let duration_ms = self
            .duration
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map(seconds_to_ms);
        let custom_data = self
            .custom_data
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(LoadRequest {
            media: MediaInfo {
                content_id,
                content_type,
                stream_type,
                duration_ms,
                metadata: self.metadata,
                custom_data: Some(custom_data.clone()),
                text_track_style: self.text_track_style,
            },
            autoplay: self.autoplay,
            current_time_ms: seconds_to_ms(self.current_time),
            custom_data: Some(custom_data),
        })
    }

    /// Attach receiver-side credentials to the custom data: `authHeaders`
    /// when `headers` is non-empty, `authToken` when a token is given.
    pub fn with_auth(mut self, headers: BTreeMap<String, String>, token: Option<String>) -> Self {
        let mut custom_data = match self.custom_data.take() {
            Some(Value::Object(map)) => map,
            Some(other) => {
                debug!(kind = value_kind(&other), "Custom data is not an object, replacing");
                Map::new()
            }
            None => Map::new(),
        };

        if !headers.is_empty() {
            let headers = headers
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect();
            custom_data.insert("authHeaders".to_string(), Value::Object(headers));
        }
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            custom_data.insert("authToken".to_string(), Value::String(token));
        }

        self.custom_data = Some(Value::Object(custom_data));
        self
    }
}

/// Arguments of `load_secure_hls`: an HLS stream whose segments the receiver
/// fetches with a URL token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecureHlsParams {
    pub content_id: String,
    pub custom_data: Option<Value>,
    pub content_type: String,
    pub stream_type: StreamType,
    #[serde(alias = "autoPlay")]
    pub autoplay: bool,
    pub metadata: Option<Value>,
    /// Taken from the `token` query parameter of `content_id` when empty.
    pub auth_token: Option<String>,
    /// Accepted but unused; the configured receiver handles the stream.
    pub custom_app_id: Option<String>,
}

impl Default for SecureHlsParams {
    fn default() -> Self {
        Self {
            content_id: String::new(),
            custom_data: None,
            content_type: HLS_CONTENT_TYPE.to_string(),
            stream_type: StreamType::Live,
            autoplay: true,
            metadata: None,
            auth_token: None,
            custom_app_id: None,
        }
    }
}

impl SecureHlsParams {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            ..Default::default()
        }
    }

    /// Token sent to the receiver: the explicit one, else the URL's.
    pub fn resolved_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| token_from_url(&self.content_id))
    }

    /// Regular load parameters carrying the secure HLS markers in
    /// `customData`.
    pub fn into_load_params(self) -> Result<LoadMediaParams, CastError> {
        if self.content_id.trim().is_empty() {
            return Err(CastError::InvalidArgument(
                "contentId is required".to_string(),
            ));
        }
        if let Some(app_id) = self.custom_app_id.as_deref().filter(|id| !id.is_empty()) {
            debug!(app_id, "Custom receiver app ignored for secure HLS");
        }

        let token = self.resolved_token();
        let mut custom_data = match self.custom_data {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        custom_data.insert("secureHLS".to_string(), Value::Bool(true));
        custom_data.insert(
            "originalUrl".to_string(),
            Value::String(self.content_id.clone()),
        );
        custom_data.insert("authType".to_string(), Value::String("url_token".to_string()));
        custom_data.insert(
            "contentType".to_string(),
            Value::String(self.content_type.clone()),
        );

        let params = LoadMediaParams {
            content_id: self.content_id,
            custom_data: Some(Value::Object(custom_data)),
            content_type: Some(self.content_type),
            stream_type: Some(self.stream_type),
            autoplay: self.autoplay,
            metadata: self.metadata,
            ..Default::default()
        };
        Ok(params.with_auth(BTreeMap::new(), token))
    }
}

/// Value of the `token` query parameter of `url`, if any.
pub fn token_from_url(url: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub(crate) fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome of `send_message` in the shape the host expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider status code when the receiver rejected the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl From<Result<(), CastError>> for SendMessageResult {
    fn from(result: Result<(), CastError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error: None,
                code: None,
            },
            Err(err) => Self {
                success: false,
                code: match &err {
                    CastError::Provider { code, .. } => Some(*code),
                    _ => None,
                },
                error: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::ProviderStatus;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let request = LoadMediaParams::new("https://cdn.example.com/movie.mp4")
            .into_request()
            .unwrap();

        assert_eq!(request.media.content_type, "video/mp4");
        assert_eq!(request.media.stream_type, StreamType::Buffered);
        assert_eq!(request.media.duration_ms, None);
        assert_eq!(request.custom_data, Some(json!({})));
        assert!(!request.autoplay);
        assert_eq!(request.current_time_ms, 0);
    }

    #[test]
    fn test_hls_defaults_to_live() {
        let request = LoadMediaParams::new("https://cdn.example.com/live.m3u8")
            .into_request()
            .unwrap();
        assert_eq!(request.media.stream_type, StreamType::Live);

        let mut params = LoadMediaParams::new("https://cdn.example.com/vod.m3u8");
        params.stream_type = Some(StreamType::Buffered);
        assert_eq!(
            params.into_request().unwrap().media.stream_type,
            StreamType::Buffered
        );
    }

    #[test]
    fn test_times_sent_in_milliseconds() {
        let params = LoadMediaParams {
            content_id: "https://cdn.example.com/a.mp4".into(),
            duration: Some(90.5),
            current_time: 12.25,
            autoplay: true,
            ..Default::default()
        };

        let request = params.into_request().unwrap();
        assert_eq!(request.media.duration_ms, Some(90_500));
        assert_eq!(request.current_time_ms, 12_250);
        assert!(request.autoplay);
    }

    #[test]
    fn test_rejects_missing_content_id_and_negative_time() {
        assert!(matches!(
            LoadMediaParams::new("  ").into_request(),
            Err(CastError::InvalidArgument(_))
        ));

        let mut params = LoadMediaParams::new("https://cdn.example.com/a.mp4");
        params.current_time = -1.0;
        assert!(matches!(
            params.into_request(),
            Err(CastError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_auth_merged_into_custom_data() {
        let mut params = LoadMediaParams::new("https://cdn.example.com/a.mp4");
        params.custom_data = Some(json!({"user": "42"}));
        let headers = BTreeMap::from([("Authorization".to_string(), "Bearer x".to_string())]);

        let request = params
            .with_auth(headers, Some("t0k".to_string()))
            .into_request()
            .unwrap();

        assert_eq!(
            request.custom_data,
            Some(json!({
                "user": "42",
                "authHeaders": {"Authorization": "Bearer x"},
                "authToken": "t0k"
            }))
        );
    }

    #[test]
    fn test_empty_auth_leaves_custom_data_alone() {
        let mut params = LoadMediaParams::new("https://cdn.example.com/a.mp4");
        params.custom_data = Some(json!({"user": "42"}));

        let params = params.with_auth(BTreeMap::new(), Some(String::new()));

        assert_eq!(params.custom_data, Some(json!({"user": "42"})));
    }

    #[test]
    fn test_auth_replaces_non_object_custom_data() {
        let mut params = LoadMediaParams::new("https://cdn.example.com/a.mp4");
        params.custom_data = Some(json!("opaque"));

        let params = params.with_auth(BTreeMap::new(), Some("t".to_string()));

        assert_eq!(params.custom_data, Some(json!({"authToken": "t"})));
    }

    #[test]
    fn test_params_deserialize_from_host_json() {
        let params: LoadMediaParams = serde_json::from_value(json!({
            "contentId": "https://cdn.example.com/a.mpd",
            "autoplay": true,
            "currentTime": 3,
            "streamType": "LIVE"
        }))
        .unwrap();

        assert_eq!(params.stream_type, Some(StreamType::Live));
        assert_eq!(params.current_time, 3.0);
        assert_eq!(params.duration, None);
    }

    #[test]
    fn test_token_from_url() {
        assert_eq!(
            token_from_url("https://cdn.example.com/live.m3u8?user=1&token=abc#t=10"),
            Some("abc".to_string())
        );
        assert_eq!(token_from_url("https://cdn.example.com/live.m3u8?token="), None);
        assert_eq!(token_from_url("https://cdn.example.com/live.m3u8?mytoken=x"), None);
        assert_eq!(token_from_url("https://cdn.example.com/token=abc/live.m3u8"), None);
    }

    #[test]
    fn test_secure_hls_defaults_and_markers() {
        let url = "https://cdn.example.com/secure/index.m3u8?token=s3cr3t";

        let request = SecureHlsParams::new(url)
            .into_load_params()
            .unwrap()
            .into_request()
            .unwrap();

        assert_eq!(request.media.content_type, HLS_CONTENT_TYPE);
        assert_eq!(request.media.stream_type, StreamType::Live);
        assert!(request.autoplay);
        assert_eq!(request.current_time_ms, 0);
        assert_eq!(
            request.custom_data,
            Some(json!({
                "authToken": "s3cr3t",
                "secureHLS": true,
                "originalUrl": url,
                "authType": "url_token",
                "contentType": "application/x-mpegURL"
            }))
        );
    }

    #[test]
    fn test_secure_hls_explicit_token_wins() {
        let params: SecureHlsParams = serde_json::from_value(json!({
            "contentId": "https://cdn.example.com/stream?token=from-url",
            "authToken": "explicit",
            "autoPlay": false,
            "customData": {"user": "42"}
        }))
        .unwrap();
        assert!(!params.autoplay);

        let custom_data = params.into_load_params().unwrap().custom_data.unwrap();

        assert_eq!(custom_data["authToken"], "explicit");
        assert_eq!(custom_data["user"], "42");
    }

    #[test]
    fn test_secure_hls_without_token_omits_it() {
        let params = SecureHlsParams::new("https://cdn.example.com/open.m3u8")
            .into_load_params()
            .unwrap();

        let custom_data = params.custom_data.unwrap();
        assert!(custom_data.get("authToken").is_none());
        assert_eq!(custom_data["secureHLS"], true);

        assert!(matches!(
            SecureHlsParams::new("").into_load_params(),
            Err(CastError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_send_message_result_shape() {
        let ok = SendMessageResult::from(Ok(()));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"success": true}));

        let failed = SendMessageResult::from(Err(CastError::provider(ProviderStatus::failure(
            2007, "buffer full",
        ))));
        assert!(!failed.success);
        assert_eq!(failed.code, Some(2007));
        assert!(failed.error.is_some());
    }
}
