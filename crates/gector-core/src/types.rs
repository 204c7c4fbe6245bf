//! Request and response types for the `/gector` endpoint

use crate::corrector::SentenceHistory;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a correction request
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GectorRequest {
    /// Sentences to correct
    pub input_text: Vec<String>,

    /// Sentences per model call; falls back to the params file
    #[serde(default)]
    pub batch_size: Option<i64>,

    /// Normalize detokenized output; falls back to the params file
    #[serde(default)]
    pub to_normalize: Option<bool>,

    /// Decode parameter overrides
    #[serde(default)]
    pub model_params: Map<String, Value>,
}

/// Parse a raw request body.
///
/// A body that is not a JSON object, or an object without `input_text`,
/// is reported as [`Error::MissingInputText`]. Every other mismatch is a
/// serialization error.
pub fn parse_request(body: &[u8]) -> Result<GectorRequest> {
    let value: Value = serde_json::from_slice(body)?;

    match &value {
        Value::Object(map) if map.contains_key("input_text") => {}
        _ => return Err(Error::MissingInputText),
    }

    Ok(serde_json::from_value(value)?)
}

/// Outcome marker of a response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
}

/// Response envelope returned by `/gector`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GectorResponse {
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CorrectionResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl GectorResponse {
    /// Bare NG envelope without an error body
    pub fn ng() -> Self {
        Self {
            status: Status::Ng,
            result: None,
            error: None,
        }
    }

    /// Successful envelope
    pub fn ok(result: CorrectionResult) -> Self {
        Self {
            status: Status::Ok,
            result: Some(result),
            error: None,
        }
    }

    /// NG envelope with a message only
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Ng,
            result: None,
            error: Some(ErrorBody {
                msg: msg.into(),
                traceback: None,
            }),
        }
    }

    /// NG envelope for an error.
    ///
    /// A missing `input_text` keeps its fixed message; every other error
    /// becomes "Unexpected Error" with the cause chain attached.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::MissingInputText => Self::failure(err.to_string()),
            _ => Self {
                status: Status::Ng,
                result: None,
                error: Some(ErrorBody {
                    msg: "Unexpected Error".to_string(),
                    traceback: Some(err.traceback()),
                }),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Payload of a successful correction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrectionResult {
    /// Corrected sentences, in input order
    pub result: Vec<String>,

    /// Total number of sentence updates across all iterations
    pub n_correction: usize,

    /// Per-sentence version history
    pub history: Vec<SentenceHistory>,
}

/// Error details of an NG response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub msg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_request() {
        let req = parse_request(br#"{"input_text": ["a b c"]}"#).unwrap();
        assert_eq!(req.input_text, vec!["a b c"]);
        assert!(req.batch_size.is_none());
        assert!(req.to_normalize.is_none());
        assert!(req.model_params.is_empty());
    }

    #[test]
    fn test_parse_full_request() {
        let body = json!({
            "input_text": ["one", "two"],
            "batch_size": 4,
            "to_normalize": false,
            "model_params": {"iterations": 2}
        });
        let req = parse_request(body.to_string().as_bytes()).unwrap();
        assert_eq!(req.batch_size, Some(4));
        assert_eq!(req.to_normalize, Some(false));
        assert_eq!(req.model_params.get("iterations"), Some(&json!(2)));
    }

    #[test]
    fn test_missing_input_text() {
        let err = parse_request(br#"{"batch_size": 2}"#).unwrap_err();
        assert!(matches!(err, Error::MissingInputText));

        let err = parse_request(b"[1, 2]").unwrap_err();
        assert!(matches!(err, Error::MissingInputText));
    }

    #[test]
    fn test_wrongly_typed_input_text() {
        let err = parse_request(br#"{"input_text": "not a list"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_request(b"{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_ng_envelope_shape() {
        let value = serde_json::to_value(GectorResponse::ng()).unwrap();
        assert_eq!(value, json!({"status": "NG"}));

        let value = serde_json::to_value(GectorResponse::failure("Unsupported Media Type")).unwrap();
        assert_eq!(
            value,
            json!({"status": "NG", "error": {"msg": "Unsupported Media Type"}})
        );
    }

    #[test]
    fn test_unexpected_error_carries_traceback() {
        let resp = GectorResponse::from_error(&Error::model("boom"));
        let error = resp.error.unwrap();
        assert_eq!(error.msg, "Unexpected Error");
        assert!(error.traceback.unwrap().contains("model error: boom"));
    }

    #[test]
    fn test_ok_envelope_shape() {
        let resp = GectorResponse::ok(CorrectionResult {
            result: vec!["Hello world .".to_string()],
            n_correction: 1,
            history: vec![SentenceHistory {
                versions: vec!["hello world .".to_string(), "Hello world .".to_string()],
            }],
        });
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "OK");
        assert_eq!(value["result"]["n_correction"], 1);
        assert_eq!(value["result"]["history"][0][1], "Hello world .");
        assert!(value.get("error").is_none());
    }
}
