//! Request and response bodies of the two backend functions.
//!
//! Field names are camelCase on the wire to match the browser client.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use validator::Validate;

/// Body of `POST /functions/simplify-text`.
///
/// Title and content lengths are counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SimplifyTextRequest {
    /// Event headline.
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    /// Event narrative.
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    /// Event type tag.
    pub event_type: String,
}

/// Successful reply of `POST /functions/simplify-text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimplifyTextResponse {
    /// Plain-language rewrite.
    pub simplified: String,
}

/// Body of `POST /functions/verify-admin-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VerifyPasswordRequest {
    /// Password to check.
    pub password: String,
}

/// Reply of `POST /functions/verify-admin-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct VerifyPasswordResponse {
    /// Whether the password matched.
    pub success: bool,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
    /// Bearer token for the admin API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub token: Option<String>,
    /// Token expiry in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub expires_at: Option<i64>,
}

impl VerifyPasswordResponse {
    /// A successful check carrying a token.
    pub const fn granted(token: String, expires_at: i64) -> Self {
        Self {
            success: true,
            error: None,
            token: Some(token),
            expires_at: Some(expires_at),
        }
    }

    /// A failed check.
    pub fn denied(reason: &str) -> Self {
        Self {
            success: false,
            error: Some(reason.to_owned()),
            token: None,
            expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify_request_uses_camel_case() {
        let json = r#"{"title":"t","content":"c","eventType":"trade"}"#;
        let req: Result<SimplifyTextRequest, _> = serde_json::from_str(json);
        assert_eq!(req.ok().map(|r| r.event_type), Some("trade".to_owned()));
    }

    #[test]
    fn length_limits_count_characters() {
        let ok = SimplifyTextRequest {
            title: "é".repeat(500),
            content: "x".to_owned(),
            event_type: "speech".to_owned(),
        };
        assert!(ok.validate().is_ok());

        let too_long = SimplifyTextRequest {
            title: "x".repeat(501),
            ..ok.clone()
        };
        assert!(too_long.validate().is_err());

        let empty = SimplifyTextRequest {
            content: String::new(),
            ..ok
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn denied_response_omits_token_fields() {
        let json = serde_json::to_value(VerifyPasswordResponse::denied("Invalid password"));
        assert_eq!(
            json.ok(),
            Some(serde_json::json!({"success": false, "error": "Invalid password"}))
        );
    }

    #[test]
    fn granted_response_uses_expires_at() {
        let json = serde_json::to_value(VerifyPasswordResponse::granted("tok".to_owned(), 42));
        assert_eq!(
            json.ok(),
            Some(serde_json::json!({"success": true, "token": "tok", "expiresAt": 42}))
        );
    }
}
