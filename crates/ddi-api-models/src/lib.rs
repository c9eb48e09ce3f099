#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
//! Shared HTTP DTOs for the Demand Intelligence REST API.
//!
//! The client and the CLI both encode requests and decode responses through
//! these types so the wire contract lives in one place. Payloads the backend
//! does not pin down (inventory, dashboard rows, forecast extras) stay as
//! `serde_json::Value` or carry a flattened `extra` map.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status string the backend uses for a successful auth/mutation response.
pub const STATUS_SUCCESS: &str = "success";

/// Authenticated user record returned by login and signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Backend identifier of the user.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login e-mail address.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Store managed by this user, when the account is bound to one.
    pub store_id: Option<i64>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account e-mail.
    pub email: String,
    /// Plain-text password (sent over TLS only).
    pub password: String,
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    /// Display name for the new account.
    pub name: String,
    /// Account e-mail.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Street address of the store the manager runs.
    pub store_address: String,
    /// Franchise store number.
    pub store_number: String,
}

/// Response of the login and signup endpoints.
///
/// The backend answers with a `status` string instead of relying only on the
/// HTTP status, so callers inspect [`AuthResponse::is_success`] and
/// `message` for application-level failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// `"success"` or a backend-defined failure marker.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// User record, present on success.
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable detail.
    pub message: Option<String>,
    #[serde(
        default,
        alias = "access_token",
        skip_serializing_if = "Option::is_none"
    )]
    /// Bearer token for deployments that hand the credential to the client.
    pub token: Option<String>,
}

impl AuthResponse {
    /// Whether the backend reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Generic `{status, message}` acknowledgement used by mutation endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Backend status marker.
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable detail.
    pub message: Option<String>,
    #[serde(flatten)]
    /// Fields not modelled explicitly.
    pub extra: Map<String, Value>,
}

impl StatusMessage {
    /// Whether the backend reported success (a missing status counts as success).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref().is_none_or(|status| status == STATUS_SUCCESS)
    }
}

/// Entry of `GET /products/list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Backend product identifier.
    pub product_id: i64,
    /// Display name.
    pub product_name: String,
    #[serde(default)]
    /// Product family, e.g. `donut` or `munchkin`.
    pub product_type: String,
    #[serde(default = "default_true")]
    /// Whether the product is still offered.
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Body of `POST /products/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateProductRequest {
    /// Name of the new product.
    pub product_name: String,
}

/// Lower/upper bound pair around a forecast value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// Response of `GET /forecast`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResponse {
    /// Predicted demand.
    pub forecast_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Confidence band, when the model produced one.
    pub confidence_interval: Option<ConfidenceInterval>,
    #[serde(flatten)]
    /// Additional backend fields (per-product breakdowns, model metadata, ...).
    pub extra: Map<String, Value>,
}

/// Body of `POST /forecast/raw`, asking the backend to generate a forecast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForecastGenerateRequest {
    /// Store to forecast.
    pub store_id: i64,
    /// Day to forecast.
    pub target_date: NaiveDate,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    /// Overall status marker.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Database connectivity description.
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Backend version string.
    pub version: Option<String>,
    #[serde(flatten)]
    /// Fields not modelled explicitly.
    pub extra: Map<String, Value>,
}

/// Body of `POST /daily`: one manual production/waste entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyEntry {
    /// Store the entry belongs to.
    pub store_id: i64,
    /// Product being reported.
    pub product_id: i64,
    /// Business day of the entry.
    pub date: NaiveDate,
    /// Units produced.
    pub produced: u32,
    /// Units thrown away.
    pub waste: u32,
}

/// Body of `POST /auth/forgot-password`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgotPasswordRequest {
    /// Account e-mail to send the reset link to.
    pub email: String,
}

/// Body of `POST /auth/validate-reset-token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetTokenRequest {
    /// Token taken from the reset link.
    pub token: String,
}

/// Response of `POST /auth/validate-reset-token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetTokenValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Explicit validity flag, when the backend sends one.
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Account the token belongs to.
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable detail.
    pub message: Option<String>,
}

/// Body of `POST /auth/reset-password`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetPasswordRequest {
    /// Token taken from the reset link.
    pub token: String,
    /// New password.
    pub password: String,
}

/// How the backend produced the QR code it returned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QrCodeStatus {
    /// A code already existed for the store.
    Existing,
    /// A code was created by this call.
    Created,
    /// A new code replaced the previous one.
    Regenerated,
}

impl QrCodeStatus {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Created => "created",
            Self::Regenerated => "regenerated",
        }
    }
}

/// Response of `GET /qr/store/{id}` and `POST /qr/regenerate/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QrCodeResponse {
    /// Store the code belongs to.
    pub store_id: i64,
    /// PNG image, base64 encoded.
    pub qr_base64: String,
    /// URL encoded in the QR code (the waste submission form).
    pub qr_url: String,
    /// How the code was produced.
    pub status: QrCodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable detail.
    pub message: Option<String>,
}

/// Response of `GET /qr/status/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QrStatusResponse {
    /// Store queried.
    pub store_id: i64,
    /// Whether a code exists.
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Creation timestamp as reported by the backend.
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Last regeneration timestamp as reported by the backend.
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_response_accepts_access_token_alias() -> Result<(), serde_json::Error> {
        let response: AuthResponse = serde_json::from_value(json!({
            "status": "success",
            "user": {"id": 1, "name": "Ann", "email": "a@b.com", "store_id": 12345},
            "access_token": "abc"
        }))?;
        assert!(response.is_success());
        assert_eq!(response.token.as_deref(), Some("abc"));
        assert_eq!(response.user.and_then(|user| user.store_id), Some(12345));
        Ok(())
    }

    #[test]
    fn auth_response_failure_has_no_user() -> Result<(), serde_json::Error> {
        let response: AuthResponse = serde_json::from_value(json!({
            "status": "error",
            "message": "Invalid credentials"
        }))?;
        assert!(!response.is_success());
        assert!(response.user.is_none());
        Ok(())
    }

    #[test]
    fn forecast_keeps_unmodelled_fields() -> Result<(), serde_json::Error> {
        let forecast: ForecastResponse = serde_json::from_value(json!({
            "forecast_value": 42.5,
            "confidence_interval": {"lower": 40.0, "upper": 45.0},
            "model": "ewma",
            "products": [{"name": "Glazed", "qty": 24}]
        }))?;
        assert!((forecast.forecast_value - 42.5).abs() < f64::EPSILON);
        assert_eq!(forecast.extra.get("model"), Some(&json!("ewma")));
        assert!(forecast.extra.contains_key("products"));
        Ok(())
    }

    #[test]
    fn product_defaults_optional_fields() -> Result<(), serde_json::Error> {
        let product: Product = serde_json::from_value(json!({
            "product_id": 3,
            "product_name": "Boston Kreme"
        }))?;
        assert!(product.is_active);
        assert!(product.product_type.is_empty());
        Ok(())
    }

    #[test]
    fn daily_entry_serializes_iso_date() -> Result<(), Box<dyn std::error::Error>> {
        let entry = DailyEntry {
            store_id: 1,
            product_id: 3,
            date: NaiveDate::from_ymd_opt(2026, 1, 2).ok_or("invalid date")?,
            produced: 48,
            waste: 5,
        };
        let value = serde_json::to_value(&entry)?;
        assert_eq!(value["date"], json!("2026-01-02"));
        Ok(())
    }

    #[test]
    fn status_message_without_status_counts_as_success() -> Result<(), serde_json::Error> {
        let ack: StatusMessage = serde_json::from_value(json!({"message": "saved"}))?;
        assert!(ack.is_success());
        let failed: StatusMessage = serde_json::from_value(json!({"status": "error"}))?;
        assert!(!failed.is_success());
        Ok(())
    }

    #[test]
    fn qr_status_uses_snake_case_labels() -> Result<(), serde_json::Error> {
        let qr: QrCodeResponse = serde_json::from_value(json!({
            "store_id": 12345,
            "qr_base64": "iVBORw0KGgo=",
            "qr_url": "https://example.test/waste?store=12345",
            "status": "regenerated"
        }))?;
        assert_eq!(qr.status, QrCodeStatus::Regenerated);
        assert_eq!(qr.status.as_str(), "regenerated");
        Ok(())
    }
}
