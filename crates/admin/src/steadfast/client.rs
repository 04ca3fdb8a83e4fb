//! Steadfast REST API client.

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use dokan_shared::models::CourierSetting;

use super::types::{
    BalanceResponse, Consignment, CreateOrderRequest, CreateOrderResponse, ReturnRequest,
    ReturnRequestBody, StatusResponse,
};
use super::{DEFAULT_BASE_URL, SteadfastError};

/// Request timeout for every Steadfast call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the shared HTTP client used for Steadfast calls.
///
/// # Errors
///
/// Returns `reqwest::Error` if the TLS backend cannot be initialised.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("dokan-admin/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// The references Steadfast can look a parcel up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLookup<'a> {
    Consignment(i64),
    Invoice(&'a str),
    TrackingCode(&'a str),
}

impl StatusLookup<'_> {
    /// API path for this lookup, relative to the base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Consignment(id) => format!("status_by_cid/{id}"),
            Self::Invoice(invoice) => format!("status_by_invoice/{}", path_segment(invoice)),
            Self::TrackingCode(code) => {
                format!("status_by_trackingcode/{}", path_segment(code))
            }
        }
    }
}

/// Client for one Steadfast merchant account.
///
/// Cheap to build per request: the connection pool lives in the shared
/// `reqwest::Client`.
#[derive(Clone)]
pub struct SteadfastClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    secret_key: SecretString,
}

impl std::fmt::Debug for SteadfastClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteadfastClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SteadfastClient {
    /// Client for the account stored in `setting`.
    #[must_use]
    pub fn new(http: reqwest::Client, setting: &CourierSetting) -> Self {
        Self::with_credentials(
            http,
            setting.base_url.as_deref(),
            setting.api_key.clone(),
            setting.secret_key.clone(),
        )
    }

    /// Client with explicit credentials. `None` uses [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn with_credentials(
        http: reqwest::Client,
        base_url: Option<&str>,
        api_key: SecretString,
        secret_key: SecretString,
    ) -> Self {
        let base_url = base_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            http,
            base_url,
            api_key,
            secret_key,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Api-Key", self.api_key.expose_secret())
            .header("Secret-Key", self.secret_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SteadfastError> {
        let response = self.authed(self.http.get(self.url(path))).send().await?;
        read_response(response).await
    }

    async fn post<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SteadfastError> {
        let response = self
            .authed(self.http.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        read_response(response).await
    }

    /// Create a consignment.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError::Api` if Steadfast rejects the parcel (for
    /// example a duplicate invoice), or a transport error.
    #[instrument(skip(self, request), fields(invoice = %request.invoice))]
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Consignment, SteadfastError> {
        let response: CreateOrderResponse = self.post("create_order", request).await?;
        tracing::info!(
            consignment_id = response.consignment.consignment_id,
            tracking_code = %response.consignment.tracking_code,
            "Steadfast consignment created"
        );
        Ok(response.consignment)
    }

    /// Raw delivery status for a parcel.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError::Api` with status 404 when Steadfast does not
    /// know the reference, or another `SteadfastError` on failure.
    #[instrument(skip(self))]
    pub async fn status(&self, lookup: StatusLookup<'_>) -> Result<String, SteadfastError> {
        let response: StatusResponse = self.get(&lookup.path()).await?;
        Ok(response.delivery_status)
    }

    /// Delivery status by consignment id.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError` on API or transport failure.
    pub async fn status_by_consignment(&self, consignment_id: i64) -> Result<String, SteadfastError> {
        self.status(StatusLookup::Consignment(consignment_id)).await
    }

    /// Delivery status by our invoice (the order number).
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError` on API or transport failure.
    pub async fn status_by_invoice(&self, invoice: &str) -> Result<String, SteadfastError> {
        self.status(StatusLookup::Invoice(invoice)).await
    }

    /// Delivery status by Steadfast tracking code.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError` on API or transport failure.
    pub async fn status_by_tracking_code(&self, code: &str) -> Result<String, SteadfastError> {
        self.status(StatusLookup::TrackingCode(code)).await
    }

    /// Current merchant balance in taka.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError` on API or transport failure.
    #[instrument(skip(self))]
    pub async fn balance(&self) -> Result<Decimal, SteadfastError> {
        let response: BalanceResponse = self.get("get_balance").await?;
        Ok(response.current_balance)
    }

    /// Ask Steadfast to return a dispatched consignment.
    ///
    /// # Errors
    ///
    /// Returns `SteadfastError` on API or transport failure.
    #[instrument(skip(self, reason))]
    pub async fn create_return_request(
        &self,
        consignment_id: i64,
        reason: Option<String>,
    ) -> Result<ReturnRequest, SteadfastError> {
        let body = ReturnRequestBody {
            consignment_id,
            reason,
        };
        self.post("create_return_request", &body).await
    }
}

/// Keep only characters that are safe in a path segment.
fn path_segment(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SteadfastError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SteadfastError::Unauthorized);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(SteadfastError::RateLimited(retry_after));
    }

    let text = response.text().await?;
    let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        if status.is_success() {
            SteadfastError::Parse(e)
        } else {
            SteadfastError::Api {
                status: i64::from(status.as_u16()),
                message: format!("HTTP {status}"),
            }
        }
    })?;

    check_body(status, body)
}

/// Turn a decoded body into `T`, honouring the `status` field Steadfast
/// puts in its JSON.
fn check_body<T: DeserializeOwned>(
    http_status: StatusCode,
    body: serde_json::Value,
) -> Result<T, SteadfastError> {
    let body_status = body.get("status").and_then(serde_json::Value::as_i64);

    let failed = match body_status {
        Some(code) => code != 200,
        None => !http_status.is_success(),
    };

    if failed {
        return Err(SteadfastError::Api {
            status: body_status.unwrap_or_else(|| i64::from(http_status.as_u16())),
            message: error_message(&body),
        });
    }

    Ok(serde_json::from_value(body)?)
}

/// Best human-readable message from an error body.
fn error_message(body: &serde_json::Value) -> String {
    if let Some(message) = body.get("message").and_then(serde_json::Value::as_str) {
        return message.to_string();
    }

    // Validation failures: {"errors": {"field": ["msg", ...]}}
    if let Some(errors) = body.get("errors").and_then(serde_json::Value::as_object) {
        let messages: Vec<&str> = errors
            .values()
            .filter_map(serde_json::Value::as_array)
            .flatten()
            .filter_map(serde_json::Value::as_str)
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    "Unknown error".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_base_url_default_and_override() {
        let http = reqwest::Client::new();
        let key = || SecretString::from("key");

        let client = SteadfastClient::with_credentials(http.clone(), None, key(), key());
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.url("get_balance"), format!("{DEFAULT_BASE_URL}/get_balance"));

        let client = SteadfastClient::with_credentials(
            http.clone(),
            Some("https://sandbox.packzy.test/api/v1/"),
            key(),
            key(),
        );
        assert_eq!(client.url("/get_balance"), "https://sandbox.packzy.test/api/v1/get_balance");

        let client = SteadfastClient::with_credentials(http, Some("  "), key(), key());
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_debug_hides_keys() {
        let client = SteadfastClient::with_credentials(
            reqwest::Client::new(),
            None,
            SecretString::from("api-key-123456"),
            SecretString::from("secret-key-654321"),
        );
        let debug = format!("{client:?}");
        assert!(!debug.contains("api-key-123456"));
        assert!(!debug.contains("secret-key-654321"));
    }

    #[test]
    fn test_body_status_ok() {
        let response: StatusResponse = check_body(
            StatusCode::OK,
            json!({"status": 200, "delivery_status": "delivered"}),
        )
        .unwrap();
        assert_eq!(response.delivery_status, "delivered");
    }

    #[test]
    fn test_body_status_error_with_http_200() {
        let result: Result<StatusResponse, _> = check_body(
            StatusCode::OK,
            json!({"status": 404, "message": "Consignment not found"}),
        );
        match result {
            Err(SteadfastError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Consignment not found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors_joined() {
        let result: Result<StatusResponse, _> = check_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "status": 400,
                "errors": {"invoice": ["The invoice has already been taken."]}
            }),
        );
        match result {
            Err(SteadfastError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "The invoice has already been taken.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_return_request_string_status_accepted() {
        let response: ReturnRequest = check_body(
            StatusCode::OK,
            json!({"id": 91, "consignment_id": 1_424_107, "status": "pending"}),
        )
        .unwrap();
        assert_eq!(response.id, 91);
        assert_eq!(response.status.as_deref(), Some("pending"));
    }

    #[test]
    fn test_http_error_without_body_status() {
        let result: Result<StatusResponse, _> =
            check_body(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
        assert!(matches!(result, Err(SteadfastError::Api { status: 500, .. })));
    }

    #[test]
    fn test_status_lookup_paths() {
        let client = SteadfastClient::with_credentials(
            reqwest::Client::new(),
            None,
            SecretString::from("key"),
            SecretString::from("key"),
        );
        assert_eq!(
            client.url(&StatusLookup::Consignment(1_424_107).path()),
            format!("{DEFAULT_BASE_URL}/status_by_cid/1424107")
        );
        assert_eq!(
            client.url(&StatusLookup::Invoice("DK000042").path()),
            format!("{DEFAULT_BASE_URL}/status_by_invoice/DK000042")
        );
        assert_eq!(
            client.url(&StatusLookup::TrackingCode("15BAEB8A").path()),
            format!("{DEFAULT_BASE_URL}/status_by_trackingcode/15BAEB8A")
        );
        assert_eq!(
            StatusLookup::Invoice("DK/../000042").path(),
            "status_by_invoice/DK000042"
        );
    }

    #[test]
    fn test_path_segment_strips_separators() {
        assert_eq!(path_segment(" DK000042 "), "DK000042");
        assert_eq!(path_segment("../get_balance"), "get_balance");
    }
}
