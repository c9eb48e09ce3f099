//! Resource operations: catalog, forecasts, inventory, data entry, QR codes.
//!
//! Each operation is a single round trip over the core request pipeline; no
//! caching, retry, or pagination happens here.

use chrono::NaiveDate;
use ddi_api_models::{
    CreateProductRequest, DailyEntry, ForecastGenerateRequest, ForecastResponse, HealthResponse,
    Product, QrCodeResponse, QrStatusResponse, StatusMessage,
};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::client::{ApiClient, RequestBody, with_query};
use crate::error::ApiError;

const PRODUCTS_LIST_ENDPOINT: &str = "/products/list";
const PRODUCTS_CREATE_ENDPOINT: &str = "/products/create";
const FORECAST_ENDPOINT: &str = "/forecast";
const FORECAST_GENERATE_ENDPOINT: &str = "/forecast/raw";
const FORECAST_HISTORY_ENDPOINT: &str = "/forecast_history";
const INVENTORY_ENDPOINT: &str = "/inventory";
const HEALTH_ENDPOINT: &str = "/health";
const DAILY_ENDPOINT: &str = "/daily";
const THROWAWAY_UPLOAD_ENDPOINT: &str = "/throwaway/upload_throwaways";
const THROWAWAY_EXPORT_ENDPOINT: &str = "/throwaway/export";
const DASHBOARD_DAILY_ENDPOINT: &str = "/dashboard/daily";
const DASHBOARD_ACCURACY_ENDPOINT: &str = "/dashboard/accuracy";

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";
const CSV_MIME: &str = "text/csv";

impl ApiClient {
    /// Fetch the product catalog.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn get_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json(PRODUCTS_LIST_ENDPOINT).await
    }

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a blank name, otherwise the
    /// normalized request error.
    pub async fn create_product(&self, name: &str) -> Result<StatusMessage, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Product name is required"));
        }
        self.post_json(
            PRODUCTS_CREATE_ENDPOINT,
            &CreateProductRequest {
                product_name: name.to_string(),
            },
        )
        .await
    }

    /// Fetch the forecast for a store, optionally for a specific day.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn get_forecast(
        &self,
        store_id: i64,
        target_date: Option<NaiveDate>,
    ) -> Result<ForecastResponse, ApiError> {
        let mut pairs = vec![("store_id", store_id.to_string())];
        if let Some(date) = target_date {
            pairs.push(("target_date", date.to_string()));
        }
        self.get_json(&with_query(FORECAST_ENDPOINT, &pairs)).await
    }

    /// Ask the backend to generate a forecast for a store and day.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn generate_forecast(
        &self,
        store_id: i64,
        target_date: NaiveDate,
    ) -> Result<Value, ApiError> {
        self.post_json(
            FORECAST_GENERATE_ENDPOINT,
            &ForecastGenerateRequest {
                store_id,
                target_date,
            },
        )
        .await
    }

    /// Forecast-versus-actual history for the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn forecast_history(&self, store_id: i64, days: u32) -> Result<Value, ApiError> {
        let path = with_query(
            FORECAST_HISTORY_ENDPOINT,
            &[("store_id", store_id.to_string()), ("days", days.to_string())],
        );
        self.get_json(&path).await
    }

    /// Fetch inventory; the shape is backend-defined and passed through.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn get_inventory(&self) -> Result<Value, ApiError> {
        self.get_json(INVENTORY_ENDPOINT).await
    }

    /// Fetch backend health.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get_json(HEALTH_ENDPOINT).await
    }

    /// Record one day of production and waste for a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when waste exceeds production,
    /// otherwise the normalized request error.
    pub async fn submit_daily_entry(&self, entry: &DailyEntry) -> Result<StatusMessage, ApiError> {
        if entry.waste > entry.produced {
            return Err(ApiError::validation(
                "Waste cannot exceed the quantity produced",
            ));
        }
        self.post_json(DAILY_ENDPOINT, entry).await
    }

    /// Upload a throwaway spreadsheet for server-side import.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for empty files or unsupported
    /// extensions, otherwise the normalized request error.
    pub async fn upload_throwaways(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Value, ApiError> {
        if contents.is_empty() {
            return Err(ApiError::validation("The selected file is empty"));
        }
        let mime = spreadsheet_mime(file_name).ok_or_else(|| {
            ApiError::validation("Only .xlsx, .xls, and .csv files can be imported")
        })?;
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|err| ApiError::Encode {
                detail: err.to_string(),
            })?;
        let form = Form::new().part("file", part);
        self.request_multipart(THROWAWAY_UPLOAD_ENDPOINT, form).await
    }

    /// Download the weekly throwaway workbook starting at `week_start`.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn export_throwaways(
        &self,
        store_id: i64,
        week_start: NaiveDate,
    ) -> Result<Vec<u8>, ApiError> {
        let path = with_query(
            THROWAWAY_EXPORT_ENDPOINT,
            &[
                ("store_id", store_id.to_string()),
                ("week_start", week_start.to_string()),
            ],
        );
        self.request_bytes(&path, Method::GET, RequestBody::Empty)
            .await
    }

    /// Per-product snapshot of forecast, production, sales, and waste for a day.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn dashboard_daily(&self, store_id: i64, date: NaiveDate) -> Result<Value, ApiError> {
        let path = with_query(
            DASHBOARD_DAILY_ENDPOINT,
            &[("store_id", store_id.to_string()), ("date", date.to_string())],
        );
        self.get_json(&path).await
    }

    /// Average forecast error per day over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn dashboard_accuracy(&self, store_id: i64, days: u32) -> Result<Value, ApiError> {
        let path = with_query(
            DASHBOARD_ACCURACY_ENDPOINT,
            &[("store_id", store_id.to_string()), ("days", days.to_string())],
        );
        self.get_json(&path).await
    }

    /// Fetch the store's waste-submission QR code, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn get_store_qr(&self, store_id: i64) -> Result<QrCodeResponse, ApiError> {
        self.get_json(&format!("/qr/store/{store_id}")).await
    }

    /// Whether a QR code exists for the store.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn qr_status(&self, store_id: i64) -> Result<QrStatusResponse, ApiError> {
        self.get_json(&format!("/qr/status/{store_id}")).await
    }

    /// Download the QR code as PNG, with or without the printable header.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn download_qr(&self, store_id: i64, with_header: bool) -> Result<Vec<u8>, ApiError> {
        let path = if with_header {
            format!("/qr/download/{store_id}")
        } else {
            format!("/qr/download/{store_id}/simple")
        };
        self.request_bytes(&path, Method::GET, RequestBody::Empty)
            .await
    }

    /// Replace the store's QR code with a new one.
    ///
    /// # Errors
    ///
    /// Returns the normalized request error.
    pub async fn regenerate_qr(&self, store_id: i64) -> Result<QrCodeResponse, ApiError> {
        self.send_json(&format!("/qr/regenerate/{store_id}"), Method::POST, None)
            .await
    }
}

fn spreadsheet_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "xlsx" => Some(XLSX_MIME),
        "xls" => Some(XLS_MIME),
        "csv" => Some(CSV_MIME),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_mime_matches_extension_case_insensitively() {
        assert_eq!(spreadsheet_mime("week.XLSX"), Some(XLSX_MIME));
        assert_eq!(spreadsheet_mime("legacy.xls"), Some(XLS_MIME));
        assert_eq!(spreadsheet_mime("dump.csv"), Some(CSV_MIME));
        assert_eq!(spreadsheet_mime("notes.txt"), None);
        assert_eq!(spreadsheet_mime("no_extension"), None);
    }
}
