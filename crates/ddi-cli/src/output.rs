//! Output renderers and formatting helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::anyhow;
use ddi_api_models::{
    ForecastResponse, HealthResponse, Product, QrCodeResponse, QrStatusResponse,
    ResetTokenValidation, StatusMessage, User,
};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_user(user: &User, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(user)?,
        OutputFormat::Table => {
            println!("id: {}", user.id);
            println!("name: {}", user.name);
            println!("email: {}", user.email);
            if let Some(store_id) = user.store_id {
                println!("store: {store_id}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_products(products: &[Product], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(products)?,
        OutputFormat::Table => {
            println!("{:>6} {:<12} {:<6} NAME", "ID", "TYPE", "ACTIVE");
            for product in products {
                println!(
                    "{:>6} {:<12} {:<6} {}",
                    product.product_id,
                    display_or_dash(&product.product_type),
                    if product.is_active { "yes" } else { "no" },
                    product.product_name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_forecast(forecast: &ForecastResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(forecast)?,
        OutputFormat::Table => {
            println!("forecast: {:.1}", forecast.forecast_value);
            if let Some(interval) = &forecast.confidence_interval {
                println!("interval: {:.1} .. {:.1}", interval.lower, interval.upper);
            }
            for (key, value) in &forecast.extra {
                println!("{key}: {}", inline_value(value));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_health(health: &HealthResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(health)?,
        OutputFormat::Table => {
            println!("status: {}", health.status);
            if let Some(database) = &health.database {
                println!("database: {database}");
            }
            if let Some(version) = &health.version {
                println!("version: {version}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_status(
    message: &StatusMessage,
    fallback: &str,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(message)?,
        OutputFormat::Table => println!("{}", message.message.as_deref().unwrap_or(fallback)),
    }
    Ok(())
}

pub(crate) fn render_reset_token(
    validation: &ResetTokenValidation,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(validation)?,
        OutputFormat::Table => {
            let valid = validation.valid.unwrap_or(true);
            println!("valid: {}", if valid { "yes" } else { "no" });
            if let Some(email) = &validation.email {
                println!("email: {email}");
            }
            if let Some(message) = &validation.message {
                println!("message: {message}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_qr(qr: &QrCodeResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(qr)?,
        OutputFormat::Table => {
            println!("store: {}", qr.store_id);
            println!("status: {}", qr.status.as_str());
            println!("url: {}", qr.qr_url);
            if let Some(message) = &qr.message {
                println!("message: {message}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_qr_status(status: &QrStatusResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(status)?,
        OutputFormat::Table => {
            println!("store: {}", status.store_id);
            println!("exists: {}", if status.exists { "yes" } else { "no" });
            if let Some(created) = &status.created_at {
                println!("created: {created}");
            }
            if let Some(updated) = &status.updated_at {
                println!("updated: {updated}");
            }
        }
    }
    Ok(())
}

/// Render a backend-defined payload: arrays of objects become rows, objects become `key: value` lines.
pub(crate) fn render_value(value: &Value, format: OutputFormat) -> CliResult<()> {
    match (format, value) {
        (OutputFormat::Json, _) => print_json(value)?,
        (OutputFormat::Table, Value::Array(rows)) => {
            if rows.is_empty() {
                println!("(no rows)");
            }
            for row in rows {
                match row {
                    Value::Object(map) => {
                        let line = map
                            .iter()
                            .map(|(key, value)| format!("{key}={}", inline_value(value)))
                            .collect::<Vec<_>>()
                            .join("  ");
                        println!("{line}");
                    }
                    other => println!("{}", inline_value(other)),
                }
            }
        }
        (OutputFormat::Table, Value::Object(map)) => {
            for (key, value) in map {
                println!("{key}: {}", inline_value(value));
            }
        }
        (OutputFormat::Table, other) => println!("{}", inline_value(other)),
    }
    Ok(())
}

pub(crate) fn write_bytes(path: &Path, bytes: &[u8]) -> CliResult<()> {
    fs::write(path, bytes)
        .map_err(|err| CliError::failure(anyhow!("failed to write {}: {err}", path.display())))?;
    println!("wrote {} ({})", path.display(), format_bytes(bytes.len()));
    Ok(())
}

fn inline_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

const fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

#[must_use]
pub(crate) fn format_bytes(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = KIB * 1024;
    if bytes >= MIB {
        format!("{:.2} MiB", ratio(bytes, MIB))
    } else if bytes >= KIB {
        format!("{:.2} KiB", ratio(bytes, KIB))
    } else {
        format!("{bytes} B")
    }
}

fn ratio(value: usize, unit: usize) -> f64 {
    let whole = u32::try_from(value / unit).unwrap_or(u32::MAX);
    let rest = u32::try_from(value % unit).unwrap_or(0);
    let unit = u32::try_from(unit).unwrap_or(u32::MAX);
    f64::from(whole) + f64::from(rest) / f64::from(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_bytes_picks_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
    }

    #[test]
    fn inline_value_unquotes_strings() {
        assert_eq!(inline_value(&json!("Glazed")), "Glazed");
        assert_eq!(inline_value(&json!(null)), "-");
        assert_eq!(inline_value(&json!(12)), "12");
    }

    #[test]
    fn render_value_accepts_every_shape() -> Result<(), CliError> {
        render_value(&json!([{"product": "Glazed", "waste": 3}]), OutputFormat::Table)?;
        render_value(&json!([]), OutputFormat::Table)?;
        render_value(&json!({"avg_error": 1.5}), OutputFormat::Table)?;
        render_value(&json!("ok"), OutputFormat::Json)?;
        Ok(())
    }

    #[test]
    fn write_bytes_creates_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("qr.png");
        write_bytes(&path, b"\x89PNG")?;
        assert_eq!(fs::read(&path)?, b"\x89PNG");
        Ok(())
    }
}
