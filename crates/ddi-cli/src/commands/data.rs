use std::fs;

use anyhow::anyhow;
use ddi_api_models::DailyEntry;

use crate::cli::{DailySubmitArgs, ExportArgs, ImportUploadArgs, today};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_status, render_value, write_bytes};

pub(crate) async fn handle_daily_submit(ctx: &AppContext, args: DailySubmitArgs) -> CliResult<()> {
    let entry = DailyEntry {
        store_id: ctx.store_id(args.store.store_id)?,
        product_id: args.product,
        date: args.date.unwrap_or_else(today),
        produced: args.produced,
        waste: args.waste,
    };
    let response = ctx.client.submit_daily_entry(&entry).await?;
    render_status(&response, "Entry saved.", ctx.output)
}

pub(crate) async fn handle_import_upload(
    ctx: &AppContext,
    args: ImportUploadArgs,
) -> CliResult<()> {
    let file_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            CliError::validation(format!("'{}' is not a file name", args.file.display()))
        })?
        .to_string();
    let contents = fs::read(&args.file).map_err(|err| {
        CliError::failure(anyhow!("failed to read {}: {err}", args.file.display()))
    })?;

    let result = ctx.client.upload_throwaways(&file_name, contents).await?;
    render_value(&result, ctx.output)
}

pub(crate) async fn handle_export(ctx: &AppContext, args: ExportArgs) -> CliResult<()> {
    let store_id = ctx.store_id(args.store.store_id)?;
    let workbook = ctx
        .client
        .export_throwaways(store_id, args.week_start)
        .await?;
    write_bytes(&args.out, &workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StoreArgs;
    use crate::commands::test_support::context_with;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn daily_submit_posts_entry() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/daily").json_body(json!({
                "store_id": 12345,
                "product_id": 3,
                "date": "2026-01-02",
                "produced": 48,
                "waste": 5
            }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "success"}));
        });

        let ctx = context_with(&server);
        handle_daily_submit(
            &ctx,
            DailySubmitArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                product: 3,
                date: NaiveDate::from_ymd_opt(2026, 1, 2),
                produced: 48,
                waste: 5,
            },
        )
        .await
        .expect("submit should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn waste_above_production_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server);
        let err = handle_daily_submit(
            &ctx,
            DailySubmitArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                product: 3,
                date: None,
                produced: 4,
                waste: 5,
            },
        )
        .await
        .expect_err("invalid quantities");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn import_uploads_file_contents() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/throwaway/upload_throwaways");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "success", "inserted": 2}));
        });

        let dir = TempDir::new().expect("temp dir");
        let file = dir.path().join("week.csv");
        fs::write(&file, "product,waste\nGlazed,3\nMunchkins,1\n").expect("write csv");

        let ctx = context_with(&server);
        handle_import_upload(&ctx, ImportUploadArgs { file })
            .await
            .expect("upload should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn export_writes_workbook_to_disk() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/throwaway/export")
                .query_param("store_id", "12345")
                .query_param("week_start", "2026-01-05");
            then.status(200)
                .header(
                    "content-type",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                )
                .body("PK-workbook");
        });

        let dir = TempDir::new().expect("temp dir");
        let out = dir.path().join("week.xlsx");
        let ctx = context_with(&server);
        handle_export(
            &ctx,
            ExportArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                week_start: NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"),
                out: out.clone(),
            },
        )
        .await
        .expect("export should succeed");
        mock.assert();
        assert_eq!(fs::read(&out).expect("exported file"), b"PK-workbook");
    }
}
