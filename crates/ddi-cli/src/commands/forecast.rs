use chrono::NaiveDate;

use crate::cli::{DashboardDailyArgs, ForecastGenerateArgs, ForecastGetArgs, HistoryArgs, today};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_forecast, render_value};

pub(crate) async fn handle_forecast_get(ctx: &AppContext, args: ForecastGetArgs) -> CliResult<()> {
    let store_id = ctx.store_id(args.store.store_id)?;
    let forecast = ctx.client.get_forecast(store_id, args.date).await?;
    render_forecast(&forecast, ctx.output)
}

pub(crate) async fn handle_forecast_generate(
    ctx: &AppContext,
    args: ForecastGenerateArgs,
) -> CliResult<()> {
    let store_id = ctx.store_id(args.store.store_id)?;
    let date = args.date.unwrap_or_else(tomorrow);
    let result = ctx.client.generate_forecast(store_id, date).await?;
    render_value(&result, ctx.output)
}

pub(crate) async fn handle_forecast_history(ctx: &AppContext, args: HistoryArgs) -> CliResult<()> {
    let (store_id, days) = history_window(ctx, &args)?;
    let history = ctx.client.forecast_history(store_id, days).await?;
    render_value(&history, ctx.output)
}

pub(crate) async fn handle_dashboard_daily(
    ctx: &AppContext,
    args: DashboardDailyArgs,
) -> CliResult<()> {
    let store_id = ctx.store_id(args.store.store_id)?;
    let date = args.date.unwrap_or_else(today);
    let snapshot = ctx.client.dashboard_daily(store_id, date).await?;
    render_value(&snapshot, ctx.output)
}

pub(crate) async fn handle_dashboard_accuracy(
    ctx: &AppContext,
    args: HistoryArgs,
) -> CliResult<()> {
    let (store_id, days) = history_window(ctx, &args)?;
    let accuracy = ctx.client.dashboard_accuracy(store_id, days).await?;
    render_value(&accuracy, ctx.output)
}

/// Forecasts are generated for the following day unless a date is given.
fn tomorrow() -> NaiveDate {
    let today = today();
    today.succ_opt().unwrap_or(today)
}

fn history_window(ctx: &AppContext, args: &HistoryArgs) -> CliResult<(i64, u32)> {
    if args.days == 0 {
        return Err(CliError::validation("--days must be at least 1"));
    }
    Ok((ctx.store_id(args.store.store_id)?, args.days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StoreArgs;
    use crate::commands::test_support::{context_with, login_body};
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn forecast_get_sends_store_and_date() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/forecast")
                .query_param("store_id", "12345")
                .query_param("target_date", "2026-01-02");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"forecast_value": 120.0, "product": "Glazed"}));
        });

        let ctx = context_with(&server);
        handle_forecast_get(
            &ctx,
            ForecastGetArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                date: NaiveDate::from_ymd_opt(2026, 1, 2),
            },
        )
        .await
        .expect("forecast should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn store_defaults_to_signed_in_user() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(login_body());
        });
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/dashboard/accuracy")
                .query_param("store_id", "12345")
                .query_param("days", "7");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{"date": "2026-01-01", "avg_error": 2.5}]));
        });

        let ctx = context_with(&server);
        ctx.client.login("a@b.com", "pw").await.expect("login");
        handle_dashboard_accuracy(
            &ctx,
            HistoryArgs {
                store: StoreArgs::default(),
                days: 7,
            },
        )
        .await
        .expect("accuracy should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn missing_store_is_a_validation_error() {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server);
        let err = handle_forecast_history(
            &ctx,
            HistoryArgs {
                store: StoreArgs::default(),
                days: 14,
            },
        )
        .await
        .expect_err("no store");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn generate_posts_store_and_day() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/forecast/raw")
                .json_body(json!({"store_id": 12345, "target_date": "2026-01-02"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "success", "rows": 12}));
        });

        let ctx = context_with(&server);
        handle_forecast_generate(
            &ctx,
            ForecastGenerateArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                date: NaiveDate::from_ymd_opt(2026, 1, 2),
            },
        )
        .await
        .expect("generate should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn generate_defaults_to_tomorrow() {
        let expected = today()
            .succ_opt()
            .expect("tomorrow exists")
            .format("%Y-%m-%d")
            .to_string();
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/forecast/raw")
                .json_body(json!({"store_id": 12345, "target_date": expected}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "success"}));
        });

        let ctx = context_with(&server);
        handle_forecast_generate(
            &ctx,
            ForecastGenerateArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                date: None,
            },
        )
        .await
        .expect("generate should succeed");
        mock.assert();
    }
}
