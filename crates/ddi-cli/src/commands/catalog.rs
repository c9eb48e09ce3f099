use crate::cli::ProductCreateArgs;
use crate::client::{AppContext, CliResult};
use crate::output::{render_health, render_products, render_status, render_value};

pub(crate) async fn handle_product_list(ctx: &AppContext) -> CliResult<()> {
    let products = ctx.client.get_products().await?;
    render_products(&products, ctx.output)
}

pub(crate) async fn handle_product_create(
    ctx: &AppContext,
    args: ProductCreateArgs,
) -> CliResult<()> {
    let response = ctx.client.create_product(&args.name).await?;
    let fallback = format!("Product '{}' created.", args.name.trim());
    render_status(&response, &fallback, ctx.output)
}

pub(crate) async fn handle_inventory(ctx: &AppContext) -> CliResult<()> {
    let inventory = ctx.client.get_inventory().await?;
    render_value(&inventory, ctx.output)
}

pub(crate) async fn handle_health(ctx: &AppContext) -> CliResult<()> {
    let health = ctx.client.health().await?;
    render_health(&health, ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CliError;
    use crate::commands::test_support::context_with;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn product_list_decodes_catalog() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/products/list");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"product_id": 1, "product_name": "Glazed", "product_type": "donut"},
                    {"product_id": 2, "product_name": "Munchkins", "is_active": false}
                ]));
        });

        let ctx = context_with(&server);
        handle_product_list(&ctx)
            .await
            .expect("listing should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn product_create_posts_name() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/products/create")
                .json_body(json!({"product_name": "Boston Kreme"}));
            then.status(201)
                .header("content-type", "application/json")
                .json_body(json!({"status": "success", "product_id": 9}));
        });

        let ctx = context_with(&server);
        handle_product_create(
            &ctx,
            ProductCreateArgs {
                name: " Boston Kreme ".to_string(),
            },
        )
        .await
        .expect("create should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn blank_product_name_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server);
        let err = handle_product_create(
            &ctx,
            ProductCreateArgs {
                name: "   ".to_string(),
            },
        )
        .await
        .expect_err("blank name");
        assert!(matches!(err, CliError::Validation(_)));
    }

    #[tokio::test]
    async fn inventory_requires_valid_session() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/inventory");
            then.status(401);
        });

        let ctx = context_with(&server);
        let err = handle_inventory(&ctx).await.expect_err("401 expected");
        assert!(err.display_message().contains("ddi login"));
    }
}
