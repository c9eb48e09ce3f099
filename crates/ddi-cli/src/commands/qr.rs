use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose};

use crate::cli::{QrDownloadArgs, QrShowArgs, StoreArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_qr, render_qr_status, write_bytes};

pub(crate) async fn handle_qr_show(ctx: &AppContext, args: QrShowArgs) -> CliResult<()> {
    let store_id = ctx.store_id(args.store.store_id)?;
    let qr = ctx.client.get_store_qr(store_id).await?;
    render_qr(&qr, ctx.output)?;
    if let Some(path) = &args.save {
        let png = decode_png(&qr.qr_base64)?;
        write_bytes(path, &png)?;
    }
    Ok(())
}

pub(crate) async fn handle_qr_status(ctx: &AppContext, args: StoreArgs) -> CliResult<()> {
    let store_id = ctx.store_id(args.store_id)?;
    let status = ctx.client.qr_status(store_id).await?;
    render_qr_status(&status, ctx.output)
}

pub(crate) async fn handle_qr_download(ctx: &AppContext, args: QrDownloadArgs) -> CliResult<()> {
    let store_id = ctx.store_id(args.store.store_id)?;
    let png = ctx.client.download_qr(store_id, !args.simple).await?;
    write_bytes(&args.out, &png)
}

pub(crate) async fn handle_qr_regenerate(ctx: &AppContext, args: StoreArgs) -> CliResult<()> {
    let store_id = ctx.store_id(args.store_id)?;
    let qr = ctx.client.regenerate_qr(store_id).await?;
    render_qr(&qr, ctx.output)
}

fn decode_png(encoded: &str) -> CliResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| CliError::failure(anyhow!("QR image payload is not valid base64: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    use crate::commands::test_support::context_with;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

    fn qr_body(status: &str) -> serde_json::Value {
        json!({
            "store_id": 12345,
            "qr_base64": general_purpose::STANDARD.encode(PNG_MAGIC),
            "qr_url": "https://example.test/waste-submit?store=12345",
            "status": status
        })
    }

    #[tokio::test]
    async fn show_saves_embedded_png() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/qr/store/12345");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(qr_body("existing"));
        });

        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("store.png");
        let ctx = context_with(&server);
        handle_qr_show(
            &ctx,
            QrShowArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                save: Some(path.clone()),
            },
        )
        .await
        .expect("show should succeed");
        mock.assert();
        assert_eq!(fs::read(&path).expect("saved png"), PNG_MAGIC);
    }

    #[tokio::test]
    async fn download_uses_simple_variant_when_requested() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/v1/qr/download/12345/simple");
            then.status(200)
                .header("content-type", "image/png")
                .body(PNG_MAGIC);
        });

        let dir = TempDir::new().expect("temp dir");
        let out = dir.path().join("qr.png");
        let ctx = context_with(&server);
        handle_qr_download(
            &ctx,
            QrDownloadArgs {
                store: StoreArgs {
                    store_id: Some(12345),
                },
                simple: true,
                out: out.clone(),
            },
        )
        .await
        .expect("download should succeed");
        mock.assert();
        assert_eq!(fs::read(&out).expect("downloaded png"), PNG_MAGIC);
    }

    #[tokio::test]
    async fn regenerate_posts_to_store() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/qr/regenerate/12345");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(qr_body("regenerated"));
        });

        let ctx = context_with(&server);
        handle_qr_regenerate(
            &ctx,
            StoreArgs {
                store_id: Some(12345),
            },
        )
        .await
        .expect("regenerate should succeed");
        mock.assert();
    }

    #[test]
    fn decode_png_rejects_garbage() {
        assert!(decode_png("not base64!").is_err());
        assert_eq!(
            decode_png(&general_purpose::STANDARD.encode(PNG_MAGIC)).ok(),
            Some(PNG_MAGIC.to_vec())
        );
    }
}
