use ddi_api_models::SignupRequest;
use ddi_client::validate_new_password;

use crate::cli::{ForgotPasswordArgs, LoginArgs, ResetPasswordArgs, ResetTokenArgs, SignupArgs};
use crate::client::{AppContext, CliError, CliResult, ENV_PASSWORD, resolve_secret};
use crate::output::{render_reset_token, render_status, render_user};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let email = required(&args.email, "email")?;
    let password = resolve_secret(args.password, Some(ENV_PASSWORD), "Password: ", "password")?;

    let response = ctx.client.login(email, &password).await?;
    match (&response.user, response.is_success()) {
        (Some(user), true) => {
            tracing::info!(user_id = user.id, "logged in");
            render_user(user, ctx.output)
        }
        _ => Err(CliError::validation(
            response
                .message
                .unwrap_or_else(|| "Login failed".to_string()),
        )),
    }
}

pub(crate) async fn handle_signup(ctx: &AppContext, args: SignupArgs) -> CliResult<()> {
    let password = resolve_secret(args.password, Some(ENV_PASSWORD), "Password: ", "password")?;
    let request = SignupRequest {
        name: required(&args.name, "name")?.to_string(),
        email: required(&args.email, "email")?.to_string(),
        password,
        store_address: required(&args.store_address, "store address")?.to_string(),
        store_number: required(&args.store_number, "store number")?.to_string(),
    };

    let response = ctx.client.signup(&request).await?;
    match (&response.user, response.is_success()) {
        (Some(user), true) => render_user(user, ctx.output),
        _ => Err(CliError::validation(
            response
                .message
                .unwrap_or_else(|| "Signup failed".to_string()),
        )),
    }
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    let was_logged_in = ctx.client.is_logged_in();
    ctx.client.logout().await;
    if was_logged_in {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

pub(crate) fn handle_whoami(ctx: &AppContext) -> CliResult<()> {
    let user = ctx
        .client
        .user()
        .ok_or_else(|| CliError::validation("not logged in; run `ddi login` first"))?;
    render_user(&user, ctx.output)
}

pub(crate) async fn handle_forgot_password(
    ctx: &AppContext,
    args: ForgotPasswordArgs,
) -> CliResult<()> {
    let response = ctx.client.forgot_password(&args.email).await?;
    render_status(
        &response,
        "If the address is registered, a reset link is on its way.",
        ctx.output,
    )
}

pub(crate) async fn handle_validate_reset_token(
    ctx: &AppContext,
    args: ResetTokenArgs,
) -> CliResult<()> {
    let validation = ctx.client.validate_reset_token(&args.token).await?;
    if validation.valid == Some(false) {
        return Err(CliError::validation(
            validation
                .message
                .unwrap_or_else(|| "Reset link is invalid or has expired".to_string()),
        ));
    }
    render_reset_token(&validation, ctx.output)
}

pub(crate) async fn handle_reset_password(
    ctx: &AppContext,
    args: ResetPasswordArgs,
) -> CliResult<()> {
    let password = resolve_secret(
        args.password,
        Some(ENV_PASSWORD),
        "New password: ",
        "password",
    )?;
    let confirm = match args.confirm {
        Some(confirm) => confirm,
        None if password_from_env(&password) => password.clone(),
        None => resolve_secret(None, None, "Confirm new password: ", "confirmation")?,
    };
    validate_new_password(&password, &confirm)?;

    let response = ctx
        .client
        .reset_password(&args.token, &password, &confirm)
        .await?;
    render_status(&response, "Password updated. You can now log in.", ctx.output)
}

/// A password that came from `DDI_PASSWORD` is its own confirmation.
fn password_from_env(password: &str) -> bool {
    std::env::var(ENV_PASSWORD).is_ok_and(|value| value == password)
}

fn required<'a>(value: &'a str, what: &str) -> CliResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed)
}
