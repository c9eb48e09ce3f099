//! Argument parsing and command dispatch for the `ddi` binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use ddi_client::config::{
    ENV_API_URL, ENV_HTTP_TIMEOUT_SECS, ENV_SESSION_FILE, ENV_SESSION_MODE, parse_base_url,
};
use ddi_client::{DEFAULT_API_URL, SessionMode};
use ddi_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, in_command_span, init_logging};
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, ENV_PASSWORD};
use crate::commands::auth::{
    handle_forgot_password, handle_login, handle_logout, handle_reset_password, handle_signup,
    handle_validate_reset_token, handle_whoami,
};
use crate::commands::catalog::{
    handle_health, handle_inventory, handle_product_create, handle_product_list,
};
use crate::commands::data::{handle_daily_submit, handle_export, handle_import_upload};
use crate::commands::forecast::{
    handle_dashboard_accuracy, handle_dashboard_daily, handle_forecast_generate,
    handle_forecast_get, handle_forecast_history,
};
use crate::commands::qr::{
    handle_qr_download, handle_qr_regenerate, handle_qr_show, handle_qr_status,
};

const DEFAULT_HISTORY_DAYS: u32 = 14;

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.map_or_else(LogFormat::infer, LogFormat::from),
        build_sha: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let result = in_command_span(command_name, &trace_id, async {
        let ctx = AppContext::from_cli(&cli, &trace_id)?;
        dispatch(cli.command, &ctx).await
    })
    .await;

    match result {
        Ok(()) => {
            tracing::debug!(command = command_name, "command completed");
            0
        }
        Err(err) => {
            let message = err.display_message();
            tracing::debug!(command = command_name, error = %message, "command failed");
            eprintln!("error: {message}");
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Signup(args) => handle_signup(ctx, args).await,
        Command::Logout => handle_logout(ctx).await,
        Command::Whoami => handle_whoami(ctx),
        Command::Health => handle_health(ctx).await,
        Command::Inventory => handle_inventory(ctx).await,
        Command::Products(products) => match products {
            ProductCommand::List => handle_product_list(ctx).await,
            ProductCommand::Create(args) => handle_product_create(ctx, args).await,
        },
        Command::Forecast(forecast) => match forecast {
            ForecastCommand::Get(args) => handle_forecast_get(ctx, args).await,
            ForecastCommand::Generate(args) => handle_forecast_generate(ctx, args).await,
            ForecastCommand::History(args) => handle_forecast_history(ctx, args).await,
        },
        Command::Dashboard(dashboard) => match dashboard {
            DashboardCommand::Daily(args) => handle_dashboard_daily(ctx, args).await,
            DashboardCommand::Accuracy(args) => handle_dashboard_accuracy(ctx, args).await,
        },
        Command::Daily(daily) => match daily {
            DailyCommand::Submit(args) => handle_daily_submit(ctx, args).await,
        },
        Command::Import(import) => match import {
            ImportCommand::Upload(args) => handle_import_upload(ctx, args).await,
        },
        Command::Export(args) => handle_export(ctx, args).await,
        Command::Qr(qr) => match qr {
            QrCommand::Show(args) => handle_qr_show(ctx, args).await,
            QrCommand::Status(args) => handle_qr_status(ctx, args).await,
            QrCommand::Download(args) => handle_qr_download(ctx, args).await,
            QrCommand::Regenerate(args) => handle_qr_regenerate(ctx, args).await,
        },
        Command::Password(password) => match password {
            PasswordCommand::Forgot(args) => handle_forgot_password(ctx, args).await,
            PasswordCommand::Validate(args) => handle_validate_reset_token(ctx, args).await,
            PasswordCommand::Reset(args) => handle_reset_password(ctx, args).await,
        },
    }
}

#[derive(Parser)]
#[command(
    name = "ddi",
    version,
    about = "Command-line client for Demand Intelligence forecasting and waste tracking"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = ENV_API_URL,
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = ENV_HTTP_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Per-request timeout in seconds (no timeout when unset)"
    )]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        env = ENV_SESSION_MODE,
        value_parser = parse_session_mode,
        default_value = "durable",
        help = "durable keeps the session on disk; ephemeral uses a cookie for this run only"
    )]
    pub(crate) session_mode: SessionMode,
    #[arg(long, global = true, env = ENV_SESSION_FILE)]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "DDI_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "DDI_LOG_FORMAT", value_enum)]
    pub(crate) log_format: Option<LogFormatArg>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in and keep the session for later commands.
    Login(LoginArgs),
    /// Create an account and sign in with it.
    Signup(SignupArgs),
    /// End the session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Check backend health.
    Health,
    /// Show current inventory.
    Inventory,
    #[command(subcommand)]
    Products(ProductCommand),
    #[command(subcommand)]
    Forecast(ForecastCommand),
    #[command(subcommand)]
    Dashboard(DashboardCommand),
    #[command(subcommand)]
    Daily(DailyCommand),
    #[command(subcommand)]
    Import(ImportCommand),
    /// Download the weekly throwaway workbook.
    Export(ExportArgs),
    #[command(subcommand)]
    Qr(QrCommand),
    #[command(subcommand)]
    Password(PasswordCommand),
}

#[derive(Subcommand)]
pub(crate) enum ProductCommand {
    List,
    Create(ProductCreateArgs),
}

#[derive(Subcommand)]
pub(crate) enum ForecastCommand {
    Get(ForecastGetArgs),
    Generate(ForecastGenerateArgs),
    History(HistoryArgs),
}

#[derive(Subcommand)]
pub(crate) enum DashboardCommand {
    Daily(DashboardDailyArgs),
    Accuracy(HistoryArgs),
}

#[derive(Subcommand)]
pub(crate) enum DailyCommand {
    Submit(DailySubmitArgs),
}

#[derive(Subcommand)]
pub(crate) enum ImportCommand {
    Upload(ImportUploadArgs),
}

#[derive(Subcommand)]
pub(crate) enum QrCommand {
    Show(QrShowArgs),
    Status(StoreArgs),
    Download(QrDownloadArgs),
    Regenerate(StoreArgs),
}

#[derive(Subcommand)]
pub(crate) enum PasswordCommand {
    Forgot(ForgotPasswordArgs),
    Validate(ResetTokenArgs),
    Reset(ResetPasswordArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = ENV_PASSWORD, hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct SignupArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) store_address: String,
    #[arg(long)]
    pub(crate) store_number: String,
    #[arg(long, env = ENV_PASSWORD, hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct ProductCreateArgs {
    #[arg(help = "Display name of the new product")]
    pub(crate) name: String,
}

#[derive(Args, Default)]
pub(crate) struct StoreArgs {
    #[arg(long = "store", help = "Store identifier (defaults to the signed-in user's store)")]
    pub(crate) store_id: Option<i64>,
}

#[derive(Args)]
pub(crate) struct ForecastGetArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long, value_parser = parse_date, help = "Target day (YYYY-MM-DD)")]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args)]
pub(crate) struct ForecastGenerateArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long, value_parser = parse_date, help = "Target day (YYYY-MM-DD), defaults to tomorrow")]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args)]
pub(crate) struct HistoryArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
    pub(crate) days: u32,
}

#[derive(Args)]
pub(crate) struct DashboardDailyArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long, value_parser = parse_date, help = "Day to summarise (YYYY-MM-DD), defaults to today")]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args)]
pub(crate) struct DailySubmitArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long)]
    pub(crate) product: i64,
    #[arg(long, value_parser = parse_date, help = "Business day (YYYY-MM-DD), defaults to today")]
    pub(crate) date: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) produced: u32,
    #[arg(long)]
    pub(crate) waste: u32,
}

#[derive(Args)]
pub(crate) struct ImportUploadArgs {
    #[arg(help = "Spreadsheet to import (.xlsx, .xls, or .csv)")]
    pub(crate) file: PathBuf,
}

#[derive(Args)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long, value_parser = parse_date, help = "First day of the week (YYYY-MM-DD)")]
    pub(crate) week_start: NaiveDate,
    #[arg(short = 'o', long = "out")]
    pub(crate) out: PathBuf,
}

#[derive(Args)]
pub(crate) struct QrShowArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long = "save", help = "Also write the embedded PNG to this path")]
    pub(crate) save: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct QrDownloadArgs {
    #[command(flatten)]
    pub(crate) store: StoreArgs,
    #[arg(long, help = "Omit the printable header")]
    pub(crate) simple: bool,
    #[arg(short = 'o', long = "out")]
    pub(crate) out: PathBuf,
}

#[derive(Args)]
pub(crate) struct ForgotPasswordArgs {
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args)]
pub(crate) struct ResetTokenArgs {
    #[arg(long)]
    pub(crate) token: String,
}

#[derive(Args)]
pub(crate) struct ResetPasswordArgs {
    #[arg(long)]
    pub(crate) token: String,
    #[arg(long, env = ENV_PASSWORD, hide_env_values = true)]
    pub(crate) password: Option<String>,
    #[arg(long)]
    pub(crate) confirm: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
        }
    }
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Signup(_) => "signup",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Health => "health",
        Command::Inventory => "inventory",
        Command::Products(ProductCommand::List) => "products_list",
        Command::Products(ProductCommand::Create(_)) => "products_create",
        Command::Forecast(ForecastCommand::Get(_)) => "forecast_get",
        Command::Forecast(ForecastCommand::Generate(_)) => "forecast_generate",
        Command::Forecast(ForecastCommand::History(_)) => "forecast_history",
        Command::Dashboard(DashboardCommand::Daily(_)) => "dashboard_daily",
        Command::Dashboard(DashboardCommand::Accuracy(_)) => "dashboard_accuracy",
        Command::Daily(DailyCommand::Submit(_)) => "daily_submit",
        Command::Import(ImportCommand::Upload(_)) => "import_upload",
        Command::Export(_) => "export",
        Command::Qr(QrCommand::Show(_)) => "qr_show",
        Command::Qr(QrCommand::Status(_)) => "qr_status",
        Command::Qr(QrCommand::Download(_)) => "qr_download",
        Command::Qr(QrCommand::Regenerate(_)) => "qr_regenerate",
        Command::Password(PasswordCommand::Forgot(_)) => "password_forgot",
        Command::Password(PasswordCommand::Validate(_)) => "password_validate",
        Command::Password(PasswordCommand::Reset(_)) => "password_reset",
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    parse_base_url(input).map_err(|err| err.to_string())
}

fn parse_session_mode(input: &str) -> Result<SessionMode, String> {
    input.parse::<SessionMode>().map_err(|err| err.to_string())
}

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{input}' (expected YYYY-MM-DD): {err}"))
}

/// Today's date in the local timezone.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
