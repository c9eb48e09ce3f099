//! Shared CLI plumbing: error types, the handler context, and credential prompts.

use std::env;
use std::fmt::{self, Display, Formatter};
use std::io::{self, IsTerminal};

use anyhow::anyhow;
use ddi_client::{ApiClient, ApiError, ClientConfig, ConfigError};

use crate::cli::{Cli, OutputFormat};

/// Environment variable consulted for the account password.
pub(crate) const ENV_PASSWORD: &str = "DDI_PASSWORD";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(message) => Self::Validation(message),
            ApiError::Unauthorized { .. } => {
                Self::failure(anyhow!("{} Run `ddi login` to sign in.", err.message()))
            }
            ApiError::Http { status, message } if (400..500).contains(&status) => {
                Self::Validation(message)
            }
            ApiError::Http { status, message } => {
                Self::failure(anyhow!("{message} (status {status})"))
            }
            other => Self::failure(anyhow!(other.message())),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Application context passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) client: ApiClient,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    /// Build the API client from parsed global flags.
    pub(crate) fn from_cli(cli: &Cli, trace_id: &str) -> CliResult<Self> {
        let mut config = ClientConfig::new(cli.api_url.clone());
        config.timeout = cli.timeout.map(std::time::Duration::from_secs);
        config.session_mode = cli.session_mode;
        config.session_file.clone_from(&cli.session_file);
        config.request_id = Some(trace_id.to_string());

        let client = ApiClient::from_config(&config)?;
        Ok(Self {
            client,
            output: cli.output,
        })
    }

    /// Store identifier from the flag, falling back to the signed-in user's store.
    pub(crate) fn store_id(&self, explicit: Option<i64>) -> CliResult<i64> {
        explicit
            .or_else(|| self.client.user().and_then(|user| user.store_id))
            .ok_or_else(|| {
                CliError::validation(
                    "store id required; pass --store or log in with an account linked to a store",
                )
            })
    }
}

/// Resolve a secret from its flag, then the environment, then an interactive prompt.
pub(crate) fn resolve_secret(
    value: Option<String>,
    env_key: Option<&str>,
    prompt: &str,
    what: &str,
) -> CliResult<String> {
    let from_env = || env_key.and_then(|key| env::var(key).ok());
    if let Some(value) = value.or_else(from_env) {
        if value.is_empty() {
            return Err(CliError::validation(format!("{what} cannot be empty")));
        }
        return Ok(value);
    }

    if io::stdin().is_terminal() {
        let entered = rpassword::prompt_password(prompt).map_err(|err| {
            CliError::failure(anyhow!("failed to read {what} from stdin: {err}"))
        })?;
        if entered.is_empty() {
            return Err(CliError::validation(format!("{what} cannot be empty")));
        }
        Ok(entered)
    } else {
        Err(CliError::validation(format!(
            "{what} required; supply it by flag when running non-interactively"
        )))
    }
}
