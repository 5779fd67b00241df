#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors enumerates the startup and logging conditions reported by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("hero_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Inaccessible logger configuration file.
    #[error("Unable to access the Log4rs configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    #[error("Invalid {} environment value: {}", .0, .1)]
    InvalidEnvValue(String, String),
}

/// GistError enumerates the reasons the hero list could not be retrieved.
/// These never reach an http client; the endpoints degrade to an empty list.
#[derive(Error, Debug)]
pub enum GistError {
    #[error("No gist id configured (set GIST_ID)")]
    MissingGistId,

    #[error("No GitHub token configured (set GITHUB_TOKEN)")]
    MissingToken,

    /// Connection, TLS or body read failures.
    #[error("Gist request failed: {}", .0)]
    Transport(#[from] reqwest::Error),

    #[error("Gist request returned HTTP status {}", .0)]
    Status(u16),

    #[error("Unable to decode gist document: {}", .0)]
    Decode(String),
}
