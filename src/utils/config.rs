#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use clap::Parser;
use log::{info, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::{env, fmt, fs, path::Path};

// Hero Utilities
use crate::utils::{hero_utils::get_absolute_path, errors::Errors};

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Environment variables that locate our files.
const ENV_CONFIG_FILE      : &str = "HERO_CONFIG_FILE";
const ENV_LOG_CONFIG       : &str = "HERO_LOG_CONFIG";

// Environment variables that override configuration file values.
const ENV_GIST_ID          : &str = "GIST_ID";
const ENV_GITHUB_TOKEN     : &str = "GITHUB_TOKEN";
const ENV_PORT             : &str = "PORT";

// File locations used when neither the environment nor the command line
// name a file.
const DEFAULT_CONFIG_FILE  : &str = "~/.hero_server/hero_server.toml";
const DEFAULT_LOG_CONFIG   : &str = "~/.hero_server/log4rs.yml";

// Networking.
const DEFAULT_TITLE        : &str = "Hero Board";
const DEFAULT_HTTP_ADDR    : &str = "0.0.0.0";
const DEFAULT_HTTP_PORT    : u16  = 5000;
const DEFAULT_GIST_API_URL : &str = "https://api.github.com";

// Console output when no log4rs file is present.
const CONSOLE_LOG_PATTERN  : &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {h({l})} {t} - {m}{n}";

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// HeroArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, Parser)]
#[command(name = "hero_server", version, about = "Hero board lookup server backed by a GitHub gist.")]
pub struct HeroArgs {
    /// Path of the TOML configuration file.
    ///
    /// The file is located using the following priority order:
    ///
    ///   1. If set, the value of the HERO_CONFIG_FILE environment variable,
    ///
    ///   2. Otherwise, if set, the value of this argument,
    ///
    ///   3. Otherwise, ~/.hero_server/hero_server.toml
    ///
    /// A missing file is not an error; built-in defaults are used.
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// Path of the log4rs configuration file.
    ///
    /// Located like the configuration file, using HERO_LOG_CONFIG and
    /// ~/.hero_server/log4rs.yml.  When no file exists, log records are
    /// written to the console at info level.
    #[arg(short, long)]
    pub log_config: Option<String>,
}

// ---------------------------------------------------------------------------
// Secret:
// ---------------------------------------------------------------------------
/** A credential whose Debug output never shows its value. */
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub hero_args: HeroArgs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
    pub gist_api_url: String,
    pub gist_id: Option<String>,
    pub github_token: Option<Secret>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    /** Parse a TOML document.  Keys that are not present keep their default values. */
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /** Overlay the GIST_ID, GITHUB_TOKEN and PORT values returned by lookup.
     * Empty values are ignored.  The gist id and token are not validated here;
     * a missing value surfaces later as an empty hero list.
     */
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where F: Fn(&str) -> Option<String>
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(id) = get(ENV_GIST_ID) {
            self.gist_id = Some(id.trim().to_string());
        }
        if let Some(token) = get(ENV_GITHUB_TOKEN) {
            self.github_token = Some(Secret::new(token.trim()));
        }
        if let Some(port) = get(ENV_PORT) {
            self.http_port = match port.trim().parse::<u16>() {
                Ok(p) => p,
                Err(_) => return Err(anyhow!(Errors::InvalidEnvValue(ENV_PORT.to_string(), port))),
            };
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            gist_api_url: DEFAULT_GIST_API_URL.to_string(),
            gist_id: None,
            github_token: None,
        }
    }
}

// ***************************************************************************
//                               Path Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// resolve_file:
// ---------------------------------------------------------------------------
fn resolve_file<F>(lookup: &F, env_name: &str, arg: &Option<String>, default: &str) -> String
where F: Fn(&str) -> Option<String>
{
    // Order of precedence:
    //  1. Environment variable
    //  2. Command line argument
    //  3. Default location
    //
    let file = lookup(env_name).unwrap_or_else(
        || {
            match arg.clone() {
                Some(f) => f,
                None => default.to_string(),
            }
        });

    // Canonicalize the path.
    get_absolute_path(&file)
}

// ---------------------------------------------------------------------------
// env_lookup:
// ---------------------------------------------------------------------------
fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok()
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs from its configuration file if one exists, otherwise
 * fall back to info level console logging.  A configuration file that exists
 * but cannot be loaded is an error.
 */
pub fn init_log(args: &HeroArgs) -> Result<()> {
    match find_log_config(args, env_lookup) {
        Some(logconfig) => {
            match log4rs::init_file(&logconfig, Default::default()) {
                Ok(_) => (),
                Err(e) => {
                    println!("{}", e);
                    return Err(anyhow!(Errors::Log4rsInitialization(logconfig)));
                },
            }
            info!("Log4rs initialized using: {}", logconfig);
        },
        None => {
            init_console_log()?;
            info!("No log4rs configuration file found, logging to the console.");
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// find_log_config:
// ---------------------------------------------------------------------------
/** Return the log4rs configuration file path if that file exists. */
fn find_log_config<F>(args: &HeroArgs, lookup: F) -> Option<String>
where F: Fn(&str) -> Option<String>
{
    let logconfig = resolve_file(&lookup, ENV_LOG_CONFIG, &args.log_config, DEFAULT_LOG_CONFIG);
    if Path::new(&logconfig).is_file() {Some(logconfig)} else {None}
}

// ---------------------------------------------------------------------------
// init_console_log:
// ---------------------------------------------------------------------------
fn init_console_log() -> Result<()> {
    log4rs::init_config(console_log_config()?)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// console_log_config:
// ---------------------------------------------------------------------------
/** Info level logging to stdout, used when no log4rs file exists. */
fn console_log_config() -> Result<log4rs::config::Config> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_LOG_PATTERN)))
        .build();
    let logconfig = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    Ok(logconfig)
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file and then
 * apply environment overrides.  If the file cannot be read the default values
 * are used; if it cannot be parsed an error is returned.
 */
fn get_parms<F>(args: &HeroArgs, lookup: F) -> Result<Parms>
where F: Fn(&str) -> Option<String>
{
    let config_file = resolve_file(&lookup, ENV_CONFIG_FILE, &args.config_file, DEFAULT_CONFIG_FILE);
    info!("{}", Errors::ReadingConfigFile(config_file.clone()));

    // Read and parse the toml configuration.
    let mut config = match fs::read_to_string(&config_file) {
        Ok(contents) => match Config::from_toml(&contents) {
            Ok(c) => c,
            Err(e) => {
                let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file), e);
                error!("{}", msg);
                return Result::Err(anyhow!(msg));
            }
        },
        Err(_) => {
            println!("Unable to read configuration at {}. Using default values.", config_file);
            Config::new()
        }
    };

    // The environment always wins.
    config.apply_env_overrides(lookup)?;
    Ok(Parms { config_file, config })
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context(hero_args: HeroArgs) -> Result<RuntimeCtx> {
    let parms = get_parms(&hero_args, env_lookup)?;
    Ok(RuntimeCtx {parms, hero_args})
}
