#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;
use poem::listener::TcpListener;

// Hero Utilities
use crate::api::make_routes;
use crate::utils::config::{init_log, init_runtime_context, HeroArgs, RuntimeCtx};
use crate::utils::errors::Errors;
use crate::utils::gist::GistClient;

// Modules
mod api;
mod utils;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "HeroServer"; // for poem logging
const UNKNOWN     : &str = "unknown";   // build info missing outside a git checkout

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting hero_server!");

    // Read the command line, configure logging and load our configuration.
    let runtime_ctx = hero_init()?;
    let config = &runtime_ctx.parms.config;

    // --------------- Main Loop Set Up ---------------
    // The gist client is the only list source; it is shared by all requests.
    let source = Arc::new(GistClient::new(config)?);
    let app = make_routes(config, source)?;

    // Listen on the configured interface.
    let addr = format!("{}:{}", config.http_addr, config.http_port);
    info!("Listening on http://{}", addr);

    // ------------------ Main Loop -------------------
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await?;
    Ok(())
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// hero_init:
// ---------------------------------------------------------------------------
/** Initialize logging and read the runtime context.  Any failure here aborts
 * the server before it starts listening.
 */
fn hero_init() -> Result<RuntimeCtx> {
    let args = HeroArgs::parse();

    // Configure our log.
    init_log(&args)?;

    // The token is redacted in the debug output.
    let runtime_ctx = init_runtime_context(args)?;
    info!("{}", Errors::InputParms(format!("{:#?}", runtime_ctx)));

    // Log build info.
    print_version_info();

    Ok(runtime_ctx)
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("\n*** Running HERO_SERVER={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}.",
          env!("CARGO_PKG_VERSION"),
          option_env!("GIT_BRANCH").unwrap_or(UNKNOWN),
          option_env!("GIT_COMMIT_SHORT").unwrap_or(UNKNOWN),
          option_env!("GIT_DIRTY").unwrap_or(UNKNOWN),
          option_env!("SOURCE_TIMESTAMP").unwrap_or(UNKNOWN),
          option_env!("RUSTC_VERSION").unwrap_or(UNKNOWN),
    );
}
