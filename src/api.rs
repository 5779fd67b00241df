#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use poem::Route;
use poem_openapi::OpenApiService;

use crate::utils::config::Config;
use crate::utils::gist::ListSource;

use self::heroes_list::HeroesApi;
use self::page::PageApi;
use self::search::SearchApi;

pub mod heroes_list;
pub mod page;
pub mod search;

// ---------------------------------------------------------------------------
// make_routes:
// ---------------------------------------------------------------------------
/** Assemble the route tree: the page at "/", the search and listing endpoints,
 * nothing else.  Both endpoints share the one list source.
 */
pub fn make_routes(config: &Config, source: Arc<dyn ListSource>) -> Result<Route> {
    let endpoints = (
        PageApi::new(config)?,
        SearchApi::new(source.clone()),
        HeroesApi::new(source),
    );
    let api_service = OpenApiService::new(endpoints, config.title.clone(), env!("CARGO_PKG_VERSION"));

    Ok(Route::new().nest("/", api_service))
}
