#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object };

use crate::utils::gist::ListSource;
use crate::utils::hero_utils::{self, RequestDebug};

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct HeroesApi {
    source: Arc<dyn ListSource>,
}

// The listing takes no parameters.
struct ReqHeroes;

#[derive(Object, Debug, PartialEq)]
pub struct RespHeroes
{
    heroes: Vec<String>,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqHeroes {
    fn get_request_info(&self) -> String {
        "  * No request body".to_string()
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl HeroesApi {
    #[oai(path = "/heroes", method = "get")]
    async fn heroes_api(&self, http_req: &Request) -> Json<RespHeroes> {
        // Conditional logging depending on log level.
        hero_utils::debug_request(http_req, &ReqHeroes);

        Json(list_all(self.source.as_ref()).await)
    }
}

impl HeroesApi {
    pub fn new(source: Arc<dyn ListSource>) -> Self {
        Self {source}
    }
}

// ---------------------------------------------------------------------------
// list_all:
// ---------------------------------------------------------------------------
/** Return the current hero list as retrieved, order and duplicates intact. */
pub async fn list_all(source: &dyn ListSource) -> RespHeroes {
    RespHeroes {heroes: source.fetch_list().await}
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use crate::api::test_support::StaticSource;
    use super::*;

    #[tokio::test]
    async fn returns_list_unchanged() {
        let source = StaticSource::new(&["Zed", "Amy", "Zed"]);
        let resp = list_all(&source).await;
        assert_eq!(resp.heroes, vec!["Zed", "Amy", "Zed"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn every_call_fetches() {
        let source = StaticSource::new(&["Amy"]);
        list_all(&source).await;
        list_all(&source).await;
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn request_info_has_no_body() {
        assert_eq!(ReqHeroes.get_request_info(), "  * No request body");
    }

    #[tokio::test]
    async fn failed_fetch_is_empty() {
        let source = StaticSource::failing();
        assert!(list_all(&source).await.heroes.is_empty());
    }
}
