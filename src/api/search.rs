#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object };

use crate::utils::gist::ListSource;
use crate::utils::hero_utils::{self, RequestDebug};

// Returned instead of a lookup when the trimmed name is empty.
pub const EMPTY_NAME_MSG: &str = "Please enter a name";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct SearchApi {
    source: Arc<dyn ListSource>,
}

#[derive(Object, Debug)]
pub struct ReqSearch
{
    /// A body without a name is treated as an empty name.
    #[oai(default)]
    name: String,
}

#[derive(Object, Debug, PartialEq)]
pub struct RespSearch
{
    found: bool,
    #[oai(skip_serializing_if_is_none)]
    message: Option<String>,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqSearch {
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    name: ");
        s.push_str(&self.name);
        s
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl SearchApi {
    #[oai(path = "/search", method = "post")]
    async fn search_api(&self, http_req: &Request, req: Json<ReqSearch>) -> Json<RespSearch> {
        // Conditional logging depending on log level.
        hero_utils::debug_request(http_req, &req.0);

        Json(search_name(self.source.as_ref(), &req.name).await)
    }
}

impl SearchApi {
    pub fn new(source: Arc<dyn ListSource>) -> Self {
        Self {source}
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl RespSearch {
    fn found(found: bool) -> Self {
        Self {found, message: None}
    }

    fn empty_name() -> Self {
        Self {found: false, message: Some(EMPTY_NAME_MSG.to_string())}
    }
}

// ---------------------------------------------------------------------------
// search_name:
// ---------------------------------------------------------------------------
/** Report whether the trimmed name is on the current hero list.  An empty
 * name is answered without retrieving the list.  Matching is exact and case
 * sensitive; a list that could not be retrieved is treated as empty.
 */
pub async fn search_name(source: &dyn ListSource, name: &str) -> RespSearch {
    let name = name.trim();
    if name.is_empty() {
        return RespSearch::empty_name();
    }

    let heroes = source.fetch_list().await;
    RespSearch::found(heroes.iter().any(|h| h == name))
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use crate::api::test_support::StaticSource;
    use super::*;

    #[tokio::test]
    async fn present_names_are_found() {
        let source = StaticSource::new(&["Alice", "Bob"]);
        assert_eq!(search_name(&source, "Alice").await, RespSearch::found(true));
        assert_eq!(search_name(&source, "Bob").await, RespSearch::found(true));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn query_is_trimmed() {
        let source = StaticSource::new(&["Alice"]);
        assert_eq!(search_name(&source, "  Alice\t").await, RespSearch::found(true));
    }

    #[tokio::test]
    async fn match_is_exact() {
        let source = StaticSource::new(&["Alice", "Bob Smith"]);
        assert_eq!(search_name(&source, "alice").await, RespSearch::found(false));
        assert_eq!(search_name(&source, "Ali").await, RespSearch::found(false));
        assert_eq!(search_name(&source, "Bob  Smith").await, RespSearch::found(false));
        assert_eq!(search_name(&source, "Bob Smith").await, RespSearch::found(true));
    }

    #[tokio::test]
    async fn empty_name_skips_fetch() {
        let source = StaticSource::new(&["Alice"]);
        assert_eq!(search_name(&source, "").await, RespSearch::empty_name());
        assert_eq!(search_name(&source, "   ").await, RespSearch::empty_name());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_found() {
        let source = StaticSource::failing();
        assert_eq!(search_name(&source, "Alice").await, RespSearch::found(false));
        assert_eq!(source.calls(), 1);
    }
}
