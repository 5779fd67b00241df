#![forbid(unsafe_code)]

use async_trait::async_trait;
use log::{error, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::utils::config::{Config, Secret};
use crate::utils::errors::GistError;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// The versioned GitHub REST media type.
const GIST_ACCEPT      : &str = "application/vnd.github.v3+json";

// GitHub refuses requests that carry no user agent.
const HERO_USER_AGENT  : &str = concat!("hero_server/", env!("CARGO_PKG_VERSION"));

// Key of the name array in JSON formatted gist files.
const HEROES_KEY       : &str = "heroes";

// ***************************************************************************
//                               Fetch Results
// ***************************************************************************
// ---------------------------------------------------------------------------
// FetchOutcome:
// ---------------------------------------------------------------------------
/** The result of one retrieval of the hero list.  A list that is genuinely
 * empty is `Fetched(vec![])`; a retrieval that went wrong is `Failed`.
 */
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(Vec<String>),
    Failed(GistError),
}

impl FetchOutcome {
    /** Collapse the outcome to a list of names, logging and discarding any
     * failure.  Callers outside this module only ever see the list.
     */
    pub fn into_names(self) -> Vec<String> {
        match self {
            FetchOutcome::Fetched(names) => names,
            FetchOutcome::Failed(e) => {
                error!("Error reading from gist: {}", e);
                vec![]
            }
        }
    }
}

impl From<Result<Vec<String>, GistError>> for FetchOutcome {
    fn from(result: Result<Vec<String>, GistError>) -> Self {
        match result {
            Ok(names) => FetchOutcome::Fetched(names),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

// ---------------------------------------------------------------------------
// ListSource:
// ---------------------------------------------------------------------------
/** Anything that can produce the current hero list.  Every call is a fresh
 * retrieval; nothing is cached between calls.
 */
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn fetch(&self) -> FetchOutcome;

    /// Fail-soft retrieval: any failure becomes an empty list.
    async fn fetch_list(&self) -> Vec<String> {
        self.fetch().await.into_names()
    }
}

// ***************************************************************************
//                               Gist Client
// ***************************************************************************
#[derive(Deserialize)]
struct GistDoc {
    // Order follows the response document.
    files: Map<String, Value>,
}

#[derive(Deserialize)]
struct GistFile {
    content: String,
}

// ---------------------------------------------------------------------------
// GistClient:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct GistClient {
    client: Client,
    api_url: String,
    gist_id: Option<String>,
    token: Option<Secret>,
}

impl GistClient {
    /** Build a client from the runtime configuration.  The gist id and token
     * are not checked here; their absence fails each fetch instead.
     */
    pub fn new(config: &Config) -> Result<Self, GistError> {
        let client = Client::builder()
            .user_agent(HERO_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_url: config.gist_api_url.trim_end_matches('/').to_string(),
            gist_id: config.gist_id.clone(),
            token: config.github_token.clone(),
        })
    }

    fn gist_url(&self, gist_id: &str) -> String {
        format!("{}/gists/{}", self.api_url, gist_id)
    }

    async fn get_names(&self) -> Result<Vec<String>, GistError> {
        let gist_id = self.gist_id.as_deref().ok_or(GistError::MissingGistId)?;
        let token = self.token.as_ref().ok_or(GistError::MissingToken)?;

        let resp = self.client
            .get(self.gist_url(gist_id))
            .header(AUTHORIZATION, format!("token {}", token.expose()))
            .header(ACCEPT, GIST_ACCEPT)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(GistError::Status(resp.status().as_u16()));
        }

        let body = resp.text().await?;
        names_from_gist(&body)
    }
}

#[async_trait]
impl ListSource for GistClient {
    async fn fetch(&self) -> FetchOutcome {
        self.get_names().await.into()
    }
}

// ***************************************************************************
//                             Parsing Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// names_from_gist:
// ---------------------------------------------------------------------------
/** Extract the hero list from a gist document.  Every file is parsed and the
 * last file in document order determines the result; a gist with no files
 * yields an empty list.
 */
pub fn names_from_gist(body: &str) -> Result<Vec<String>, GistError> {
    let doc: GistDoc = serde_json::from_str(body)
        .map_err(|e| GistError::Decode(e.to_string()))?;

    let mut names = vec![];
    for (filename, file) in doc.files {
        let file: GistFile = serde_json::from_value(file)
            .map_err(|e| GistError::Decode(format!("file {}: {}", filename, e)))?;
        names = parse_content(&file.content);
    }
    Ok(names)
}

// ---------------------------------------------------------------------------
// parse_content:
// ---------------------------------------------------------------------------
/** Interpret one file's content.  Valid JSON yields the strings under the
 * "heroes" key (empty when the key is missing or not an array).  Anything
 * else is read as one name per line with blank lines dropped.
 */
pub fn parse_content(content: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(content) {
        Ok(v) => heroes_from_json(&v),
        Err(_) => content
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn heroes_from_json(v: &Value) -> Vec<String> {
    let heroes = match v.get(HEROES_KEY).and_then(Value::as_array) {
        Some(a) => a,
        None => return vec![],
    };

    heroes.iter()
        .filter_map(|h| match h.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                warn!("Skipping non-string hero entry: {}", h);
                None
            }
        })
        .collect()
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn client_for(url: &str, gist_id: Option<&str>, token: Option<&str>) -> GistClient {
        let config = Config {
            gist_api_url: url.to_string(),
            gist_id: gist_id.map(str::to_string),
            github_token: token.map(Secret::new),
            ..Config::new()
        };
        GistClient::new(&config).unwrap()
    }

    fn gist_body(filename: &str, content: &str) -> String {
        json!({
            "id": "abc123",
            "files": {
                filename: { "filename": filename, "content": content }
            }
        }).to_string()
    }

    #[test]
    fn parses_json_heroes() {
        assert_eq!(parse_content(r#"{"heroes": ["Alice", "Bob"]}"#), vec!["Alice", "Bob"]);
    }

    #[test]
    fn parses_plain_lines() {
        assert_eq!(parse_content("Alice\nBob\n\n"), vec!["Alice", "Bob"]);
        assert_eq!(parse_content("  Alice \r\n\t\n Bob"), vec!["Alice", "Bob"]);
    }

    #[test]
    fn json_without_heroes_is_empty() {
        assert!(parse_content(r#"{"villains": ["Mallory"]}"#).is_empty());
        assert!(parse_content(r#"{"heroes": "Alice"}"#).is_empty());
        assert!(parse_content("[\"Alice\"]").is_empty());
        // A bare number is valid JSON, so it is not read as a line.
        assert!(parse_content("42").is_empty());
    }

    #[test]
    fn non_string_heroes_are_skipped() {
        assert_eq!(parse_content(r#"{"heroes": ["Alice", 7, null, "Bob"]}"#), vec!["Alice", "Bob"]);
    }

    #[test]
    fn duplicates_and_order_pass_through() {
        assert_eq!(parse_content("Zed\nAmy\nZed"), vec!["Zed", "Amy", "Zed"]);
    }

    #[test]
    fn last_file_wins() {
        let body = r#"{"files": {
            "b.txt": {"content": "Bob"},
            "a.json": {"content": "{\"heroes\": [\"Alice\"]}"}
        }}"#;
        assert_eq!(names_from_gist(body).unwrap(), vec!["Alice"]);
    }

    #[test]
    fn no_files_is_empty() {
        assert!(names_from_gist(r#"{"files": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_gist_is_an_error() {
        assert!(matches!(names_from_gist("<html>"), Err(GistError::Decode(_))));
        assert!(matches!(names_from_gist(r#"{"id": "x"}"#), Err(GistError::Decode(_))));
        assert!(matches!(names_from_gist(r#"{"files": {"a": {"size": 1}}}"#), Err(GistError::Decode(_))));
    }

    #[tokio::test]
    async fn fetches_with_credentials() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/gists/abc123")
            .match_header("authorization", "token t0ken")
            .match_header("accept", GIST_ACCEPT)
            .match_header("user-agent", Matcher::Regex("^hero_server/".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gist_body("heroes.json", r#"{"heroes": ["Alice", "Bob"]}"#))
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("abc123"), Some("t0ken"));
        let names = client.fetch_list().await;

        assert_eq!(names, vec!["Alice", "Bob"]);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn fetches_plain_text_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/gists/abc123")
            .with_status(200)
            .with_body(gist_body("heroes.txt", "Alice\nBob\n\n"))
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("abc123"), Some("t0ken"));
        assert!(matches!(client.fetch().await, FetchOutcome::Fetched(n) if n == vec!["Alice", "Bob"]));
    }

    #[tokio::test]
    async fn http_error_fails_soft() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/gists/abc123")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("abc123"), Some("t0ken"));
        assert!(matches!(client.fetch().await, FetchOutcome::Failed(GistError::Status(404))));
        assert!(client.fetch_list().await.is_empty());
    }

    #[tokio::test]
    async fn missing_config_makes_no_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let no_id = client_for(&server.url(), None, Some("t0ken"));
        assert!(matches!(no_id.fetch().await, FetchOutcome::Failed(GistError::MissingGistId)));

        let no_token = client_for(&server.url(), Some("abc123"), None);
        assert!(matches!(no_token.fetch().await, FetchOutcome::Failed(GistError::MissingToken)));
        assert!(no_token.fetch_list().await.is_empty());

        m.assert_async().await;
    }

    #[tokio::test]
    async fn network_error_fails_soft() {
        // Nothing listens on port 1.
        let client = client_for("http://127.0.0.1:1", Some("abc123"), Some("t0ken"));
        assert!(matches!(client.fetch().await, FetchOutcome::Failed(_)));
        assert!(client.fetch_list().await.is_empty());
    }

    #[tokio::test]
    async fn trailing_slash_in_api_url() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/gists/abc123")
            .with_status(200)
            .with_body(gist_body("heroes.txt", "Carol"))
            .create_async()
            .await;

        let url = format!("{}/", server.url());
        let client = client_for(&url, Some("abc123"), Some("t0ken"));
        assert_eq!(client.fetch_list().await, vec!["Carol"]);
        m.assert_async().await;
    }
}
