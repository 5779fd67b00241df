#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Html };
use tera::{Context, Tera};

use crate::utils::config::Config;

// The page layout, style and client script.
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

// ***************************************************************************
//                                Page Endpoint
// ***************************************************************************
/** Serves the single hero board page, rendered once at startup. */
pub struct PageApi {
    html: String,
}

impl PageApi {
    pub fn new(config: &Config) -> Result<Self, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("title", &config.title);
        let html = Tera::one_off(INDEX_TEMPLATE, &ctx, true)?;
        Ok(Self {html})
    }
}

#[OpenApi]
impl PageApi {
    #[oai(path = "/", method = "get")]
    async fn index(&self) -> Html<String> {
        Html(self.html.clone())
    }
}
