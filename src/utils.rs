pub mod config;
pub mod errors;
pub mod gist;
pub mod hero_utils;
