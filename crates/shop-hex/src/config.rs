use anyhow::Context;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    /// Default number of orders per listing page when the request does not
    /// pass `limit`.
    pub page_size: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let page_size = match env::var("PAGE_SIZE") {
            Ok(raw) => raw.parse().context("PAGE_SIZE must be an integer")?,
            Err(_) => 10,
        };
        Ok(Self {
            server_port,
            database_url,
            page_size,
        })
    }
}
