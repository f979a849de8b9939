use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use shop_types::domain::order::OrderView;

#[derive(Clone)]
pub struct ShopClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct ShopClient {
    base: Url,
    client: reqwest::Client,
}

impl ShopClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<ShopClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(ShopClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn create_order(&self, req: CreateOrderRequest) -> anyhow::Result<OrderView> {
        tracing::debug!(user = req.user, products = req.products_id.len(), "create order");
        let res = self
            .client
            .post(self.url("v1/orders")?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_orders(&self, query: ListOrdersQuery) -> anyhow::Result<OrdersPage> {
        tracing::debug!(?query, "list orders");
        let res = self
            .client
            .get(self.url("v1/orders")?)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn health(&self) -> anyhow::Result<()> {
        self.client
            .get(self.url("health")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl ShopClientBuilder {
    /// Installs the bearer credential every request will carry, in the
    /// `Authorization: Token <key>` scheme the server expects.
    pub fn with_token(self, key: impl AsRef<str>) -> anyhow::Result<Self> {
        self.with_header("Authorization", format!("Token {}", key.as_ref()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<ShopClient> {
        if let Some(client) = self.client {
            return Ok(ShopClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(ShopClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateOrderRequest {
    pub products_id: Vec<i64>,
    pub user: i64,
}

/// Listing window. `None` fields stay out of the query string, so the
/// server applies its defaults.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ListOrdersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub user: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrdersPage {
    pub results: Vec<OrderView>,
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
}
