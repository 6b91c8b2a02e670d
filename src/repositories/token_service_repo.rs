use anyhow::{anyhow, Context};
use reqwest::{Client, Url};
use serde_json::json;
use tracing::warn;

use crate::models::token::TokenExchangeResponse;

pub struct TokenServiceRepo {
    client: Client,
    endpoint: Url,
}

impl TokenServiceRepo {
    pub fn new(client: Client, endpoint: &str) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid token service url: {}", endpoint))?;
        Ok(Self { client, endpoint })
    }

    /// Redeems an access code. A rejected code comes back as `Ok` with the
    /// service's error; only transport and decoding problems are `Err`.
    pub async fn exchange_code(&self, code: &str) -> anyhow::Result<TokenExchangeResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "code": code }))
            .send()
            .await
            .context("Token service could not be reached")?;

        let status = response.status();
        let exchange: TokenExchangeResponse = match response.json().await {
            Ok(exchange) => exchange,
            Err(e) => {
                warn!("Token service answered {} with an unreadable body: {}", status, e);
                return Err(anyhow!("Token service answered {}", status));
            }
        };

        if exchange.token.is_none() && exchange.error.is_none() {
            return Err(anyhow!("Token service answered {} without token or error", status));
        }

        Ok(exchange)
    }
}
