// CoinGecko quote client for the price collector
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::collections::HashMap;

use crate::application::collector::QuoteSource;
use crate::infrastructure::config::CollectorSettings;

/// Fetches spot prices for a set of asset ids via `/simple/price`.
pub struct CoingeckoClient {
    client: Client,
    base: Url,
    vs_currency: String,
}

impl CoingeckoClient {
    pub fn new(settings: &CollectorSettings) -> Result<Self> {
        let base = Url::parse(&settings.quote_url).context("invalid quote API url")?;
        Ok(Self {
            client: Client::new(),
            base,
            vs_currency: settings.vs_currency.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for CoingeckoClient {
    async fn fetch_quotes(&self, asset_ids: &[String]) -> Result<HashMap<String, f64>> {
        if asset_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut url = self.base.clone();
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("ids", &asset_ids.join(","));
            qp.append_pair("vs_currencies", &self.vs_currency);
        }

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .context("coingecko: request failed")?
            .error_for_status()
            .context("coingecko: non-success status")?;

        // Shaped like: { "bitcoin": {"eur": 12345.6}, ... }
        let parsed: HashMap<String, HashMap<String, f64>> = response
            .json()
            .await
            .context("coingecko: parse JSON failed")?;

        // Assets missing from the response are simply absent from the sample.
        let mut quotes = HashMap::new();
        for (id, record) in parsed {
            if let Some(price) = record.get(&self.vs_currency) {
                quotes.insert(id, *price);
            }
        }

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CoingeckoClient {
        CoingeckoClient::new(&CollectorSettings {
            enabled: true,
            period_secs: 300,
            vs_currency: "eur".to_string(),
            quote_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_quote_url() {
        let result = CoingeckoClient::new(&CollectorSettings {
            enabled: true,
            period_secs: 300,
            vs_currency: "eur".to_string(),
            quote_url: "not a url".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn response_records_without_requested_currency_are_dropped() {
        let parsed: HashMap<String, HashMap<String, f64>> = serde_json::from_str(
            r#"{"bitcoin": {"eur": 93000.5}, "ethereum": {"usd": 3300.0}}"#,
        )
        .unwrap();

        let vs_currency = client().vs_currency;
        let mut quotes = HashMap::new();
        for (id, record) in parsed {
            if let Some(price) = record.get(&vs_currency) {
                quotes.insert(id, *price);
            }
        }

        assert_eq!(quotes.get("bitcoin"), Some(&93000.5));
        assert!(!quotes.contains_key("ethereum"));
    }
}
