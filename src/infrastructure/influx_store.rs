// InfluxDB-backed price store
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::application::price_repository::PriceRepository;
use crate::domain::series::{PriceSample, PriceSeries};

#[derive(Debug, Clone)]
pub struct InfluxStore {
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    measurement: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    #[allow(dead_code)]
    name: String,
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxStore {
    pub fn new(
        host: String,
        token: String,
        database: String,
        retention_policy: String,
        measurement: String,
    ) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            token,
            database,
            retention_policy,
            measurement,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        let url = self.build_query_url(query);

        let client = reqwest::Client::new();
        let response = client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to the price store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("store query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse store response")?;

        // Check for errors in the response
        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("store query error: {}", error);
            }
        }

        Ok(data)
    }

    /// One SELECT row -> one sample: the time column plus one numeric field
    /// per asset. Non-numeric or null cells are absent values, not zeros.
    fn parse_samples(response: &InfluxQLResponse) -> Vec<PriceSample> {
        let mut samples = Vec::new();
        if let Some(result) = response.results.first() {
            if let Some(series_list) = &result.series {
                for series in series_list {
                    let time_idx = series.columns.iter().position(|c| c == "time").unwrap_or(0);

                    for row in &series.values {
                        let Some(time_str) = row.get(time_idx).and_then(|v| v.as_str()) else {
                            continue;
                        };
                        let Ok(time) = DateTime::parse_from_rfc3339(time_str) else {
                            continue;
                        };

                        let mut values = HashMap::new();
                        for (idx, column) in series.columns.iter().enumerate() {
                            if idx == time_idx {
                                continue;
                            }
                            if let Some(value) = row.get(idx).and_then(|v| v.as_f64()) {
                                values.insert(column.clone(), value);
                            }
                        }

                        if !values.is_empty() {
                            samples.push(PriceSample::new(time.with_timezone(&Utc), values));
                        }
                    }
                }
            }
        }
        samples
    }
}

#[async_trait]
impl PriceRepository for InfluxStore {
    async fn list_asset_ids(&self) -> Result<Vec<String>> {
        let query = format!("SHOW FIELD KEYS FROM \"{}\"", self.measurement);
        let response = self.execute_query(&query).await?;

        let mut ids = Vec::new();
        if let Some(result) = response.results.first() {
            if let Some(series) = &result.series {
                for s in series {
                    for value_row in &s.values {
                        if let Some(field) = value_row.first().and_then(|v| v.as_str()) {
                            ids.push(field.to_string());
                        }
                    }
                }
            }
        }

        Ok(ids)
    }

    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let query = format!(
            "SELECT * FROM \"{}\" WHERE time >= '{}' AND time <= '{}'",
            self.measurement,
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end.to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        tracing::debug!("executing range query: {}", query);
        let response = self.execute_query(&query).await?;
        Ok(PriceSeries::new(Self::parse_samples(&response)))
    }

    async fn append_sample(&self, sample: &PriceSample) -> Result<()> {
        let line = sample_to_line(&self.measurement, sample)
            .context("sample has no values to write")?;
        let url = format!(
            "{}/write?db={}&rp={}&precision=ms",
            self.host, self.database, self.retention_policy
        );

        let client = reqwest::Client::new();
        let response = client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .body(line)
            .send()
            .await
            .context("Failed to send write to the price store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("store write failed with status {}: {}", status, body);
        }

        Ok(())
    }
}

/// Line-protocol encoding: `measurement field=value,... timestamp_ms`.
/// Field keys are sorted so the output is stable.
fn sample_to_line(measurement: &str, sample: &PriceSample) -> Option<String> {
    if sample.values.is_empty() {
        return None;
    }

    let mut fields: Vec<(&String, &f64)> = sample.values.iter().collect();
    fields.sort_by_key(|(key, _)| key.as_str());

    let field_set = fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape_key(key), value))
        .collect::<Vec<_>>()
        .join(",");

    Some(format!(
        "{} {} {}",
        escape_key(measurement),
        field_set,
        sample.time.timestamp_millis()
    ))
}

// Line protocol reserves commas, spaces and equals signs in keys.
fn escape_key(key: &str) -> String {
    key.replace(',', "\\,").replace(' ', "\\ ").replace('=', "\\=")
}
