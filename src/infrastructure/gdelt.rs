// GDELT DOC API news source
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::application::news_source::NewsSource;
use crate::domain::event::NewsEvent;
use crate::infrastructure::config::NewsSettings;

// Proximity window for the subject/keyword co-occurrence filter.
const PROXIMITY_WINDOW: u32 = 15;
const API_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone)]
pub struct GdeltNewsSource {
    client: Client,
    endpoint: String,
    keywords: Vec<String>,
    source_domains: Vec<String>,
    max_records: u32,
}

#[derive(Debug, Deserialize)]
struct ArticleList {
    #[serde(default)]
    articles: Vec<ArticleRow>,
}

#[derive(Debug, Deserialize)]
struct ArticleRow {
    #[serde(default)]
    seendate: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

impl GdeltNewsSource {
    pub fn new(settings: &NewsSettings) -> Self {
        Self {
            client: Client::new(),
            endpoint: settings.endpoint.clone(),
            keywords: settings.keywords.clone(),
            source_domains: settings.source_domains.clone(),
            max_records: settings.max_records,
        }
    }

    /// Free-text query: the subject plus OR-joined keyword terms wrapped in a
    /// proximity window, then the OR-joined source allow-list.
    fn build_query(&self, subject: &str) -> String {
        let mut query = if self.keywords.is_empty() {
            format!("\"{}\"", subject)
        } else {
            format!(
                "near{}:\"{} ({})\"",
                PROXIMITY_WINDOW,
                subject,
                self.keywords.join(" OR ")
            )
        };

        if !self.source_domains.is_empty() {
            let domains = self
                .source_domains
                .iter()
                .map(|d| format!("domainis:{}", d))
                .collect::<Vec<_>>()
                .join(" OR ");
            query.push_str(&format!(" ({})", domains));
        }

        query
    }
}

#[async_trait]
impl NewsSource for GdeltNewsSource {
    async fn search(
        &self,
        subject: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NewsEvent>> {
        let query = self.build_query(subject);
        tracing::debug!("news query for {}: {}", subject, query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query.as_str()),
                ("mode", "artlist"),
                ("format", "json"),
                ("startdatetime", &start.format(API_DATE_FORMAT).to_string()),
                ("enddatetime", &end.format(API_DATE_FORMAT).to_string()),
                ("maxrecords", &self.max_records.to_string()),
                ("sort", "datedesc"),
            ])
            .send()
            .await
            .context("news: request failed")?;

        // An upstream outage is "no events", not a render failure.
        if !response.status().is_success() {
            tracing::warn!("news API returned status {}", response.status());
            return Ok(Vec::new());
        }

        let body = response.text().await.context("news: read body failed")?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        // The API answers rate limits and bad queries with plain text.
        let parsed: ArticleList = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("news API returned non-JSON body: {}", e);
                return Ok(Vec::new());
            }
        };

        // The subject is assigned per sub-query, not parsed from rows.
        Ok(parsed
            .articles
            .into_iter()
            .map(|row| NewsEvent {
                seen_at: row.seendate,
                subject: subject.to_string(),
                title: row.title.filter(|t| !t.is_empty()),
                url: row.url.filter(|u| !u.is_empty()),
                source_domain: row.domain.filter(|d| !d.is_empty()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(keywords: &[&str], domains: &[&str]) -> GdeltNewsSource {
        GdeltNewsSource::new(&NewsSettings {
            endpoint: "https://api.gdeltproject.org/api/v2/doc/doc".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            source_domains: domains.iter().map(|d| d.to_string()).collect(),
            max_records: 25,
        })
    }

    #[test]
    fn wraps_subject_and_keywords_in_proximity_window() {
        let query = source(&["crypto", "bitcoin"], &[]).build_query("lagarde");
        assert_eq!(query, "near15:\"lagarde (crypto OR bitcoin)\"");
    }

    #[test]
    fn appends_or_joined_source_allow_list() {
        let query =
            source(&["crypto"], &["reuters.com", "apnews.com"]).build_query("musk");
        assert_eq!(
            query,
            "near15:\"musk (crypto)\" (domainis:reuters.com OR domainis:apnews.com)"
        );
    }

    #[test]
    fn no_keywords_degrades_to_plain_subject_term() {
        let query = source(&[], &[]).build_query("putin");
        assert_eq!(query, "\"putin\"");
    }

    #[test]
    fn parses_article_rows() {
        let body = r#"{
            "articles": [
                {"seendate": "20250107T153000Z", "title": "Markets react", "url": "https://example.com/a", "domain": "example.com"},
                {"seendate": "20250107T160000Z", "title": ""}
            ]
        }"#;

        let parsed: ArticleList = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.articles.len(), 2);
        assert_eq!(parsed.articles[0].seendate, "20250107T153000Z");
        assert_eq!(parsed.articles[0].domain.as_deref(), Some("example.com"));
    }
}
