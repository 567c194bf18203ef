use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A problem exactly as the catalog (or the fallback dataset) describes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProblem {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub topic: Option<String>,
    pub domain: Option<String>,
    pub difficulty: Option<String>,
    pub status: Option<String>,
    pub starred: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub problem_link: Option<String>,
    pub completed_at: Option<Value>,
    pub updated_at: Option<Value>,
    pub time_spent: Option<Value>,
    pub notes: Option<String>,
    pub solution: Option<String>,
    pub approach: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogPayload {
    Wrapped { problems: Vec<RawProblem> },
    Bare(Vec<RawProblem>),
}

/// Parse a catalog response body. Accepts the wrapped object or a bare array.
pub fn parse_catalog(body: &str) -> Result<Vec<RawProblem>> {
    let payload: CatalogPayload = serde_json::from_str(body)?;
    Ok(match payload {
        CatalogPayload::Wrapped { problems } => problems,
        CatalogPayload::Bare(problems) => problems,
    })
}

/// Anything that can produce the remote problem list.
pub trait CatalogSource {
    fn fetch_problems(&self) -> Result<Vec<RawProblem>>;
}

pub struct HttpCatalog {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn problems_url(&self) -> String {
        format!("{}/problems", self.base_url)
    }

    pub fn theory_url(&self, topic_slug: &str) -> String {
        format!("{}/theory/{}", self.base_url, topic_slug)
    }

    fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::BadStatus(status.as_u16()));
        }
        Ok(response.text()?)
    }

    /// Static study material for a topic; returned as-is.
    pub fn fetch_theory(&self, topic_slug: &str) -> Result<String> {
        self.get_text(&self.theory_url(topic_slug))
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch_problems(&self) -> Result<Vec<RawProblem>> {
        let body = self.get_text(&self.problems_url())?;
        let problems = parse_catalog(&body)?;
        info!("Fetched {} problems from {}", problems.len(), self.base_url);
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn parses_wrapped_payload() {
            let body = r#"{
                "problems": [
                    {"id": "p1", "title": "Two Sum", "topic": "Arrays", "difficulty": "Easy",
                     "status": "Pending", "problemLink": "https://leetcode.com/problems/two-sum"}
                ],
                "topics": [{"id": "arrays", "name": "Arrays"}]
            }"#;
            let problems = parse_catalog(body).unwrap();
            assert_eq!(problems.len(), 1);
            assert_eq!(problems[0].title.as_deref(), Some("Two Sum"));
            assert_eq!(
                problems[0].problem_link.as_deref(),
                Some("https://leetcode.com/problems/two-sum")
            );
        }

        #[test]
        fn parses_bare_array() {
            let problems = parse_catalog(r#"[{"id": 7, "topic": "Trees"}]"#).unwrap();
            assert_eq!(problems.len(), 1);
            assert_eq!(problems[0].id, Some(serde_json::json!(7)));
        }

        #[test]
        fn topics_are_optional() {
            let problems = parse_catalog(r#"{"problems": []}"#).unwrap();
            assert!(problems.is_empty());
        }

        #[test]
        fn unknown_fields_are_ignored() {
            let problems =
                parse_catalog(r#"[{"id": "p1", "companies": ["acme"], "likes": 10}]"#).unwrap();
            assert_eq!(problems.len(), 1);
        }

        #[test]
        fn malformed_body_is_an_error() {
            assert!(matches!(parse_catalog("<html>"), Err(Error::Json(_))));
            assert!(parse_catalog(r#"{"items": []}"#).is_err());
        }
    }

    mod http_tests {
        use super::*;

        #[test]
        fn urls_strip_trailing_slash() {
            let catalog = HttpCatalog::new("http://localhost:3001/api/", Duration::from_secs(1))
                .unwrap();
            assert_eq!(catalog.problems_url(), "http://localhost:3001/api/problems");
            assert_eq!(
                catalog.theory_url("sliding-window"),
                "http://localhost:3001/api/theory/sliding-window"
            );
        }

        #[test]
        fn invalid_url_fails_without_network() {
            let catalog = HttpCatalog::new("not a url", Duration::from_secs(1)).unwrap();
            assert!(matches!(catalog.fetch_problems(), Err(Error::Http(_))));
        }
    }
}
