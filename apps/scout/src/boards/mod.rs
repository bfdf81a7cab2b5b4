//! Board existence probes for the two applicant-tracking platforms.
//!
//! A company counts as present on a platform when its public job-board
//! endpoint answers 2xx. Anything else drops the name; no retries.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::llm_client::build_http_client;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Greenhouse,
    Lever,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Platform::Greenhouse => "https://boards-api.greenhouse.io",
            Platform::Lever => "https://api.lever.co",
        }
    }

    /// Greenhouse: `{base}/v1/boards/{board}/jobs`
    /// Lever: `{base}/v0/postings/{board}?mode=json`
    fn board_url(&self, base: &str, board: &str) -> Option<Url> {
        let mut url = Url::parse(base).ok()?;
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.pop_if_empty();
            match self {
                Platform::Greenhouse => segments.extend(["v1", "boards", board, "jobs"]),
                Platform::Lever => segments.extend(["v0", "postings", board]),
            };
        }
        if *self == Platform::Lever {
            url.query_pairs_mut().append_pair("mode", "json");
        }
        Some(url)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found,
    /// The platform answered with a non-2xx status.
    Missing { status: u16 },
    /// No HTTP answer at all (connect error, timeout, bad URL).
    Failed { error: String },
}

/// Aggregate of one validation batch. `found` keeps completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub found: Vec<String>,
    pub missing: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct BoardProbe {
    client: Client,
    platform: Platform,
    base_url: String,
    max_in_flight: usize,
}

impl BoardProbe {
    pub fn new(platform: Platform, max_in_flight: usize) -> Self {
        Self::with_base_url(platform, platform.default_base_url(), max_in_flight)
    }

    pub fn with_base_url(platform: Platform, base_url: impl Into<String>, max_in_flight: usize) -> Self {
        Self {
            client: build_http_client(PROBE_TIMEOUT),
            platform,
            base_url: base_url.into(),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Probes a single board identifier.
    pub async fn probe(&self, board: &str) -> ProbeOutcome {
        let Some(url) = self.platform.board_url(&self.base_url, board) else {
            return ProbeOutcome::Failed {
                error: format!("cannot build board URL from base '{}'", self.base_url),
            };
        };

        debug!(platform = %self.platform, board, "Checking board");

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Found,
            Ok(response) => ProbeOutcome::Missing {
                status: response.status().as_u16(),
            },
            Err(e) => ProbeOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Returns the names whose board resolves, probing at most
    /// `max_in_flight` names at once. Duplicate inputs are probed once.
    pub async fn validate(&self, names: &[String]) -> ProbeReport {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect();

        let outcomes: Vec<(&str, ProbeOutcome)> = stream::iter(unique)
            .map(|name| async move { (name, self.probe(name).await) })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let mut report = ProbeReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                ProbeOutcome::Found => report.found.push(name.to_string()),
                ProbeOutcome::Missing { status } => {
                    debug!(platform = %self.platform, board = name, status, "Board not found");
                    report.missing += 1;
                }
                ProbeOutcome::Failed { error } => {
                    debug!(platform = %self.platform, board = name, %error, "Board probe failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            platform = %self.platform,
            found = report.found.len(),
            missing = report.missing,
            failed = report.failed,
            "Validation finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_greenhouse_url_shape() {
        let url = Platform::Greenhouse
            .board_url("https://boards-api.greenhouse.io", "oscar")
            .unwrap();
        assert_eq!(url.as_str(), "https://boards-api.greenhouse.io/v1/boards/oscar/jobs");
    }

    #[test]
    fn test_lever_url_shape() {
        let url = Platform::Lever.board_url("https://api.lever.co/", "ro").unwrap();
        assert_eq!(url.as_str(), "https://api.lever.co/v0/postings/ro?mode=json");
    }

    #[test]
    fn test_board_name_is_a_single_encoded_segment() {
        let url = Platform::Greenhouse
            .board_url("https://boards-api.greenhouse.io", "Oscar Health/../x")
            .unwrap();
        assert_eq!(
            url.path(),
            "/v1/boards/Oscar%20Health%2F..%2Fx/jobs"
        );
    }

    #[test]
    fn test_unusable_base_yields_no_url() {
        assert!(Platform::Lever.board_url("not a url", "ro").is_none());
        assert!(Platform::Lever.board_url("mailto:jobs@example.com", "ro").is_none());
    }

    #[tokio::test]
    async fn test_validate_keeps_only_resolving_boards() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/boards/realco/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"jobs": []}"#))
            .mount(&server)
            .await;

        let probe = BoardProbe::with_base_url(Platform::Greenhouse, server.uri(), 8);
        let report = probe.validate(&names(&["realco", "fakeco123xyz"])).await;

        assert_eq!(report.found, vec!["realco".to_string()]);
        assert_eq!(report.missing, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_lever_probe_sends_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/postings/Oscar%20Health"))
            .and(query_param("mode", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let probe = BoardProbe::with_base_url(Platform::Lever, server.uri(), 8);
        assert_eq!(probe.probe("Oscar Health").await, ProbeOutcome::Found);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_probed_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/boards/tempus/jobs"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let probe = BoardProbe::with_base_url(Platform::Greenhouse, server.uri(), 2);
        let report = probe
            .validate(&names(&["tempus", "tempus", "tempus"]))
            .await;

        assert_eq!(report.found, vec!["tempus".to_string()]);
    }

    #[tokio::test]
    async fn test_server_errors_count_as_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = BoardProbe::with_base_url(Platform::Lever, server.uri(), 4);
        assert_eq!(
            probe.probe("anyco").await,
            ProbeOutcome::Missing { status: 503 }
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_failure_not_found() {
        // Port 1 is reserved and refuses connections on loopback.
        let probe = BoardProbe::with_base_url(Platform::Greenhouse, "http://127.0.0.1:1", 4);
        let report = probe.validate(&names(&["realco"])).await;

        assert!(report.found.is_empty());
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_many_names_with_small_cap_all_complete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let input: Vec<String> = (0..25).map(|i| format!("company{i}")).collect();
        let probe = BoardProbe::with_base_url(Platform::Greenhouse, server.uri(), 3);
        let mut found = probe.validate(&input).await.found;
        found.sort();

        let mut expected = input.clone();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let probe = BoardProbe::with_base_url(Platform::Lever, "https://api.lever.co", 0);
        assert_eq!(probe.max_in_flight, 1);
    }
}
