//! Fetching the list of configured jobs from a Jenkins server.

use reqwest::blocking::Client;
use url::Url;

use crate::prelude::*;

/// The `tree` filter we pass to the JSON API, so that Jenkins only sends us
/// the fields we record.
const JOBS_TREE: &str = "jobs[name,color]";

/// Errors which can occur while fetching the job list.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server URL could not be parsed.
    #[error("invalid Jenkins URL {url:?}")]
    InvalidUrl {
        /// The URL we were given.
        url: String,
        /// What was wrong with it.
        source: url::ParseError,
    },

    /// We could not talk to the server, or it returned an error status.
    #[error("request to {url} failed")]
    Request {
        /// The URL we requested.
        url: Url,
        /// The underlying HTTP error.
        source: reqwest::Error,
    },

    /// The server answered, but not with a job list we understand.
    #[error("could not decode job list from {url}")]
    Decode {
        /// The URL we requested.
        url: Url,
        /// The underlying decoding error.
        source: reqwest::Error,
    },
}

/// Result type for fetching jobs.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Anything which can supply the current list of jobs.
pub trait JobSource {
    /// Fetch the jobs, in whatever order the source returns them.
    fn fetch_jobs(&self) -> FetchResult<Vec<RemoteJob>>;
}

/// The body of `/api/json`, reduced to the parts we ask for.
#[derive(Debug, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<RemoteJob>,
}

/// A minimal client for the Jenkins JSON API.
#[derive(Debug)]
pub struct JenkinsClient {
    server_url: String,
    client: Client,
}

impl JenkinsClient {
    /// Create a client for the server at `server_url`. The URL is only parsed
    /// when we actually fetch something.
    pub fn new(server_url: impl Into<String>) -> Self {
        JenkinsClient {
            server_url: server_url.into(),
            client: Client::new(),
        }
    }

    /// The URL of the job list endpoint for this server.
    fn jobs_url(&self) -> FetchResult<Url> {
        let mut base =
            Url::parse(&self.server_url).map_err(|source| FetchError::InvalidUrl {
                url: self.server_url.clone(),
                source,
            })?;

        // `Url::join` replaces the last path segment unless the base ends in
        // a slash, which would break servers mounted at `/jenkins`.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join("api/json")
            .map_err(|source| FetchError::InvalidUrl {
                url: self.server_url.clone(),
                source,
            })?;
        url.query_pairs_mut().append_pair("tree", JOBS_TREE);
        Ok(url)
    }
}

impl JobSource for JenkinsClient {
    #[instrument(skip(self), fields(server_url = %self.server_url), level = "debug")]
    fn fetch_jobs(&self) -> FetchResult<Vec<RemoteJob>> {
        let url = self.jobs_url()?;
        debug!("fetching job list from {}", url);

        let request_error = |source: reqwest::Error| FetchError::Request {
            url: url.clone(),
            source,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?;
        let job_list = response
            .json::<JobList>()
            .map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        trace!("fetched {} jobs", job_list.jobs.len());
        Ok(job_list.jobs)
    }
}

#[test]
fn jobs_url_adds_api_path_and_tree_filter() {
    let client = JenkinsClient::new("http://ci.example.com:8080");
    let url = client.jobs_url().expect("could not build URL");
    assert_eq!(url.path(), "/api/json");
    assert_eq!(
        url.query_pairs().collect::<Vec<_>>(),
        vec![("tree".into(), "jobs[name,color]".into())],
    );
}

#[test]
fn jobs_url_keeps_path_prefix() {
    let client = JenkinsClient::new("https://example.com/jenkins");
    let url = client.jobs_url().expect("could not build URL");
    assert_eq!(url.path(), "/jenkins/api/json");

    let client = JenkinsClient::new("https://example.com/jenkins/");
    let url = client.jobs_url().expect("could not build URL");
    assert_eq!(url.path(), "/jenkins/api/json");
}

#[test]
fn malformed_url_is_a_fetch_error() {
    let client = JenkinsClient::new("not a url");
    match client.fetch_jobs() {
        Err(FetchError::InvalidUrl { url, .. }) => assert_eq!(url, "not a url"),
        other => panic!("expected InvalidUrl, got {:?}", other),
    }
}

#[test]
fn unreachable_server_is_a_fetch_error() {
    // Nothing listens on port 1 of the loopback interface.
    let client = JenkinsClient::new("http://127.0.0.1:1/");
    match client.fetch_jobs() {
        Err(FetchError::Request { url, .. }) => {
            assert_eq!(url.as_str(), "http://127.0.0.1:1/api/json?tree=jobs%5Bname%2Ccolor%5D")
        }
        other => panic!("expected Request, got {:?}", other),
    }
}

#[test]
fn parses_job_list_response() {
    let json = r#"{
        "_class": "hudson.model.Hudson",
        "jobs": [
            {"_class": "hudson.model.FreeStyleProject", "name": "build-a", "color": "blue"},
            {"_class": "hudson.model.FreeStyleProject", "name": "build-b", "color": "red"}
        ]
    }"#;
    let parsed: JobList = serde_json::from_str(json).expect("parse error");
    assert_eq!(
        parsed.jobs,
        vec![RemoteJob::new("build-a", "blue"), RemoteJob::new("build-b", "red")],
    );
}

#[test]
fn missing_jobs_field_means_no_jobs() {
    let parsed: JobList = serde_json::from_str("{}").expect("parse error");
    assert!(parsed.jobs.is_empty());
}
