//! Run configuration, built once from the command line and then only read.

/// The SQLite file we write to when none is given.
pub const DEFAULT_SQLITE_NAME: &str = "jobs.sqlite";

/// Everything `get:jobs` needs to know about a single run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GetJobsConfig {
    /// Base URL of the Jenkins server to query. Not validated here; a bad URL
    /// shows up as a fetch failure.
    pub jenkins_url: String,
    /// Path of the SQLite database file to append the snapshot to.
    pub sqlite_name: String,
}

impl GetJobsConfig {
    /// Build a configuration, falling back to [`DEFAULT_SQLITE_NAME`] when no
    /// database name was supplied.
    pub fn new(jenkins_url: impl Into<String>, sqlite_name: Option<String>) -> Self {
        GetJobsConfig {
            jenkins_url: jenkins_url.into(),
            sqlite_name: sqlite_name
                .unwrap_or_else(|| DEFAULT_SQLITE_NAME.to_owned()),
        }
    }
}

#[test]
fn sqlite_name_defaults_to_jobs_sqlite() {
    let config = GetJobsConfig::new("http://ci.example.com", None);
    assert_eq!(config.sqlite_name, "jobs.sqlite");

    let config = GetJobsConfig::new("http://ci.example.com", Some("other.db".to_owned()));
    assert_eq!(config.sqlite_name, "other.db");
}
