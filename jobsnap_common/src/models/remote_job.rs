use crate::prelude::*;

/// A job as reported by the Jenkins JSON API.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RemoteJob {
    /// The job name.
    pub name: String,
    /// The build-health indicator, which Jenkins calls `color` ("blue",
    /// "red", "disabled", "blue_anime", ...). We never interpret it. Folders
    /// have no color, and are recorded with a `NULL` status.
    #[serde(rename = "color")]
    pub status: Option<String>,
}

impl RemoteJob {
    /// Create a job record with a status.
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        RemoteJob {
            name: name.into(),
            status: Some(status.into()),
        }
    }

    /// The status as shown to the user. Missing statuses print as blank.
    pub fn status_text(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

#[test]
fn deserializes_color_as_status() {
    let json = r#"{
        "_class": "hudson.model.FreeStyleProject",
        "name": "build-a",
        "color": "blue"
    }"#;
    let job: RemoteJob = serde_json::from_str(json).expect("parse error");
    assert_eq!(job, RemoteJob::new("build-a", "blue"));
    assert_eq!(job.status_text(), "blue");
}

#[test]
fn folders_without_color_have_no_status() {
    let json = r#"{"_class": "com.cloudbees.hudson.plugins.folder.Folder", "name": "team"}"#;
    let job: RemoteJob = serde_json::from_str(json).expect("parse error");
    assert_eq!(job.status, None);
    assert_eq!(job.status_text(), "");
}
