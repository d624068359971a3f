//! The `get:jobs` subcommand.

use jobsnap_common::{db, errors::display_causes, prelude::*};
use prettytable::{format::consts::FORMAT_NO_LINESEP_WITH_TITLE, row, Table};
use std::io;
#[cfg(test)]
use std::{
    cell::Cell,
    path::Path,
    sync::{Arc, Mutex},
};

/// How a `get:jobs` run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// We couldn't get a job list from the server. Nothing was printed or
    /// stored.
    FetchFailed,
    /// The server has no jobs. The database was not touched.
    NoJobs,
    /// The jobs were printed and `count` rows were recorded.
    Stored {
        /// Number of rows written.
        count: usize,
    },
    /// The jobs were printed, but recording them failed.
    StoreFailed,
}

impl Outcome {
    /// Should the process exit successfully?
    pub fn is_success(self) -> bool {
        match self {
            Outcome::NoJobs | Outcome::Stored { .. } => true,
            Outcome::FetchFailed | Outcome::StoreFailed => false,
        }
    }
}

/// Run `get:jobs` against a real Jenkins server, printing to standard output.
pub fn run_with_jenkins(config: &GetJobsConfig) -> Result<Outcome> {
    let client = JenkinsClient::new(config.jenkins_url.clone());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&client, config, &mut out)
}

/// Fetch the jobs from `source`, print them to `out`, and record them in the
/// database named by `config`.
///
/// Fetch and store failures are reported on `out` and turned into an
/// `Outcome`. Only failures to write to `out` itself are returned as errors.
/// The failures are only logged at `debug` level, so by default the console
/// shows nothing but the lines written to `out`.
pub fn run<S, W>(source: &S, config: &GetJobsConfig, out: &mut W) -> Result<Outcome>
where
    S: JobSource + ?Sized,
    W: Write,
{
    let jobs = match source.fetch_jobs() {
        Ok(jobs) => jobs,
        Err(err) => {
            debug!("failed to fetch jobs from {}: {}", config.jenkins_url, err);
            writeln!(out, "It was not possible to access the given Jenkins instance.")?;
            write!(out, "{}", display_causes(&err))?;
            return Ok(Outcome::FetchFailed);
        }
    };

    if jobs.is_empty() {
        writeln!(out, "There are no configured jobs for the given Jenkins instance")?;
        return Ok(Outcome::NoJobs);
    }

    print_jobs(&jobs, out)?;

    let checked_at = Utc::now().timestamp();
    match db::store_run(&config.sqlite_name, &jobs, checked_at) {
        Ok(count) => {
            writeln!(
                out,
                "Note: We stored on {} db the currently configured jobs",
                config.sqlite_name,
            )?;
            Ok(Outcome::Stored { count })
        }
        Err(err) => {
            debug!("failed to store jobs in {}: {}", config.sqlite_name, err);
            writeln!(out, "It was not possible to store this run.")?;
            write!(out, "{}", display_causes(&err))?;
            Ok(Outcome::StoreFailed)
        }
    }
}

/// Print `jobs` as a bordered two-column table.
fn print_jobs<W: Write>(jobs: &[RemoteJob], out: &mut W) -> Result<()> {
    // This library makes some rather unusual API choices, but it draws a nice
    // box.
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(row!["Name", "Status"]);
    for job in jobs {
        table.add_row(row![job.name, job.status_text()]);
    }

    writeln!(out)?;
    writeln!(out, "List of currently configured jobs:")?;
    table.print(out).context("could not print job table")?;
    writeln!(out)?;
    Ok(())
}

/// A `JobSource` which returns a fixed list and counts how often it was
/// asked.
#[cfg(test)]
struct StaticJobs {
    jobs: Vec<RemoteJob>,
    calls: Cell<usize>,
}

#[cfg(test)]
impl StaticJobs {
    fn new(jobs: Vec<RemoteJob>) -> Self {
        StaticJobs {
            jobs,
            calls: Cell::new(0),
        }
    }
}

#[cfg(test)]
impl JobSource for StaticJobs {
    fn fetch_jobs(&self) -> FetchResult<Vec<RemoteJob>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.jobs.clone())
    }
}

/// A `JobSource` which always fails like a bad server URL would.
#[cfg(test)]
struct UnreachableServer;

#[cfg(test)]
impl JobSource for UnreachableServer {
    fn fetch_jobs(&self) -> FetchResult<Vec<RemoteJob>> {
        Err(FetchError::InvalidUrl {
            url: "jenkins.invalid".to_owned(),
            source: url_parse_error(),
        })
    }
}

#[cfg(test)]
fn url_parse_error() -> jobsnap_common::url::ParseError {
    jobsnap_common::url::ParseError::RelativeUrlWithoutBase
}

#[cfg(test)]
fn config_in(dir: &Path, file_name: &str) -> GetJobsConfig {
    let path = dir.join(file_name);
    GetJobsConfig::new(
        "http://ci.example.com/",
        Some(path.to_str().expect("temp path is not UTF-8").to_owned()),
    )
}

#[cfg(test)]
fn run_to_string<S: JobSource>(source: &S, config: &GetJobsConfig) -> (Outcome, String) {
    let mut out = vec![];
    let outcome = run(source, config, &mut out).expect("could not write output");
    (outcome, String::from_utf8(out).expect("output is not UTF-8"))
}

#[cfg(test)]
fn load_rows(config: &GetJobsConfig) -> Vec<JobSnapshot> {
    let conn = SqliteConnection::establish(&config.sqlite_name)
        .expect("could not open database");
    JobSnapshot::all(&conn).expect("could not load rows")
}

#[test]
fn records_and_prints_two_jobs() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let config = config_in(dir.path(), DEFAULT_SQLITE_NAME);
    let source = StaticJobs::new(vec![
        RemoteJob::new("build-a", "blue"),
        RemoteJob::new("build-b", "red"),
    ]);

    let (outcome, output) = run_to_string(&source, &config);
    assert_eq!(outcome, Outcome::Stored { count: 2 });
    assert!(outcome.is_success());
    assert_eq!(source.calls.get(), 1);

    assert!(output.starts_with("\nList of currently configured jobs:\n"));
    assert!(output.contains("| Name    | Status |"));
    assert!(output.contains("| build-a | blue   |"));
    assert!(output.contains("| build-b | red    |"));
    let last_line = output.lines().last().expect("no output");
    assert!(last_line.starts_with("Note: We stored on "));
    assert!(last_line.contains("jobs.sqlite"));

    let rows = load_rows(&config);
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].name.as_str(), rows[0].status.as_deref()), ("build-a", Some("blue")));
    assert_eq!((rows[1].name.as_str(), rows[1].status.as_deref()), ("build-b", Some("red")));
    assert_eq!(rows[0].checked_at, rows[1].checked_at);
}

#[test]
fn every_row_shares_one_timestamp() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let config = config_in(dir.path(), "many.sqlite");
    let jobs = (0..25)
        .map(|i| RemoteJob::new(format!("job-{}", i), "blue"))
        .collect::<Vec<_>>();

    let (outcome, _) = run_to_string(&StaticJobs::new(jobs), &config);
    assert_eq!(outcome, Outcome::Stored { count: 25 });

    let rows = load_rows(&config);
    assert_eq!(rows.len(), 25);
    assert!(rows.iter().all(|row| row.checked_at == rows[0].checked_at));
}

#[test]
fn empty_job_list_leaves_database_alone() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let config = config_in(dir.path(), "empty.sqlite");

    let (outcome, output) = run_to_string(&StaticJobs::new(vec![]), &config);
    assert_eq!(outcome, Outcome::NoJobs);
    assert!(outcome.is_success());
    assert_eq!(
        output,
        "There are no configured jobs for the given Jenkins instance\n",
    );
    assert!(!Path::new(&config.sqlite_name).exists());
}

#[test]
fn fetch_failure_prints_only_the_banner() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let config = config_in(dir.path(), "unused.sqlite");

    let (outcome, output) = run_to_string(&UnreachableServer, &config);
    assert_eq!(outcome, Outcome::FetchFailed);
    assert!(!outcome.is_success());

    let mut lines = output.lines();
    assert_eq!(
        lines.next(),
        Some("It was not possible to access the given Jenkins instance."),
    );
    assert_eq!(lines.next(), Some("invalid Jenkins URL \"jenkins.invalid\""));
    assert!(!output.contains("List of currently configured jobs:"));
    assert!(!Path::new(&config.sqlite_name).exists());
}

#[test]
fn store_failure_comes_after_the_printed_table() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let config = config_in(&dir.path().join("no-such-dir"), "jobs.sqlite");
    let source = StaticJobs::new(vec![
        RemoteJob::new("build-a", "blue"),
        RemoteJob::new("build-b", "red"),
        RemoteJob::new("build-c", "disabled"),
    ]);

    let (outcome, output) = run_to_string(&source, &config);
    assert_eq!(outcome, Outcome::StoreFailed);
    assert!(!outcome.is_success());

    let banner = output
        .find("It was not possible to store this run.")
        .expect("no store error banner");
    for name in &["build-a", "build-b", "build-c"] {
        let row = output.find(name).expect("job missing from table");
        assert!(row < banner);
    }
    assert!(output.contains("could not open SQLite database"));
    assert!(!output.contains("Note: We stored on"));
}

/// Collects everything a test subscriber logs.
#[cfg(test)]
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failures_log_nothing_at_the_default_level() {
    use jobsnap_common::tracing_support::DEFAULT_FILTER;
    use tracing_subscriber::EnvFilter;

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(DEFAULT_FILTER))
        .with_writer(move || writer.clone())
        .finish();

    let dir = tempfile::tempdir().expect("could not create temp dir");
    let unstorable = config_in(&dir.path().join("no-such-dir"), "jobs.sqlite");
    tracing::subscriber::with_default(subscriber, || {
        let (outcome, _) = run_to_string(&UnreachableServer, &unstorable);
        assert_eq!(outcome, Outcome::FetchFailed);
        let source = StaticJobs::new(vec![RemoteJob::new("build-a", "blue")]);
        let (outcome, _) = run_to_string(&source, &unstorable);
        assert_eq!(outcome, Outcome::StoreFailed);
    });

    let logs = logs.0.lock().expect("log buffer poisoned");
    assert!(logs.is_empty(), "unexpected log output: {}", String::from_utf8_lossy(&logs));
}

#[test]
fn jobs_without_status_print_a_blank_cell() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let config = config_in(dir.path(), DEFAULT_SQLITE_NAME);
    let source = StaticJobs::new(vec![
        RemoteJob::new("build-a", "blue"),
        RemoteJob {
            name: "team".to_owned(),
            status: None,
        },
    ]);

    let (outcome, output) = run_to_string(&source, &config);
    assert_eq!(outcome, Outcome::Stored { count: 2 });
    assert!(output.contains("| team    |        |"));
    assert_eq!(load_rows(&config)[1].status, None);
}
