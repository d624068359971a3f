//! Record snapshots of the jobs configured on a Jenkins server.

use jobsnap_common::{prelude::*, quick_main, tracing_support::initialize_tracing};
use std::process;
use structopt::StructOpt;

mod cmd;

/// Command-line options, parsed using `structopt`.
#[derive(Debug, StructOpt)]
#[structopt(about = "Record snapshots of the jobs configured on a Jenkins server.")]
enum Opt {
    /// Get the list of Jenkins jobs and store them in a SQLite database.
    #[structopt(name = "get:jobs")]
    GetJobs {
        /// Jenkins URL you want to monitor.
        jenkins_url: String,

        /// SQLite database to store the jobs in [default: jobs.sqlite].
        sqlite_name: Option<String>,
    },
}

quick_main!(run);

fn run() -> Result<()> {
    initialize_tracing();
    let opt = Opt::from_args();
    debug!("Args: {:?}", opt);

    let outcome = match opt {
        Opt::GetJobs {
            jenkins_url,
            sqlite_name,
        } => {
            let config = GetJobsConfig::new(jenkins_url, sqlite_name);
            cmd::get_jobs::run_with_jenkins(&config)?
        }
    };

    // The failure has already been reported to the user.
    if !outcome.is_success() {
        process::exit(1);
    }
    Ok(())
}

#[test]
fn parses_get_jobs_arguments() {
    let opt = Opt::from_iter(&["jobsnap", "get:jobs", "http://ci.example.com"]);
    match opt {
        Opt::GetJobs {
            jenkins_url,
            sqlite_name,
        } => {
            assert_eq!(jenkins_url, "http://ci.example.com");
            assert_eq!(sqlite_name, None);
        }
    }

    let opt = Opt::from_iter(&["jobsnap", "get:jobs", "http://ci.example.com", "history.db"]);
    match opt {
        Opt::GetJobs { sqlite_name, .. } => {
            assert_eq!(sqlite_name.as_deref(), Some("history.db"))
        }
    }
}

#[test]
fn jenkins_url_is_required() {
    assert!(Opt::from_iter_safe(&["jobsnap", "get:jobs"]).is_err());
}
