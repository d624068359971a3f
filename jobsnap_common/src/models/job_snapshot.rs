use crate::prelude::*;
use crate::schema::*;

/// One job's name and status, as recorded during a single run.
#[derive(Clone, Debug, Eq, PartialEq, Queryable)]
pub struct JobSnapshot {
    /// The row ID assigned by SQLite.
    pub id: i32,
    /// The job name reported by the server.
    pub name: String,
    /// The status (Jenkins "color") reported by the server, or `None` for
    /// entries such as folders which have no color.
    pub status: Option<String>,
    /// Unix timestamp of the run which recorded this row. Shared by every row
    /// written during that run.
    pub checked_at: i64,
}

impl JobSnapshot {
    /// Load every recorded snapshot row, oldest first.
    pub fn all(conn: &SqliteConnection) -> Result<Vec<JobSnapshot>> {
        Ok(jobs::table
            .order(jobs::id)
            .load(conn)
            .context("could not load job snapshots")?)
    }
}

/// Data required to record a new `JobSnapshot`.
#[derive(Debug, Insertable)]
#[table_name = "jobs"]
pub struct NewJobSnapshot<'a> {
    /// The job name reported by the server.
    pub name: &'a str,
    /// The status reported by the server, if any.
    pub status: Option<&'a str>,
    /// Unix timestamp of the current run.
    pub checked_at: i64,
}

impl<'a> NewJobSnapshot<'a> {
    /// Build a row for `job`, stamped with `checked_at`.
    pub fn from_remote(job: &'a RemoteJob, checked_at: i64) -> Self {
        NewJobSnapshot {
            name: &job.name,
            status: job.status.as_deref(),
            checked_at,
        }
    }

    /// Insert this row into the database.
    pub fn insert(&self, conn: &SqliteConnection) -> diesel::QueryResult<usize> {
        diesel::insert_into(jobs::table).values(self).execute(conn)
    }
}
