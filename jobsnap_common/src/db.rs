//! Database utilities.

use crate::prelude::*;

/// Create our one table if it isn't already there. Safe to run on every
/// invocation.
const CREATE_JOBS_TABLE: &str = "CREATE TABLE IF NOT EXISTS jobs \
     (id INTEGER PRIMARY KEY, name TEXT, status TEXT, checked_at INTEGER)";

/// Errors which can occur while recording a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file could not be opened or created.
    #[error("could not open SQLite database {path:?}")]
    Connect {
        /// The database file path.
        path: String,
        /// The underlying connection error.
        source: diesel::ConnectionError,
    },

    /// The `jobs` table could not be created.
    #[error("could not create the jobs table")]
    Schema {
        /// The underlying database error.
        source: diesel::result::Error,
    },

    /// A job row could not be inserted.
    #[error("could not insert job snapshot")]
    Insert {
        /// The underlying database error.
        source: diesel::result::Error,
    },
}

/// Result type for snapshot storage.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Open the SQLite database at `path`, creating the file if necessary.
pub fn connect(path: &str) -> StoreResult<SqliteConnection> {
    debug!("opening SQLite database {}", path);
    SqliteConnection::establish(path).map_err(|source| StoreError::Connect {
        path: path.to_owned(),
        source,
    })
}

/// Make sure the `jobs` table exists. Existing rows are left alone.
pub fn ensure_schema(conn: &SqliteConnection) -> StoreResult<()> {
    trace!("ensuring jobs table exists");
    diesel::sql_query(CREATE_JOBS_TABLE)
        .execute(conn)
        .map_err(|source| StoreError::Schema { source })?;
    Ok(())
}

/// Append one row per job, all stamped with `checked_at`. Returns the number
/// of rows written. The rows go in as a single transaction, so a failure
/// part-way through leaves no partial batch behind.
pub fn insert_batch(
    conn: &SqliteConnection,
    jobs: &[RemoteJob],
    checked_at: i64,
) -> StoreResult<usize> {
    let inserted = conn
        .transaction::<_, diesel::result::Error, _>(|| {
            let mut inserted = 0;
            for job in jobs {
                inserted += NewJobSnapshot::from_remote(job, checked_at).insert(conn)?;
            }
            Ok(inserted)
        })
        .map_err(|source| StoreError::Insert { source })?;
    debug!("inserted {} job snapshots at {}", inserted, checked_at);
    Ok(inserted)
}

/// Record one run: open the database, make sure the schema exists, and append
/// the batch.
#[instrument(skip(jobs), fields(job_count = jobs.len()), level = "debug")]
pub fn store_run(path: &str, jobs: &[RemoteJob], checked_at: i64) -> StoreResult<usize> {
    let conn = connect(path)?;
    ensure_schema(&conn)?;
    insert_batch(&conn, jobs, checked_at)
}

#[cfg(test)]
fn temp_db_path(dir: &tempfile::TempDir) -> String {
    dir.path()
        .join("jobs.sqlite")
        .to_str()
        .expect("temp path is not UTF-8")
        .to_owned()
}

#[test]
fn ensure_schema_is_idempotent() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = temp_db_path(&dir);
    let conn = connect(&path).expect("could not connect");

    ensure_schema(&conn).expect("first ensure_schema failed");
    insert_batch(&conn, &[RemoteJob::new("build-a", "blue")], 100)
        .expect("insert failed");
    ensure_schema(&conn).expect("second ensure_schema failed");

    let rows = JobSnapshot::all(&conn).expect("could not load rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "build-a");
}

#[test]
fn insert_batch_writes_one_row_per_job_with_shared_timestamp() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = temp_db_path(&dir);
    let jobs = vec![
        RemoteJob::new("build-a", "blue"),
        RemoteJob::new("build-b", "red"),
        RemoteJob::new("build-c", "disabled"),
    ];

    let inserted = store_run(&path, &jobs, 1_600_000_000).expect("store failed");
    assert_eq!(inserted, 3);

    let conn = connect(&path).expect("could not connect");
    let rows = JobSnapshot::all(&conn).expect("could not load rows");
    assert_eq!(rows.len(), jobs.len());
    for (row, job) in rows.iter().zip(&jobs) {
        assert_eq!(row.name, job.name);
        assert_eq!(row.status, job.status);
        assert_eq!(row.checked_at, 1_600_000_000);
    }
}

#[test]
fn repeated_runs_append_history() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = temp_db_path(&dir);
    let jobs = vec![RemoteJob::new("build-a", "blue")];

    store_run(&path, &jobs, 10).expect("first run failed");
    store_run(&path, &jobs, 20).expect("second run failed");

    let conn = connect(&path).expect("could not connect");
    let stamps = JobSnapshot::all(&conn)
        .expect("could not load rows")
        .into_iter()
        .map(|row| row.checked_at)
        .collect::<Vec<_>>();
    assert_eq!(stamps, vec![10, 20]);
}

#[test]
fn missing_directory_is_a_connect_error() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = dir.path().join("missing").join("jobs.sqlite");
    let path = path.to_str().expect("temp path is not UTF-8");
    match store_run(path, &[RemoteJob::new("build-a", "blue")], 1) {
        Err(StoreError::Connect { .. }) => {}
        other => panic!("expected Connect error, got {:?}", other),
    }
}

#[test]
fn incompatible_table_is_an_insert_error() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = temp_db_path(&dir);
    let conn = connect(&path).expect("could not connect");
    diesel::sql_query("CREATE TABLE jobs (id INTEGER PRIMARY KEY, title TEXT)")
        .execute(&conn)
        .expect("could not create conflicting table");

    match store_run(&path, &[RemoteJob::new("build-a", "blue")], 1) {
        Err(StoreError::Insert { .. }) => {}
        other => panic!("expected Insert error, got {:?}", other),
    }
}

#[test]
fn failed_row_rolls_back_the_whole_batch() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = temp_db_path(&dir);
    let conn = connect(&path).expect("could not connect");
    diesel::sql_query(
        "CREATE TABLE jobs (id INTEGER PRIMARY KEY, name TEXT, \
         status TEXT CHECK(status != 'bad'), checked_at INTEGER)",
    )
    .execute(&conn)
    .expect("could not create constrained table");

    let jobs = vec![RemoteJob::new("a", "blue"), RemoteJob::new("b", "bad")];
    match store_run(&path, &jobs, 1) {
        Err(StoreError::Insert { .. }) => {}
        other => panic!("expected Insert error, got {:?}", other),
    }

    let rows = JobSnapshot::all(&conn).expect("could not load rows");
    assert!(rows.is_empty(), "partial batch left behind: {:?}", rows);
}

#[test]
fn jobs_without_status_are_stored_as_null() {
    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = temp_db_path(&dir);
    let folder = RemoteJob {
        name: "team".to_owned(),
        status: None,
    };

    store_run(&path, &[folder], 5).expect("store failed");

    let conn = connect(&path).expect("could not connect");
    let rows = JobSnapshot::all(&conn).expect("could not load rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, None);
}
