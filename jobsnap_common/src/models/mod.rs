//! Database models.

mod job_snapshot;
mod remote_job;

pub use self::job_snapshot::*;
pub use self::remote_job::*;
