//! Code shared by the `jobsnap` tools: fetching job lists from a Jenkins
//! server and recording snapshots of them in SQLite.

#![warn(missing_docs)]

// Diesel's `table!` and derive macros still expect to be imported this way.
#[macro_use]
pub extern crate diesel;

pub use anyhow;
pub use chrono;
pub use url;

pub mod config;
pub mod db;
pub mod errors;
pub mod jenkins;
pub mod models;
#[allow(missing_docs, unused_imports)]
mod schema;
pub mod tracing_support;

/// Common imports used by many modules.
pub mod prelude {
    pub use anyhow::{format_err, Context};
    pub use chrono::Utc;
    pub use diesel::{self, prelude::*, SqliteConnection};
    pub use serde::Deserialize;
    pub use std::{fmt, io::Write};
    pub use tracing::{debug, error, info, instrument, trace, warn};

    pub use super::config::*;
    pub use super::db::{StoreError, StoreResult};
    pub use super::jenkins::{FetchError, FetchResult, JenkinsClient, JobSource};
    pub use super::models::*;
    pub use super::{Error, Result};
}

/// Error type for this crate's functions.
pub type Error = anyhow::Error;

/// Result type for this crate's functions.
pub type Result<T, E = Error> = std::result::Result<T, E>;
