//! Error-handling code.

use std::{error::Error as StdError, fmt};

use anyhow::Error;

/// Support for displaying an error with a complete list of causes, and an
/// optional backtrace.
pub trait DisplayCausesAndBacktraceExt {
    /// Display the error and its causes, plus a backtrace (if available).
    fn display_causes_and_backtrace(&self) -> DisplayCauses<'_>;
}

impl DisplayCausesAndBacktraceExt for Error {
    fn display_causes_and_backtrace(&self) -> DisplayCauses<'_> {
        DisplayCauses {
            err: &**self,
            backtrace_from: Some(self),
        }
    }
}

/// Display any standard error (such as a `FetchError` or `StoreError`) followed
/// by its chain of causes, one per line.
pub fn display_causes<'a>(err: &'a (dyn StdError + 'static)) -> DisplayCauses<'a> {
    DisplayCauses {
        err,
        backtrace_from: None,
    }
}

/// Helper type used to display errors.
pub struct DisplayCauses<'a> {
    /// The error to display.
    err: &'a (dyn StdError + 'static),

    /// If present, print this error's backtrace after the causes.
    backtrace_from: Option<&'a Error>,
}

impl fmt::Display for DisplayCauses<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shown = self.err.to_string();
        writeln!(f, "{}", shown)?;
        let mut source = self.err.source();
        while let Some(next) = source {
            // Some errors (`reqwest`'s, for one) already include their cause
            // in their own message.
            let message = next.to_string();
            if !shown.contains(&message) {
                writeln!(f, "  caused by: {}", message)?;
            }
            shown = message;
            source = next.source();
        }

        if let Some(err) = self.backtrace_from {
            write!(f, "{}", err.backtrace())?;
        }
        Ok(())
    }
}

/// Generate a `main` function which calls the specified function. If the
/// function returns `Result::Err(_)`, then `main` will print the error and exit
/// with a non-zero status code.
#[macro_export]
macro_rules! quick_main {
    ($wrapped:ident) => {
        fn main() {
            if let Err(err) = $wrapped() {
                use ::std::io::Write;
                use $crate::errors::DisplayCausesAndBacktraceExt;
                let stderr = ::std::io::stderr();
                write!(
                    &mut stderr.lock(),
                    "ERROR: {}",
                    err.display_causes_and_backtrace()
                )
                .expect("Error occurred while trying to display error");
                ::std::process::exit(1);
            }
        }
    };
}

#[test]
fn display_causes_lists_every_source() {
    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer {
        source: std::io::Error,
    }

    let err = Outer {
        source: std::io::Error::new(std::io::ErrorKind::Other, "inner"),
    };
    assert_eq!(display_causes(&err).to_string(), "outer\n  caused by: inner\n");
}

#[test]
fn display_causes_skips_causes_already_in_the_message() {
    #[derive(Debug, thiserror::Error)]
    #[error("request failed: {source}")]
    struct Chatty {
        source: std::io::Error,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("could not fetch jobs")]
    struct Outer {
        source: Chatty,
    }

    let err = Outer {
        source: Chatty {
            source: std::io::Error::new(std::io::ErrorKind::Other, "connection refused"),
        },
    };
    assert_eq!(
        display_causes(&err).to_string(),
        "could not fetch jobs\n  caused by: request failed: connection refused\n",
    );
}

#[test]
fn display_causes_and_backtrace_for_anyhow() {
    let err = anyhow::format_err!("top").context("wrapper");
    assert!(err
        .display_causes_and_backtrace()
        .to_string()
        .starts_with("wrapper\n  caused by: top\n"));
}
