// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

//! The error taxonomy of the analysis.
//!
//! Only the fatal kinds are modeled as `Error` variants. Resolution warnings
//! and unsound reflective calls are not failures: they are logged via `log`
//! and accumulated on the result for the caller to inspect (see
//! `crate::result`). Cancellation is likewise not an `Err` — it carries a
//! legitimate partial result, so it surfaces as `AnalysisOutcome::Cancelled`.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed configuration: bad YAML, an unknown top-level key, or a
    /// field whose shape does not match the schema in §6.
    #[error("configuration error in {path}: {reason}")]
    Configuration { path: String, reason: String },

    /// A statement's shape is inconsistent with its declared kind, e.g. a
    /// `LoadField` statement missing a base variable.
    #[error("IR invariant violated: {0}")]
    IrInvariantViolation(String),

    /// A canonicalization request used an invalid/sentinel entity id.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A non-fatal, plugin-raised handler failure. Plugin hooks return
/// `Result<(), Error>`; a handler exception is fatal to the *current solve*
/// per §4.2 and is propagated out of `Solver::run` via `?`.
impl Error {
    pub fn configuration(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Configuration { path: path.into(), reason: reason.to_string() }
    }
}
