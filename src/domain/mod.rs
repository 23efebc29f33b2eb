//! Domain layer for telemetry-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `Event`: the normalized record every source format is translated into
//! - `Severity`: fixed severity vocabulary (critical/high/medium/low/info)
//! - `SourceKind`: which raw format a record came from
//! - `ParseError` / `ValidationError`: local, never-retried failures

pub mod error;
pub mod event;
pub mod severity;

pub use error::{ParseError, ValidationError};
pub use event::{Event, SENTINEL_IP, SourceKind, zero_timestamp};
pub use severity::{Severity, normalize};
