#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions, // e.g. DeliveryError in sender module
    clippy::must_use_candidate,
    clippy::doc_markdown
)]

pub mod app;
pub mod domain;
pub mod mapper;
pub mod publisher;
pub mod reliability;
pub mod resolver;
pub mod sender;

pub use app::{App, Config, Pipeline, RawRecord};
pub use domain::{Event, Severity, SourceKind};
pub use mapper::EventMapper;
pub use resolver::HostnameResolver;
pub use sender::{DeliveryClient, DeliveryError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
