//! Delivery of canonical events to the ingestion endpoint.
//!
//! - `transport`: the wire (`EventTransport`, reqwest-backed `HttpTransport`)
//! - `client`: validation, bounded retry and error classification
//! - `batch`: per-item failure aggregation across many events

pub mod batch;
pub mod client;
pub mod transport;

pub use batch::BatchFailure;
pub use client::{
    AttemptFailure, DeliveryClient, DeliveryError, DeliveryReport, DeliveryStats,
    DeliveryStatsSnapshot,
};
pub use transport::{
    EventTransport, HttpTransport, TransportConfig, TransportError, TransportResponse,
};
