//! Observability
//!
//! Structured JSON logging, typed events and atomic counters. Nothing in
//! here changes control flow: a failed write to stdout or stderr is
//! dropped.
//!
//! ```ignore
//! use cloudvault::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::UploadConfirmed, &[("size_bytes", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_upload_confirmed(42);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::ServerStart);
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", "/tmp/vault")]);
        log_event_with_fields(Event::MetadataWriteFailed, &[("object_key", "k")]);
    }
}
