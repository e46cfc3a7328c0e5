//! Operator-facing sink for internal faults.
//!
//! `record` is synchronous and must never block: the response for the failed
//! request is written regardless of whether the report was delivered.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::FaultKind;

/// What operators get to see about an internal fault (clients do not).
#[derive(Debug, Clone)]
pub struct FaultReport {
    pub kind: FaultKind,
    pub correlation_id: String,
    pub method: String,
    pub path: String,
    pub detail: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

pub trait TelemetrySink: Send + Sync {
    fn record(&self, report: FaultReport);
}

/// Default sink: structured `error` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn record(&self, report: FaultReport) {
        tracing::error!(
            correlation_id = %report.correlation_id,
            method = %report.method,
            path = %report.path,
            detail = report.detail.as_deref().unwrap_or("-"),
            occurred_at = %report.occurred_at,
            "internal fault"
        );
    }
}

/// Forwards reports to a bounded channel; drops them when it is full or closed.
#[derive(Debug, Clone)]
pub struct ChannelTelemetrySink {
    tx: mpsc::Sender<FaultReport>,
}

impl ChannelTelemetrySink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FaultReport>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelTelemetrySink {
    fn record(&self, report: FaultReport) {
        if let Err(err) = self.tx.try_send(report) {
            tracing::warn!(error = %err, "fault report dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str) -> FaultReport {
        FaultReport {
            kind: FaultKind::Internal,
            correlation_id: id.to_string(),
            method: "GET".to_string(),
            path: "/api/v1/identity".to_string(),
            detail: Some("boom".to_string()),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (sink, mut rx) = ChannelTelemetrySink::new(1);

        sink.record(report("a"));
        sink.record(report("b"));

        assert_eq!(rx.recv().await.unwrap().correlation_id, "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (sink, rx) = ChannelTelemetrySink::new(1);
        drop(rx);
        sink.record(report("a"));
    }
}
