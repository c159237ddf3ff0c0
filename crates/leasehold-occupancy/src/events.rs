//! Lease lifecycle events.
//!
//! The ledger publishes one event after each committed mutation. Sinks
//! are fire-and-forget: a failed publish is logged by the ledger and
//! never undoes the mutation.

use chrono::NaiveDate;
use leasehold_core::models::ids::{LeaseId, PropertyId, TenantId, UnitId};
use leasehold_core::models::lease::Lease;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LeaseEvent {
    Assigned {
        lease_id: LeaseId,
        property_id: PropertyId,
        unit_id: UnitId,
        tenant_id: TenantId,
        move_in_date: NaiveDate,
        move_out_date: Option<NaiveDate>,
    },
    Renewed {
        lease_id: LeaseId,
        property_id: PropertyId,
        unit_id: UnitId,
        tenant_id: TenantId,
        new_move_out_date: Option<NaiveDate>,
        renewal_count: u32,
    },
    Terminated {
        lease_id: LeaseId,
        property_id: PropertyId,
        unit_id: UnitId,
        tenant_id: TenantId,
        effective_date: Option<NaiveDate>,
        reason: Option<String>,
    },
}

impl LeaseEvent {
    pub fn assigned(lease: &Lease) -> Self {
        Self::Assigned {
            lease_id: lease.id,
            property_id: lease.property_id,
            unit_id: lease.unit_id,
            tenant_id: lease.tenant_id,
            move_in_date: lease.move_in_date,
            move_out_date: lease.move_out_date,
        }
    }

    pub fn renewed(lease: &Lease) -> Self {
        Self::Renewed {
            lease_id: lease.id,
            property_id: lease.property_id,
            unit_id: lease.unit_id,
            tenant_id: lease.tenant_id,
            new_move_out_date: lease.move_out_date,
            renewal_count: lease.renewal_count,
        }
    }

    pub fn terminated(lease: &Lease) -> Self {
        Self::Terminated {
            lease_id: lease.id,
            property_id: lease.property_id,
            unit_id: lease.unit_id,
            tenant_id: lease.tenant_id,
            effective_date: lease.terminated_on,
            reason: lease.termination_reason.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Assigned { .. } => "assigned",
            Self::Renewed { .. } => "renewed",
            Self::Terminated { .. } => "terminated",
        }
    }

    pub fn lease_id(&self) -> LeaseId {
        match self {
            Self::Assigned { lease_id, .. }
            | Self::Renewed { lease_id, .. }
            | Self::Terminated { lease_id, .. } => *lease_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event channel is full")]
    ChannelFull,

    #[error("event channel is closed")]
    ChannelClosed,
}

/// Destination for lease lifecycle events.
pub trait LeaseEventSink: Send + Sync {
    fn publish(&self, event: LeaseEvent) -> impl Future<Output = Result<(), EventError>> + Send;
}

/// Writes every event to the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl LeaseEventSink for TracingEventSink {
    async fn publish(&self, event: LeaseEvent) -> Result<(), EventError> {
        info!(
            kind = event.kind(),
            lease_id = %event.lease_id(),
            event = ?event,
            "Lease event"
        );
        Ok(())
    }
}

/// Hands events to an out-of-process dispatcher over a bounded channel.
///
/// Publishing never waits: a full or closed channel is reported as an
/// error and the event is dropped.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::Sender<LeaseEvent>,
}

impl ChannelEventSink {
    pub fn new(sender: mpsc::Sender<LeaseEvent>) -> Self {
        Self { sender }
    }

    /// A sink and the receiving end of a fresh channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LeaseEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

impl LeaseEventSink for ChannelEventSink {
    async fn publish(&self, event: LeaseEvent) -> Result<(), EventError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => EventError::ChannelFull,
            TrySendError::Closed(_) => EventError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: i64) -> LeaseEvent {
        LeaseEvent::Assigned {
            lease_id: LeaseId(id),
            property_id: PropertyId(1),
            unit_id: UnitId(2),
            tenant_id: TenantId(3),
            move_in_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            move_out_date: None,
        }
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelEventSink::channel(4);
        sink.publish(event(1)).await.unwrap();
        sink.publish(event(2)).await.unwrap();
        assert_eq!(rx.recv().await.map(|e| e.lease_id()), Some(LeaseId(1)));
        assert_eq!(rx.recv().await.map(|e| e.lease_id()), Some(LeaseId(2)));
    }

    #[tokio::test]
    async fn full_and_closed_channels_are_errors() {
        let (sink, rx) = ChannelEventSink::channel(1);
        sink.publish(event(1)).await.unwrap();
        assert!(matches!(
            sink.publish(event(2)).await,
            Err(EventError::ChannelFull)
        ));
        drop(rx);
        assert!(matches!(
            sink.publish(event(3)).await,
            Err(EventError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn tracing_sink_accepts_everything() {
        assert!(TracingEventSink.publish(event(1)).await.is_ok());
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_value(event(9)).unwrap();
        assert_eq!(json["event"], "assigned");
        assert_eq!(json["lease_id"], 9);
    }
}
