//! The projection consumer boundary.

use crate::envelope::EventEnvelope;
use crate::event::Event;

/// A consumer of committed events that maintains derived queryable state.
///
/// Callers must apply each committed event exactly once, in sequence order;
/// `apply` is not assumed to be idempotent.
pub trait Projection: Send + Sync {
    /// Returns `true` if this projection is interested in `event`.
    fn can_handle(&self, event: &Event) -> bool;

    /// Apply one committed event. Only called when `can_handle` returned
    /// `true` for it.
    fn apply(&self, event: &Event, envelope: &EventEnvelope);
}
