//! The commit-then-project funnel.

use std::sync::Arc;

use tracing::debug;

use strata_eventlog::{
    EventLogError, EventNormalizer, EventStore, EventsToPublish, Projection, SequenceNumber,
    StreamSelector,
};

/// Commits event batches and synchronously applies exactly the committed
/// slice to every registered projection.
///
/// By the time [`publish_events`](EventPersister::publish_events) returns,
/// all projections have observed the new events; a reader going through them
/// sees the batch's effects.
pub struct EventPersister {
    store: Arc<dyn EventStore>,
    projections: Vec<Arc<dyn Projection>>,
    normalizer: EventNormalizer,
}

impl EventPersister {
    pub fn new(store: Arc<dyn EventStore>, projections: Vec<Arc<dyn Projection>>) -> Self {
        Self {
            store,
            projections,
            normalizer: EventNormalizer,
        }
    }

    /// Commit one batch and catch all projections up.
    ///
    /// Empty batches are short-circuited: commands with nothing to record
    /// succeed without touching the store.
    pub fn publish_events(&self, to_publish: EventsToPublish) -> Result<(), EventLogError> {
        if to_publish.events.is_empty() {
            return Ok(());
        }
        let data = to_publish
            .events
            .iter()
            .map(|event| self.normalizer.normalize(event))
            .collect::<Result<Vec<_>, _>>()?;
        let committed_count = data.len() as u64;
        let result = self
            .store
            .commit(&to_publish.stream_name, data, to_publish.expected_version)?;

        // Re-read exactly the slice this commit wrote, in global order, and
        // feed it to the projections.
        let first_committed = SequenceNumber(
            result.highest_committed_sequence_number.value() - committed_count + 1,
        );
        let slice = self
            .store
            .load(&StreamSelector::All)
            .with_minimum_sequence_number(first_committed);
        debug!(
            stream = %to_publish.stream_name,
            events = committed_count,
            "committed; projecting slice"
        );
        for envelope in slice.iter() {
            let event = self.normalizer.denormalize(&envelope.event)?;
            for projection in &self.projections {
                if projection.can_handle(&event) {
                    projection.apply(&event, envelope);
                }
            }
        }
        Ok(())
    }
}
