//! Event history capture for testing
//!
//! The log is shareable between clones so a wrapper and a test can both
//! hold it while operations are recorded.

use super::events::{Event, OperationId, OperationResult, OperationType, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe event log for capturing operation history
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<RwLock<EventLogInner>>,
    next_op_id: Arc<AtomicU64>,
}

struct EventLogInner {
    events: Vec<Event>,
    pending: HashMap<OperationId, usize>, // op_id -> index in events
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(EventLogInner {
                events: Vec::new(),
                pending: HashMap::new(),
            })),
            next_op_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Record a new operation invocation
    pub fn record_invoke(&self, op_type: OperationType) -> OperationId {
        let op_id = OperationId::new(self.next_op_id.fetch_add(1, Ordering::SeqCst));
        let event = Event::invoke(op_id, op_type);

        let mut inner = self.inner.write();
        let index = inner.events.len();
        inner.events.push(event);
        inner.pending.insert(op_id, index);

        op_id
    }

    /// Record operation completion
    pub fn record_return(&self, op_id: OperationId, result: OperationResult) {
        let mut inner = self.inner.write();

        if let Some(index) = inner.pending.remove(&op_id) {
            if let Some(event) = inner.events.get_mut(index) {
                event.complete(result);
            }
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.read().events.clone()
    }

    pub fn completed_events(&self) -> Vec<Event> {
        self.inner
            .read()
            .events
            .iter()
            .filter(|e| e.is_complete())
            .cloned()
            .collect()
    }

    pub fn pending_events(&self) -> Vec<Event> {
        self.inner
            .read()
            .events
            .iter()
            .filter(|e| !e.is_complete())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().events.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.events.clear();
        inner.pending.clear();
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.events())
    }

    /// Import from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let events: Vec<Event> = serde_json::from_str(json)?;
        let log = Self::new();

        let mut max_op_id = 0u64;
        let mut pending_entries = Vec::new();
        for (idx, event) in events.iter().enumerate() {
            max_op_id = max_op_id.max(event.op_id.0);
            if !event.is_complete() {
                pending_entries.push((event.op_id, idx));
            }
        }

        let mut inner = log.inner.write();
        inner.events = events;
        inner.pending.extend(pending_entries);
        drop(inner);

        log.next_op_id.store(max_op_id + 1, Ordering::SeqCst);

        Ok(log)
    }

    pub fn events_by_type(&self, filter: impl Fn(&OperationType) -> bool) -> Vec<Event> {
        self.inner
            .read()
            .events
            .iter()
            .filter(|e| filter(&e.op_type))
            .cloned()
            .collect()
    }

    pub fn post_operations(&self) -> Vec<Event> {
        self.events_by_type(|op| matches!(op, OperationType::Post { .. }))
    }

    pub fn favorite_operations(&self) -> Vec<Event> {
        self.events_by_type(|op| matches!(op, OperationType::Favorite { .. }))
    }

    pub fn search_operations(&self) -> Vec<Event> {
        self.events_by_type(|op| matches!(op, OperationType::Search { .. }))
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchOrder;

    fn post(author: &str, message: &str) -> OperationType {
        OperationType::Post {
            author: author.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_event_log_basic() {
        let log = EventLog::new();

        let op_id = log.record_invoke(post("@ana", "hi"));

        assert_eq!(log.len(), 1);
        assert_eq!(log.pending_events().len(), 1);
        assert_eq!(log.completed_events().len(), 0);

        log.record_return(op_id, OperationResult::PostSuccess { id: 0 });

        assert_eq!(log.pending_events().len(), 0);
        assert_eq!(log.completed_events().len(), 1);
    }

    #[test]
    fn test_out_of_order_completion() {
        let log = EventLog::new();

        let op1 = log.record_invoke(post("@ana", "one"));
        let op2 = log.record_invoke(post("@bob", "two"));

        log.record_return(op2, OperationResult::PostSuccess { id: 1 });
        assert_eq!(log.pending_events()[0].op_id, op1);

        log.record_return(op1, OperationResult::PostSuccess { id: 0 });
        assert!(log.pending_events().is_empty());
    }

    #[test]
    fn test_event_log_json_roundtrip() {
        let log = EventLog::new();

        let op_id = log.record_invoke(OperationType::Favorite { id: 4 });
        log.record_return(op_id, OperationResult::FavoriteSuccess { id: 4 });
        log.record_invoke(OperationType::Get { id: 9 });

        let json = log.to_json().unwrap();
        let restored = EventLog::from_json(&json).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.completed_events().len(), 1);
        assert_eq!(restored.pending_events().len(), 1);

        let events = restored.events();
        assert_eq!(events[0].op_type, OperationType::Favorite { id: 4 });

        let next = restored.record_invoke(OperationType::Get { id: 0 });
        assert_eq!(next, OperationId::new(3));
    }

    #[test]
    fn test_event_log_type_filters() {
        let log = EventLog::new();

        log.record_invoke(post("@ana", "hi"));
        log.record_invoke(OperationType::Favorite { id: 0 });
        log.record_invoke(OperationType::Search {
            token: "@ana".to_string(),
            order: SearchOrder::Popular,
            limit: 3,
        });

        assert_eq!(log.post_operations().len(), 1);
        assert_eq!(log.favorite_operations().len(), 1);
        assert_eq!(log.search_operations().len(), 1);
    }

    #[test]
    fn test_event_log_clear() {
        let log = EventLog::new();
        let op_id = log.record_invoke(post("@ana", "hi"));
        log.record_return(op_id, OperationResult::PostSuccess { id: 0 });

        log.clear();

        assert!(log.is_empty());
    }
}
