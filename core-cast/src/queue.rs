//! # Queue Reconciliation
//!
//! Resolves the items around the current queue position from the provider's
//! lazily populated item cache and reports a single "settled" result once
//! every one of them is available.
//!
//! ## States
//!
//! ```text
//!            refresh (empty interest)
//!     ┌──────────────────────────────────────┐
//!     │                                      v
//! ┌───┴──┐  refresh   ┌───────────┐  all   ┌─────────┐
//! │ Idle ├───────────>│ Resolving ├───────>│ Settled │──> back to Idle
//! └──────┘            └─────┬─────┘        └─────────┘
//!                           │ updated-at-indexes (tracked only)
//!                           └──> re-check
//! ```
//!
//! A settled result is handed to the caller exactly once; the interest set
//! is cleared at the same time, so any later event starts a fresh cycle.
//!
//! The reconciler itself holds no lock. The session controller owns it
//! inside its state mutex, which serializes every entry point for a queue.

use std::collections::BTreeSet;
use std::sync::Arc;

use bridge_traits::cast::{MediaQueue, QueueEvent};
use core_runtime::model::QueueItemSnapshot;
use tracing::{debug, trace};

/// Indexes worth resolving around `current`: `{c-1, c, c+1} ∩ [0, len)`.
///
/// Empty when there is no valid current index.
pub fn interest_set(current: Option<usize>, len: usize) -> BTreeSet<usize> {
    let Some(current) = current.filter(|&index| index < len) else {
        return BTreeSet::new();
    };

    let first = current.saturating_sub(1);
    let last = (current + 1).min(len - 1);
    (first..=last).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Resolving,
}

/// Result of feeding an event to the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueOutcome {
    /// The event did not start a cycle.
    Ignored,
    /// At least one interesting index is still being fetched.
    Pending,
    /// Every interesting index resolved. Emitted once per cycle.
    Settled(Vec<QueueItemSnapshot>),
}

pub struct QueueReconciler {
    queue: Arc<dyn MediaQueue>,
    interest: BTreeSet<usize>,
    state: ReconcileState,
    settled: Vec<QueueItemSnapshot>,
}

impl QueueReconciler {
    pub fn new(queue: Arc<dyn MediaQueue>) -> Self {
        Self {
            queue,
            interest: BTreeSet::new(),
            state: ReconcileState::Idle,
            settled: Vec::new(),
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    pub fn interest(&self) -> &BTreeSet<usize> {
        &self.interest
    }

    /// Items of the last settled cycle.
    pub fn settled_items(&self) -> &[QueueItemSnapshot] {
        &self.settled
    }

    pub fn item_count(&self) -> usize {
        self.queue.item_count()
    }

    /// Queue index of `item_id`, if the queue knows it.
    pub fn index_of(&self, item_id: Option<i32>) -> Option<usize> {
        item_id.and_then(|id| self.queue.index_of_item_id(id))
    }

    /// Apply one provider queue notification.
    ///
    /// `current_item_id` is the live status' current item, used whenever the
    /// interest set has to be recomputed.
    pub fn on_event(&mut self, event: &QueueEvent, current_item_id: Option<i32>) -> QueueOutcome {
        match event {
            QueueEvent::ItemsReloaded => {
                if self.queue.item_count() == 0 {
                    debug!("Queue reloaded empty, ignoring");
                    return QueueOutcome::Ignored;
                }
                self.refresh(current_item_id)
            }
            QueueEvent::ItemsInsertedInRange { .. } | QueueEvent::ItemsRemovedAtIndexes(_) => {
                self.refresh(current_item_id)
            }
            QueueEvent::ItemsUpdatedAtIndexes(indexes) => {
                if indexes.iter().any(|index| !self.interest.contains(index)) {
                    // Content changed somewhere, not just a cache fill.
                    self.refresh(current_item_id)
                } else if self.state == ReconcileState::Resolving {
                    self.check()
                } else {
                    QueueOutcome::Ignored
                }
            }
        }
    }

    /// Recompute the interest set from scratch and try to settle.
    pub fn refresh(&mut self, current_item_id: Option<i32>) -> QueueOutcome {
        let len = self.queue.item_ids().len();
        let current = self.index_of(current_item_id);
        self.interest = interest_set(current, len);
        self.state = ReconcileState::Resolving;
        debug!(?current, len, interest = ?self.interest, "Queue interest recomputed");
        self.check()
    }

    fn check(&mut self) -> QueueOutcome {
        let mut items = Vec::with_capacity(self.interest.len());
        let mut outstanding = 0usize;

        for &index in &self.interest {
            match self.queue.item_at_index(index, true) {
                Some(item) => items.push(QueueItemSnapshot { index, item }),
                None => outstanding += 1,
            }
        }

        if outstanding > 0 {
            trace!(outstanding, "Waiting for queue items");
            return QueueOutcome::Pending;
        }

        self.interest.clear();
        self.state = ReconcileState::Idle;
        self.settled = items.clone();
        QueueOutcome::Settled(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::cast::{QueueItem, QueueListener, Registration};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Queue whose cache is filled explicitly by the test.
    struct FakeQueue {
        ids: Mutex<Vec<i32>>,
        cached: Mutex<HashSet<usize>>,
        requested: Mutex<Vec<usize>>,
    }

    impl FakeQueue {
        fn new(ids: &[i32]) -> Arc<Self> {
            Arc::new(Self {
                ids: Mutex::new(ids.to_vec()),
                cached: Mutex::new(HashSet::new()),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn cache(&self, indexes: &[usize]) {
            self.cached.lock().extend(indexes.iter().copied());
        }
    }

    impl MediaQueue for FakeQueue {
        fn item_ids(&self) -> Vec<i32> {
            self.ids.lock().clone()
        }

        fn item_count(&self) -> usize {
            self.ids.lock().len()
        }

        fn index_of_item_id(&self, item_id: i32) -> Option<usize> {
            self.ids.lock().iter().position(|&id| id == item_id)
        }

        fn item_at_index(&self, index: usize, fetch_if_missing: bool) -> Option<QueueItem> {
            if fetch_if_missing {
                self.requested.lock().push(index);
            }
            let id = *self.ids.lock().get(index)?;
            self.cached.lock().contains(&index).then(|| QueueItem {
                item_id: id,
                media: None,
                autoplay: true,
                start_time: 0.0,
                custom_data: None,
            })
        }

        fn register_callback(&self, _listener: QueueListener) -> Registration {
            Registration::new()
        }
    }

    fn indexes(outcome: &QueueOutcome) -> Vec<usize> {
        match outcome {
            QueueOutcome::Settled(items) => items.iter().map(|item| item.index).collect(),
            other => panic!("expected settled, got {:?}", other),
        }
    }

    #[test]
    fn test_interest_set_bounds() {
        assert_eq!(interest_set(Some(0), 1), BTreeSet::from([0]));
        assert_eq!(interest_set(Some(0), 3), BTreeSet::from([0, 1]));
        assert_eq!(interest_set(Some(1), 3), BTreeSet::from([0, 1, 2]));
        assert_eq!(interest_set(Some(2), 3), BTreeSet::from([1, 2]));
        assert!(interest_set(None, 3).is_empty());
        assert!(interest_set(Some(3), 3).is_empty());
        assert!(interest_set(Some(0), 0).is_empty());
    }

    #[test]
    fn test_no_current_item_settles_empty() {
        let queue = FakeQueue::new(&[10, 11]);
        let mut reconciler = QueueReconciler::new(queue);

        assert_eq!(reconciler.refresh(None), QueueOutcome::Settled(vec![]));
        assert_eq!(reconciler.state(), ReconcileState::Idle);
    }

    #[test]
    fn test_settles_once_regardless_of_delivery_order() {
        let queue = FakeQueue::new(&[10, 11, 12]);
        let mut reconciler = QueueReconciler::new(queue.clone());

        assert_eq!(reconciler.refresh(Some(11)), QueueOutcome::Pending);
        assert_eq!(reconciler.interest(), &BTreeSet::from([0, 1, 2]));

        queue.cache(&[2]);
        assert_eq!(
            reconciler.on_event(&QueueEvent::ItemsUpdatedAtIndexes(vec![2]), Some(11)),
            QueueOutcome::Pending
        );

        queue.cache(&[0]);
        assert_eq!(
            reconciler.on_event(&QueueEvent::ItemsUpdatedAtIndexes(vec![0]), Some(11)),
            QueueOutcome::Pending
        );

        queue.cache(&[1]);
        let outcome = reconciler.on_event(&QueueEvent::ItemsUpdatedAtIndexes(vec![1]), Some(11));
        assert_eq!(indexes(&outcome), vec![0, 1, 2]);
        assert!(reconciler.interest().is_empty());

        // A duplicate cache fill after settling does not settle again.
        assert_eq!(
            reconciler.on_event(&QueueEvent::ItemsUpdatedAtIndexes(vec![]), Some(11)),
            QueueOutcome::Ignored
        );
        assert_eq!(reconciler.settled_items().len(), 3);
    }

    #[test]
    fn test_untracked_index_update_recomputes() {
        let queue = FakeQueue::new(&[10, 11, 12, 13, 14]);
        let mut reconciler = QueueReconciler::new(queue.clone());

        assert_eq!(reconciler.refresh(Some(10)), QueueOutcome::Pending);
        assert_eq!(reconciler.interest(), &BTreeSet::from([0, 1]));

        // The current item moved meanwhile; index 4 is outside the old set.
        queue.cache(&[3, 4]);
        let outcome = reconciler.on_event(&QueueEvent::ItemsUpdatedAtIndexes(vec![4]), Some(14));
        assert_eq!(indexes(&outcome), vec![3, 4]);
    }

    #[test]
    fn test_empty_reload_is_ignored() {
        let queue = FakeQueue::new(&[]);
        let mut reconciler = QueueReconciler::new(queue.clone());

        assert_eq!(
            reconciler.on_event(&QueueEvent::ItemsReloaded, None),
            QueueOutcome::Ignored
        );
        assert!(queue.requested.lock().is_empty());
    }

    #[test]
    fn test_insert_and_remove_always_recompute() {
        let queue = FakeQueue::new(&[10, 11]);
        queue.cache(&[0, 1]);
        let mut reconciler = QueueReconciler::new(queue.clone());

        let inserted = reconciler.on_event(
            &QueueEvent::ItemsInsertedInRange { start: 2, count: 0 },
            Some(10),
        );
        assert_eq!(indexes(&inserted), vec![0, 1]);

        let removed = reconciler.on_event(&QueueEvent::ItemsRemovedAtIndexes(vec![5]), Some(11));
        assert_eq!(indexes(&removed), vec![0, 1]);
        assert_eq!(reconciler.settled_items().len(), 2);
    }
}
