use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::messages::{WorkerMessage, WorkerStats};

/// A worker slot in the assignment ring.
#[derive(Debug)]
pub struct WorkerSlot {
    pub id: u64,
    pub tx: mpsc::UnboundedSender<WorkerMessage>,
    /// Number of tasks dispatched to this worker over its lifetime
    pub dispatched: u64,
}

/// Explicit round-robin assignment ring.
///
/// Assignment dequeues the head slot and re-enqueues it at the tail, so
/// every worker receives tasks in the same cyclic order regardless of how
/// completions interleave. Only the controller mutates the ring.
#[derive(Debug, Default)]
pub struct WorkerRing {
    slots: VecDeque<WorkerSlot>,
}

impl WorkerRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: u64, tx: mpsc::UnboundedSender<WorkerMessage>) {
        self.slots.push_back(WorkerSlot {
            id,
            tx,
            dispatched: 0,
        });
    }

    /// Advance the ring: move the head slot to the tail and return it.
    ///
    /// Returns `None` when the ring is empty (pool already terminated).
    pub fn rotate(&mut self) -> Option<&mut WorkerSlot> {
        let slot = self.slots.pop_front()?;
        self.slots.push_back(slot);
        self.slots.back_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Per-worker dispatch counters, ordered by worker id.
    pub fn stats(&self) -> Vec<WorkerStats> {
        let mut stats: Vec<WorkerStats> = self
            .slots
            .iter()
            .map(|s| WorkerStats {
                worker_id: s.id,
                dispatched: s.dispatched,
            })
            .collect();
        stats.sort_by_key(|s| s.worker_id);
        stats
    }

    /// Remove and return every slot, leaving the ring empty.
    pub fn drain(&mut self) -> Vec<WorkerSlot> {
        self.slots.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(n: u64) -> WorkerRing {
        let mut ring = WorkerRing::new();
        for id in 0..n {
            let (tx, _rx) = mpsc::unbounded_channel();
            ring.push(id, tx);
        }
        ring
    }

    #[test]
    fn rotate_is_cyclic() {
        let mut ring = ring_of(3);
        let order: Vec<u64> = (0..7).map(|_| ring.rotate().unwrap().id).collect();
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn rotate_empty_ring() {
        let mut ring = WorkerRing::new();
        assert!(ring.rotate().is_none());
    }

    #[test]
    fn dispatch_counters() {
        let mut ring = ring_of(2);
        for _ in 0..5 {
            ring.rotate().unwrap().dispatched += 1;
        }
        let stats = ring.stats();
        assert_eq!(stats[0].dispatched, 3);
        assert_eq!(stats[1].dispatched, 2);
    }

    #[test]
    fn drain_empties_ring() {
        let mut ring = ring_of(4);
        let slots = ring.drain();
        assert_eq!(slots.len(), 4);
        assert!(ring.is_empty());
        assert!(ring.rotate().is_none());
    }
}
