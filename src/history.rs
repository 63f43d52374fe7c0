use std::collections::HashMap;

use crate::adapter::Acknowledgment;

const NIL: usize = usize::MAX;

/// Bounded history of sent packets keyed by transport-wide sequence number.
///
/// A fixed capacity LRU. `add` of a known key replaces the value and marks
/// it most recently updated; a new key evicts the least recently updated
/// entry once the capacity is reached. `get` does not touch the recency
/// order.
///
/// Entries live in an arena of slots and the recency order is kept with
/// index links (plus an embedded free list), so get/add/evict are all O(1)
/// and no allocation happens once the arena has filled up.
#[derive(Debug)]
pub(crate) struct FeedbackHistory {
    cap: usize,
    index: HashMap<u16, usize>,
    slots: Vec<Slot>,
    /// Most recently updated slot.
    head: usize,
    /// Least recently updated slot, the eviction candidate.
    tail: usize,
    /// Head of the free list, chained through `next`.
    free: usize,
}

#[derive(Debug)]
struct Slot {
    ack: Acknowledgment,
    prev: usize,
    next: usize,
}

impl FeedbackHistory {
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "history capacity must be non-zero");

        FeedbackHistory {
            cap,
            index: HashMap::with_capacity(cap),
            slots: Vec::with_capacity(cap),
            head: NIL,
            tail: NIL,
            free: NIL,
        }
    }

    /// Look up the record for a sequence number, if it is still in the window.
    pub fn get(&self, seq: u16) -> Option<&Acknowledgment> {
        self.index.get(&seq).map(|&i| &self.slots[i].ack)
    }

    /// Insert or replace the record for `ack.seq`, marking it most recently
    /// updated. Evicts the least recently updated entry when full.
    pub fn add(&mut self, ack: Acknowledgment) {
        if let Some(&i) = self.index.get(&ack.seq) {
            self.slots[i].ack = ack;
            self.promote(i);
            return;
        }

        if self.index.len() == self.cap {
            self.evict_oldest();
        }

        let i = self.alloc(ack);
        self.link_front(i);
        self.index.insert(ack.seq, i);
    }

    fn alloc(&mut self, ack: Acknowledgment) -> usize {
        if self.free != NIL {
            let i = self.free;
            self.free = self.slots[i].next;
            self.slots[i].ack = ack;
            i
        } else {
            self.slots.push(Slot {
                ack,
                prev: NIL,
                next: NIL,
            });
            self.slots.len() - 1
        }
    }

    fn link_front(&mut self, i: usize) {
        self.slots[i].prev = NIL;
        self.slots[i].next = self.head;

        if self.head != NIL {
            self.slots[self.head].prev = i;
        }
        self.head = i;

        if self.tail == NIL {
            self.tail = i;
        }
    }

    fn unlink(&mut self, i: usize) {
        let (prev, next) = (self.slots[i].prev, self.slots[i].next);

        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn promote(&mut self, i: usize) {
        if self.head == i {
            return;
        }
        self.unlink(i);
        self.link_front(i);
    }

    fn evict_oldest(&mut self) {
        let i = self.tail;
        if i == NIL {
            return;
        }

        self.unlink(i);
        let seq = self.slots[i].ack.seq;
        self.index.remove(&seq);

        self.slots[i].next = self.free;
        self.free = i;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ack(seq: u16) -> Acknowledgment {
        Acknowledgment {
            seq,
            size: 1200,
            ..Default::default()
        }
    }

    #[test]
    fn get_after_add() {
        let mut history = FeedbackHistory::new(10);

        history.add(ack(5));

        assert_eq!(history.get(5), Some(&ack(5)));
        assert_eq!(history.get(6), None);
    }

    #[test]
    fn evicts_least_recently_updated() {
        let mut history = FeedbackHistory::new(2);

        history.add(ack(5));
        history.add(ack(6));
        history.add(ack(7));

        assert_eq!(history.index.len(), 2);
        assert_eq!(history.get(5), None);
        assert!(history.get(6).is_some());
        assert!(history.get(7).is_some());
    }

    #[test]
    fn re_add_refreshes_recency() {
        let mut history = FeedbackHistory::new(2);

        history.add(ack(5));
        history.add(ack(6));
        // 5 becomes most recently updated, making 6 the eviction candidate.
        history.add(ack(5));
        history.add(ack(7));

        assert!(history.get(5).is_some());
        assert_eq!(history.get(6), None);
        assert!(history.get(7).is_some());
    }

    #[test]
    fn re_add_replaces_value() {
        let mut history = FeedbackHistory::new(10);

        history.add(ack(5));
        let replaced = Acknowledgment {
            seq: 5,
            size: 300,
            ..Default::default()
        };
        history.add(replaced);

        assert_eq!(history.index.len(), 1);
        assert_eq!(history.get(5), Some(&replaced));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut history = FeedbackHistory::new(4);

        for seq in 0..100 {
            history.add(ack(seq));
            assert!(history.index.len() <= 4);
        }

        // Only the last four remain, in any order.
        for seq in 0..96 {
            assert_eq!(history.get(seq), None);
        }
        for seq in 96..100 {
            assert!(history.get(seq).is_some());
        }
    }

    #[test]
    fn get_does_not_affect_recency() {
        let mut history = FeedbackHistory::new(2);

        history.add(ack(5));
        history.add(ack(6));
        // A read of 5 must not save it from eviction.
        let _ = history.get(5);
        history.add(ack(7));

        assert_eq!(history.get(5), None);
        assert!(history.get(6).is_some());
    }

    #[test]
    fn slots_are_reused_after_eviction() {
        let mut history = FeedbackHistory::new(3);

        for seq in 0..50 {
            history.add(ack(seq));
        }

        // The arena never grows beyond the capacity.
        assert_eq!(history.slots.len(), 3);
    }
}
