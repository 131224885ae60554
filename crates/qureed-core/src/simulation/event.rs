//! Event queue for the discrete-event loop
//!
//! Events are ordered by `(time, sequence)`. Two events addressed to the same
//! device at the same instant are merged into one dispatch.

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use crate::context::EventArg;
use crate::device::DeviceId;
use crate::signal::SignalMap;
use crate::utils::SimTime;

/// One pending dispatch
#[derive(Debug, Clone)]
pub struct SimulationEvent {
    pub time: SimTime,
    pub device: DeviceId,
    pub args: Vec<EventArg>,
    pub signals: SignalMap,
}

impl SimulationEvent {
    pub fn new(time: SimTime, device: DeviceId, signals: SignalMap, args: Vec<EventArg>) -> Self {
        Self {
            time,
            device,
            args,
            signals,
        }
    }

    /// Fold another event for the same `(time, device)` into this one.
    /// Signals on the same port label are replaced by the later ones.
    pub fn merge(&mut self, other: SimulationEvent) {
        self.signals.extend(other.signals);
        self.args.extend(other.args);
    }
}

/// Min-queue of events with merge-by-key
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<(SimTime, u64, DeviceId)>>,
    pending: HashMap<(SimTime, DeviceId), SimulationEvent>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event, returning `true` if it was merged into a pending one
    pub fn schedule(&mut self, event: SimulationEvent) -> bool {
        match self.pending.entry((event.time, event.device)) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().merge(event);
                true
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.heap.push(Reverse((event.time, seq, event.device)));
                slot.insert(event);
                false
            }
        }
    }

    /// Time of the earliest pending event
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse((time, _, _))| *time)
    }

    /// Remove the earliest event. Its merge key is released before dispatch,
    /// so work scheduled by the handler at the same instant forms a new event.
    pub fn pop(&mut self) -> Option<SimulationEvent> {
        while let Some(Reverse((time, _, device))) = self.heap.pop() {
            if let Some(event) = self.pending.remove(&(time, device)) {
                return Some(event);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use qureed_types::SignalKind;

    fn signals(label: &str) -> SignalMap {
        let mut map = SignalMap::new();
        map.insert(label.to_string(), Signal::new(SignalKind::Bool));
        map
    }

    #[test]
    fn test_same_time_and_device_merge() {
        let mut queue = EventQueue::new();
        let device = DeviceId::new();
        let t = SimTime::new(1.0);
        assert!(!queue.schedule(SimulationEvent::new(t, device, signals("A"), vec![])));
        assert!(queue.schedule(SimulationEvent::new(t, device, signals("B"), vec![EventArg::Wake])));
        assert_eq!(queue.len(), 1);

        let event = queue.pop().unwrap();
        assert_eq!(event.signals.len(), 2);
        assert_eq!(event.args, vec![EventArg::Wake]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_order_time_then_insertion() {
        let mut queue = EventQueue::new();
        let (a, b, c) = (DeviceId::new(), DeviceId::new(), DeviceId::new());
        queue.schedule(SimulationEvent::new(SimTime::new(2.0), a, SignalMap::new(), vec![]));
        queue.schedule(SimulationEvent::new(SimTime::new(1.0), b, SignalMap::new(), vec![]));
        queue.schedule(SimulationEvent::new(SimTime::new(1.0), c, SignalMap::new(), vec![]));

        assert_eq!(queue.peek_time(), Some(SimTime::new(1.0)));
        assert_eq!(queue.pop().unwrap().device, b);
        assert_eq!(queue.pop().unwrap().device, c);
        assert_eq!(queue.pop().unwrap().device, a);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_rescheduling_after_pop_creates_new_event() {
        let mut queue = EventQueue::new();
        let device = DeviceId::new();
        let t = SimTime::new(0.5);
        queue.schedule(SimulationEvent::new(t, device, SignalMap::new(), vec![]));
        queue.pop().unwrap();
        assert!(!queue.schedule(SimulationEvent::new(t, device, SignalMap::new(), vec![])));
        assert_eq!(queue.len(), 1);
    }
}
