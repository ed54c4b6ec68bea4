use std::cell::RefCell;
use std::rc::Rc;

/// A deferred action a map can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Draw,
    Resize,
}

/// One coalescing slot. A pending slot is never re-armed: the first
/// request in a burst fixes `due_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    #[default]
    Idle,
    Pending { due_at: u64, seq: u64 },
}

#[derive(Debug, Default)]
struct Clock {
    now: u64,
    seq: u64,
    draw: Slot,
    resize: Slot,
}

impl Clock {
    fn slot_mut(&mut self, task: Task) -> &mut Slot {
        match task {
            Task::Draw => &mut self.draw,
            Task::Resize => &mut self.resize,
        }
    }

    fn slot(&self, task: Task) -> Slot {
        match task {
            Task::Draw => self.draw,
            Task::Resize => self.resize,
        }
    }
}

/// Leading-edge coalescing timers on a cooperative millisecond clock.
///
/// Cloning yields another handle to the same clock, which is how the
/// viewport's draw hook reaches its map's scheduler. Nothing runs on its
/// own: the owner advances time and executes whatever comes due.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<Clock>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    /// Schedule `task` to run `delay_ms` from now unless it is already
    /// pending. Returns `true` if this call armed the slot.
    pub fn request(&self, task: Task, delay_ms: u64) -> bool {
        let mut clock = self.inner.borrow_mut();
        let due_at = clock.now.saturating_add(delay_ms);
        let seq = clock.seq;
        let slot = clock.slot_mut(task);
        match *slot {
            Slot::Pending { due_at, .. } => {
                log::trace!("{task:?} already pending (due at {due_at} ms), coalesced");
                false
            }
            Slot::Idle => {
                *slot = Slot::Pending { due_at, seq };
                clock.seq += 1;
                log::debug!("{task:?} scheduled for {due_at} ms");
                true
            }
        }
    }

    pub fn is_pending(&self, task: Task) -> bool {
        matches!(self.inner.borrow().slot(task), Slot::Pending { .. })
    }

    pub fn slot(&self, task: Task) -> Slot {
        self.inner.borrow().slot(task)
    }

    /// Earliest time any pending task is due.
    pub fn next_deadline(&self) -> Option<u64> {
        self.next_due(u64::MAX).map(|(_, due_at)| due_at)
    }

    /// The pending task that comes due first at or before `deadline`.
    /// Tasks due at the same instant run in request order.
    pub fn next_due(&self, deadline: u64) -> Option<(Task, u64)> {
        let clock = self.inner.borrow();
        [Task::Draw, Task::Resize]
            .into_iter()
            .filter_map(|task| match clock.slot(task) {
                Slot::Pending { due_at, seq } if due_at <= deadline => Some((task, due_at, seq)),
                _ => None,
            })
            .min_by_key(|&(_, due_at, seq)| (due_at, seq))
            .map(|(task, due_at, _)| (task, due_at))
    }

    /// Move the clock forward. The clock never runs backwards.
    pub(crate) fn advance_to(&self, at: u64) {
        let mut clock = self.inner.borrow_mut();
        clock.now = clock.now.max(at);
    }

    /// Return `task`'s slot to idle once its action has finished.
    pub(crate) fn complete(&self, task: Task) {
        *self.inner.borrow_mut().slot_mut(task) = Slot::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_fixes_due_time() {
        let scheduler = Scheduler::new();
        assert!(scheduler.request(Task::Draw, 10));
        scheduler.advance_to(7);
        assert!(!scheduler.request(Task::Draw, 10));
        assert_eq!(scheduler.slot(Task::Draw), Slot::Pending { due_at: 10, seq: 0 });
    }

    #[test]
    fn test_complete_rearms_slot() {
        let scheduler = Scheduler::new();
        scheduler.request(Task::Draw, 10);
        scheduler.advance_to(10);
        scheduler.complete(Task::Draw);
        assert!(!scheduler.is_pending(Task::Draw));
        assert!(scheduler.request(Task::Draw, 10));
        assert_eq!(scheduler.next_deadline(), Some(20));
    }

    #[test]
    fn test_next_due_respects_deadline_and_order() {
        let scheduler = Scheduler::new();
        scheduler.request(Task::Resize, 5);
        scheduler.request(Task::Draw, 5);
        assert_eq!(scheduler.next_due(4), None);
        assert_eq!(scheduler.next_due(5), Some((Task::Resize, 5)));
        scheduler.complete(Task::Resize);
        assert_eq!(scheduler.next_due(5), Some((Task::Draw, 5)));
    }

    #[test]
    fn test_handles_share_one_clock() {
        let scheduler = Scheduler::new();
        let handle = scheduler.clone();
        handle.request(Task::Draw, 3);
        assert!(scheduler.is_pending(Task::Draw));
        scheduler.advance_to(2);
        assert_eq!(handle.now(), 2);
        scheduler.advance_to(1);
        assert_eq!(handle.now(), 2);
    }
}
