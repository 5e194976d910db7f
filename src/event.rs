//! Cycle-exact two-phase event scheduler.
//!
//! Every chip is driven by callback events.  Time runs on an internal
//! clock at twice the machine clock: even ticks are PHI1 (address setup,
//! used by VIC and CIA), odd ticks are PHI2 (data transfer, used by the
//! CPU).  Scheduling a PHI1 event while in PHI2 moves it to the next
//! PHI1, and vice versa.
//!
//! Pending events live in a time-ordered queue; events due at the same
//! tick fire in the order they were scheduled.  The scheduler uses
//! interior mutability so that any chip holding an `Rc<EventScheduler>`
//! can schedule or cancel work from inside a running event.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender};

// ── Clock types ────────────────────────────────────────────────

/// Tick counter (signed so deltas can be negative).
pub type EventClock = i64;

/// Two-phase clock.  PHI1 is the first half-cycle, PHI2 the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Phi1 = 0,
    Phi2 = 1,
}

impl Phase {
    fn bit(self) -> EventClock {
        self as EventClock
    }
}

// ── Event ──────────────────────────────────────────────────────

/// A unit of scheduled work.
///
/// Events are shared as `Rc<dyn Event>`; the allocation is the event's
/// identity, so scheduling the same `Rc` twice moves it rather than
/// queueing a duplicate.  `fire` receives the owning `Rc` so an event
/// can reschedule itself.
pub trait Event {
    /// Diagnostic name.
    fn name(&self) -> &str;

    /// Run the event.  It has already been removed from the queue.
    fn fire(self: Rc<Self>, scheduler: &EventScheduler);
}

/// Closure-backed event for one-off work (e.g. a delayed NMI).
pub struct FnEvent {
    name: String,
    action: RefCell<Box<dyn FnMut(&EventScheduler)>>,
}

impl FnEvent {
    pub fn new<F>(name: impl Into<String>, action: F) -> Rc<Self>
    where
        F: FnMut(&EventScheduler) + 'static,
    {
        Rc::new(Self {
            name: name.into(),
            action: RefCell::new(Box::new(action)),
        })
    }
}

impl Event for FnEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn fire(self: Rc<Self>, scheduler: &EventScheduler) {
        let mut action = self.action.borrow_mut();
        (&mut **action)(scheduler);
    }
}

fn same_event(a: &Rc<dyn Event>, b: &Rc<dyn Event>) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

// ── Thread-safe injection ──────────────────────────────────────

/// Work handed to the emulation thread from another OS thread.
pub type ThreadSafeAction = Box<dyn FnOnce(&EventScheduler) + Send>;

/// Cycles between two drains of the thread-safe queue.
const THREAD_SAFE_PERIOD: EventClock = 50_000;

/// Periodic PHI1 event that runs queued cross-thread actions.
struct ThreadSafeInjector {
    rx: Receiver<ThreadSafeAction>,
}

impl Event for ThreadSafeInjector {
    fn name(&self) -> &str {
        "Inject events in thread-safe manner"
    }

    fn fire(self: Rc<Self>, scheduler: &EventScheduler) {
        for action in self.rx.try_iter() {
            action(scheduler);
        }
        scheduler.schedule_same_phase(self, THREAD_SAFE_PERIOD);
    }
}

// ── Scheduler ──────────────────────────────────────────────────

struct Pending {
    trigger_time: EventClock,
    event: Rc<dyn Event>,
}

pub struct EventScheduler {
    /// Current tick on the doubled clock (even = PHI1, odd = PHI2).
    current_time: Cell<EventClock>,
    /// Pending events, sorted by trigger time, FIFO among equals.
    queue: RefCell<VecDeque<Pending>>,
    cycles_per_second: Cell<f64>,
    injector: RefCell<Option<(Sender<ThreadSafeAction>, Rc<ThreadSafeInjector>)>>,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(0),
            queue: RefCell::new(VecDeque::new()),
            cycles_per_second: Cell::new(0.0),
            injector: RefCell::new(None),
        }
    }

    // ── Time queries ───────────────────────────────────────────

    /// Current cycle as seen from the given phase.  Asking for PHI1
    /// while in PHI2 returns the cycle of the next PHI1.
    pub fn get_time(&self, phase: Phase) -> EventClock {
        (self.current_time.get() + (1 - phase.bit())) >> 1
    }

    /// Phase of the tick currently executing.
    pub fn phase(&self) -> Phase {
        if self.current_time.get() & 1 == 0 {
            Phase::Phi1
        } else {
            Phase::Phi2
        }
    }

    pub fn cycles_per_second(&self) -> f64 {
        self.cycles_per_second.get()
    }

    pub fn set_cycles_per_second(&self, cycles_per_second: f64) {
        self.cycles_per_second.set(cycles_per_second);
    }

    // ── Scheduling ─────────────────────────────────────────────

    /// Schedule `event` `cycles` cycles from now on the next available
    /// `phase` boundary.  With `cycles == 0` and the scheduler already
    /// in `phase`, the event runs at the current tick after everything
    /// already due.
    pub fn schedule(&self, event: Rc<dyn Event>, cycles: EventClock, phase: Phase) {
        assert!(
            cycles >= 0,
            "event '{}' scheduled with negative delay {cycles}",
            event.name()
        );
        let now = self.current_time.get();
        let trigger_time = (cycles << 1) + now + ((now & 1) ^ phase.bit());
        self.insert(event, trigger_time);
    }

    /// Schedule `event` `cycles` cycles from now in the current phase.
    pub fn schedule_same_phase(&self, event: Rc<dyn Event>, cycles: EventClock) {
        assert!(
            cycles >= 0,
            "event '{}' scheduled with negative delay {cycles}",
            event.name()
        );
        let trigger_time = (cycles << 1) + self.current_time.get();
        self.insert(event, trigger_time);
    }

    /// Schedule `event` at an absolute cycle.
    pub fn schedule_absolute(&self, event: Rc<dyn Event>, cycle: EventClock, phase: Phase) {
        let trigger_time = (cycle << 1) + phase.bit();
        assert!(
            trigger_time >= self.current_time.get(),
            "event '{}' scheduled at cycle {cycle} which has already passed",
            event.name()
        );
        self.insert(event, trigger_time);
    }

    fn insert(&self, event: Rc<dyn Event>, trigger_time: EventClock) {
        let mut queue = self.queue.borrow_mut();
        if let Some(pos) = queue.iter().position(|p| same_event(&p.event, &event)) {
            queue.remove(pos);
        }
        let pos = queue.partition_point(|p| p.trigger_time <= trigger_time);
        queue.insert(pos, Pending { trigger_time, event });
    }

    /// Remove `event` from the queue.  Returns `true` if it was pending.
    pub fn cancel(&self, event: &Rc<dyn Event>) -> bool {
        let mut queue = self.queue.borrow_mut();
        match queue.iter().position(|p| same_event(&p.event, event)) {
            Some(pos) => {
                queue.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Is the event still pending?
    pub fn is_pending(&self, event: &Rc<dyn Event>) -> bool {
        self.queue
            .borrow()
            .iter()
            .any(|p| same_event(&p.event, event))
    }

    /// Number of pending events.
    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }

    // ── Advance ────────────────────────────────────────────────

    /// Fire the next event and advance the clock to its time.
    pub fn clock(&self) {
        let next = self.queue.borrow_mut().pop_front();
        let Some(Pending { trigger_time, event }) = next else {
            panic!("event scheduler ran out of events to execute");
        };
        self.current_time.set(trigger_time);
        event.fire(self);
    }

    /// Fire every event due before PHI1 of `cycle`, then move the clock
    /// to that boundary.
    pub fn run_until(&self, cycle: EventClock) {
        let limit = cycle << 1;
        loop {
            let due = self
                .queue
                .borrow()
                .front()
                .is_some_and(|p| p.trigger_time < limit);
            if !due {
                break;
            }
            self.clock();
        }
        if self.current_time.get() < limit {
            self.current_time.set(limit);
        }
    }

    /// Drop every pending event and rewind the clock.
    pub fn reset(&self) {
        self.queue.borrow_mut().clear();
        self.current_time.set(0);
        let injector = self.injector.borrow().as_ref().map(|(_, ev)| Rc::clone(ev));
        if let Some(injector) = injector {
            self.schedule(injector, 0, Phase::Phi1);
        }
    }

    // ── Cross-thread hand-off ─────────────────────────────────

    /// Sender for scheduling work from another thread.  Queued actions
    /// run on the emulation thread during a PHI1 tick, at most
    /// 50 000 cycles after being sent.
    pub fn thread_safe_sender(&self) -> Sender<ThreadSafeAction> {
        if let Some((tx, _)) = self.injector.borrow().as_ref() {
            return tx.clone();
        }
        let (tx, rx) = crossbeam_channel::unbounded();
        let injector = Rc::new(ThreadSafeInjector { rx });
        self.schedule(injector.clone(), 0, Phase::Phi1);
        *self.injector.borrow_mut() = Some((tx.clone(), injector));
        tx
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("EventScheduler")
            .field("time", &self.current_time.get())
            .field(
                "pending",
                &queue
                    .iter()
                    .map(|p| (p.event.name().to_string(), p.trigger_time))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
