//! Capsule hover expansion with a debounced collapse
//!
//! Each capsule runs a small state machine:
//!
//! ```text
//! Collapsed --enter--> Expanded --leave--> CollapsePending(timer)
//!     ^                    ^                     |      |
//!     |                    +-------enter---------+      |
//!     +---------------------------timeout---------------+
//! ```
//!
//! Entering a capsule, its tooltip or one of its markers all count as the
//! same hover, so moving between them never flickers the layout.

use std::collections::BTreeMap;

use tracing::trace;

use super::{expanded_positions, TimelineConfig, TimelineLayout, TripCapsule};

pub type CapsuleId = usize;

/// Token for one scheduled collapse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Deferred-callback capability. Cancelling a fired or already cancelled
/// handle must be a no-op.
pub trait Timers {
    fn schedule(&mut self, delay_ms: f64, capsule: CapsuleId) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// Deterministic timers driven by an explicit clock
#[derive(Debug, Default)]
pub struct VirtualTimers {
    now_ms: f64,
    next_id: u64,
    pending: BTreeMap<TimerHandle, (f64, CapsuleId)>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Move the clock forward and return expired timers in due order
    pub fn advance(&mut self, ms: f64) -> Vec<(TimerHandle, CapsuleId)> {
        self.now_ms += ms;
        let now = self.now_ms;

        let mut due: Vec<(f64, TimerHandle, CapsuleId)> = self
            .pending
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .map(|(&handle, &(at, capsule))| (at, handle, capsule))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, handle, _) in &due {
            self.pending.remove(handle);
        }
        due.into_iter().map(|(_, handle, capsule)| (handle, capsule)).collect()
    }
}

impl Timers for VirtualTimers {
    fn schedule(&mut self, delay_ms: f64, capsule: CapsuleId) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert(handle, (self.now_ms + delay_ms.max(0.0), capsule));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.remove(&handle);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Collapsed,
    Expanded,
    CollapsePending(TimerHandle),
}

/// What the view must do after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum HoverEffect {
    Unchanged,
    /// New child offsets, in capsule child order
    Reposition(Vec<f64>),
}

/// Hover state of one capsule plus the marker offsets it toggles between
#[derive(Clone, Debug)]
pub struct CapsuleHover {
    id: CapsuleId,
    state: HoverState,
    current: Vec<f64>,
    expanded: Option<Vec<f64>>,
    /// Offsets captured on expansion, restored on collapse
    cached: Option<Vec<f64>>,
}

impl CapsuleHover {
    pub fn new(id: CapsuleId, capsule: &TripCapsule, spacing_px: f64) -> Self {
        Self {
            id,
            state: HoverState::Collapsed,
            current: capsule.children.iter().map(|c| c.left_px).collect(),
            expanded: expanded_positions(&capsule.children, capsule.width_px, spacing_px),
            cached: None,
        }
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    /// Child offsets currently on screen
    pub fn positions(&self) -> &[f64] {
        &self.current
    }

    pub fn pointer_enter(&mut self, timers: &mut impl Timers) -> HoverEffect {
        match self.state {
            HoverState::Expanded => HoverEffect::Unchanged,
            HoverState::CollapsePending(handle) => {
                timers.cancel(handle);
                self.state = HoverState::Expanded;
                trace!(capsule = self.id, timer = handle.raw(), "Collapse cancelled");
                HoverEffect::Unchanged
            }
            HoverState::Collapsed => {
                self.state = HoverState::Expanded;
                match &self.expanded {
                    Some(expanded) => {
                        self.cached = Some(std::mem::replace(&mut self.current, expanded.clone()));
                        trace!(capsule = self.id, "Capsule expanded");
                        HoverEffect::Reposition(self.current.clone())
                    }
                    None => HoverEffect::Unchanged,
                }
            }
        }
    }

    pub fn pointer_leave(&mut self, timers: &mut impl Timers, grace_ms: f64) -> HoverEffect {
        match self.state {
            HoverState::Collapsed => {}
            HoverState::Expanded => {
                self.state = HoverState::CollapsePending(timers.schedule(grace_ms, self.id));
            }
            HoverState::CollapsePending(previous) => {
                // one pending collapse per capsule
                timers.cancel(previous);
                self.state = HoverState::CollapsePending(timers.schedule(grace_ms, self.id));
            }
        }
        HoverEffect::Unchanged
    }

    /// Apply a fired timer. Handles that are no longer pending are ignored.
    pub fn timer_fired(&mut self, handle: TimerHandle) -> HoverEffect {
        match self.state {
            HoverState::CollapsePending(pending) if pending == handle => {
                self.state = HoverState::Collapsed;
                trace!(capsule = self.id, "Capsule collapsed");
                match self.cached.take() {
                    Some(original) => {
                        self.current = original;
                        HoverEffect::Reposition(self.current.clone())
                    }
                    None => HoverEffect::Unchanged,
                }
            }
            _ => HoverEffect::Unchanged,
        }
    }
}

/// Hover state for every capsule of a layout
#[derive(Clone, Debug)]
pub struct HoverBoard {
    capsules: Vec<CapsuleHover>,
    grace_ms: f64,
}

impl HoverBoard {
    pub fn new(layout: &TimelineLayout, config: &TimelineConfig) -> Self {
        Self {
            capsules: layout
                .capsules
                .iter()
                .enumerate()
                .map(|(id, capsule)| CapsuleHover::new(id, capsule, config.expanded_spacing_px))
                .collect(),
            grace_ms: config.collapse_grace_ms,
        }
    }

    pub fn capsule(&self, id: CapsuleId) -> Option<&CapsuleHover> {
        self.capsules.get(id)
    }

    pub fn enter(&mut self, id: CapsuleId, timers: &mut impl Timers) -> HoverEffect {
        match self.capsules.get_mut(id) {
            Some(capsule) => capsule.pointer_enter(timers),
            None => HoverEffect::Unchanged,
        }
    }

    pub fn leave(&mut self, id: CapsuleId, timers: &mut impl Timers) -> HoverEffect {
        let grace_ms = self.grace_ms;
        match self.capsules.get_mut(id) {
            Some(capsule) => capsule.pointer_leave(timers, grace_ms),
            None => HoverEffect::Unchanged,
        }
    }

    pub fn fire(&mut self, id: CapsuleId, handle: TimerHandle) -> HoverEffect {
        match self.capsules.get_mut(id) {
            Some(capsule) => capsule.timer_fired(handle),
            None => HoverEffect::Unchanged,
        }
    }
}
