//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use log::debug;

pub use frame_lib::Pid;

//==================================================================================================
// Enum
//==================================================================================================
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Allocation,
    Release,
}

//==================================================================================================
// Structures
//==================================================================================================
/// Discrete simulation time. Only moves forward, except on a full reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    now	: u64,
}

/// One entry of the allocation ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEvent {
    /// Clock value when the event happened
    pub timestamp	: u64,
    pub pid		: Pid,
    pub kind		: EventKind,
    /// Frames affected, in the order the process owned them
    pub frames		: Vec<usize>,
}

/// Append-only ledger of allocation and release events, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct HistoryLog {
    events	: Vec<HistoryEvent>,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl Clock {
    pub fn new() -> Self {
	Self::default()
    }

    pub fn now(&self) -> u64 {
	self.now
    }

    /// Advances time by one step and returns the new value.
    pub fn tick(&mut self) -> u64 {
	self.now += 1;
	self.now
    }

    pub fn reset(&mut self) {
	debug!("[CLOCK] Reset at time {}", self.now);
	self.now = 0;
    }
}

impl HistoryEvent {
    pub fn is_allocation(&self) -> bool {
	self.kind == EventKind::Allocation
    }

    pub fn is_release(&self) -> bool {
	self.kind == EventKind::Release
    }
}

impl HistoryLog {
    pub fn new() -> Self {
	Self::default()
    }

    pub fn record(&mut self, timestamp: u64, pid: Pid, kind: EventKind, frames: Vec<usize>) {
	debug!(
	    "[HISTORY] Time {}: Process {} {:?} {:?}",
	    timestamp,
	    pid,
	    kind,
	    frames,
	);
	self.events.push(HistoryEvent { timestamp, pid, kind, frames });
    }

    pub fn events(&self) -> &[HistoryEvent] {
	&self.events
    }

    /// Discards the whole ledger. Only a memory reinitialization does this.
    pub fn reset(&mut self) {
	self.events.clear();
    }
}
