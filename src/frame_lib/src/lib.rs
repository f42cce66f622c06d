//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use log::debug;
use std::fmt;

//==================================================================================================
// Aliases
//==================================================================================================
/// Process identifier. Valid identifiers are strictly positive.
pub type Pid = u32;

//==================================================================================================
// Structures
//==================================================================================================
/// State of a single physical frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Free,
    Owned(Pid),
}

/// Physical memory seen as a fixed sequence of page frames.
///
/// Each slot is either free or owned by exactly one process. The table never
/// grows or shrinks; a resize replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameTable {
    frames	: Vec<FrameState>,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl FrameState {
    pub fn is_free(&self) -> bool {
	matches!(self, FrameState::Free)
    }

    pub fn owner(&self) -> Option<Pid> {
	match self {
	    FrameState::Free => None,
	    FrameState::Owned(pid) => Some(*pid),
	}
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    FrameState::Free => write!(f, "Free"),
	    FrameState::Owned(pid) => write!(f, "Process {}", pid),
	}
    }
}

impl FrameTable {
    /// Creates a table of `num_frames` free frames.
    pub fn new(num_frames: usize) -> Self {
	debug!("[FRAMES] Creating frame table with {} frames", num_frames);

	Self {
	    frames: vec![FrameState::Free; num_frames],
	}
    }

    pub fn frame_count(&self) -> usize {
	self.frames.len()
    }

    pub fn free_count(&self) -> usize {
	self.frames.iter().filter(|state| state.is_free()).count()
    }

    pub fn used_count(&self) -> usize {
	self.frame_count() - self.free_count()
    }

    /// Picks the first `count` free frames in ascending order.
    ///
    /// Frames need not be contiguous. Returns `None` without touching the table
    /// if fewer than `count` frames are free.
    pub fn first_fit(&self, count: usize) -> Option<Vec<usize>> {
	let selected: Vec<usize> = self.frames.iter()
	    .enumerate()
	    .filter(|(_, state)| state.is_free())
	    .map(|(index, _)| index)
	    .take(count)
	    .collect();

	if selected.len() < count {
	    return None;
	}
	Some(selected)
    }

    /// Marks every frame in `indices` as owned by `pid`.
    ///
    /// # Panics
    ///
    /// Panics if any frame is out of range or already owned. Callers select
    /// frames with [`FrameTable::first_fit`] first.
    pub fn commit(&mut self, pid: Pid, indices: &[usize]) {
	for &index in indices {
	    let slot = &mut self.frames[index];
	    assert!(slot.is_free(), "frame {} is already owned by {:?}", index, slot.owner());
	    *slot = FrameState::Owned(pid);
	}
	debug!("[FRAMES] Process {} now owns frames {:?}", pid, indices);
    }

    /// Returns every frame in `indices` to the free pool.
    ///
    /// # Panics
    ///
    /// Panics if any frame is out of range or not owned.
    pub fn free(&mut self, indices: &[usize]) {
	for &index in indices {
	    let slot = &mut self.frames[index];
	    assert!(slot.owner().is_some(), "frame {} is not owned", index);
	    *slot = FrameState::Free;
	}
	debug!("[FRAMES] Freed frames {:?}", indices);
    }

    /// Ordered `(index, state)` view of the whole table.
    pub fn snapshot(&self) -> Vec<(usize, FrameState)> {
	self.frames.iter()
	    .copied()
	    .enumerate()
	    .collect()
    }
}

//==================================================================================================
// Tests
//==================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_is_all_free() {
	let table = FrameTable::new(4);
	assert_eq!(table.frame_count(), 4);
	assert_eq!(table.free_count(), 4);
	assert!(table.snapshot().iter().all(|(_, state)| state.is_free()));
    }

    #[test]
    fn first_fit_skips_owned_frames() {
	let mut table = FrameTable::new(5);
	table.commit(7, &[0, 2]);

	assert_eq!(table.first_fit(2), Some(vec![1, 3]));
	assert_eq!(table.first_fit(3), Some(vec![1, 3, 4]));
	assert_eq!(table.first_fit(4), None);
	assert_eq!(table.first_fit(0), Some(vec![]));
    }

    #[test]
    fn commit_and_free_track_ownership() {
	let mut table = FrameTable::new(4);
	table.commit(1, &[1, 3]);

	let snapshot = table.snapshot();
	assert_eq!(snapshot[1], (1, FrameState::Owned(1)));
	assert_eq!(snapshot[0], (0, FrameState::Free));
	assert_eq!(snapshot[3], (3, FrameState::Owned(1)));
	assert_eq!(table.used_count(), 2);

	table.free(&[1, 3]);
	assert_eq!(table.free_count(), 4);
	assert!(table.snapshot().iter().all(|(_, state)| state.is_free()));
    }

    #[test]
    #[should_panic]
    fn commit_refuses_double_ownership() {
	let mut table = FrameTable::new(2);
	table.commit(1, &[0]);
	table.commit(2, &[0]);
    }

    #[test]
    #[should_panic]
    fn free_refuses_unowned_frame() {
	let mut table = FrameTable::new(2);
	table.commit(1, &[0]);
	table.free(&[0, 1]);
    }

    #[test]
    #[should_panic]
    fn free_refuses_out_of_range_frame() {
	let mut table = FrameTable::new(2);
	table.free(&[5]);
    }

    #[test]
    fn frame_state_display() {
	assert_eq!(FrameState::Free.to_string(), "Free");
	assert_eq!(FrameState::Owned(3).to_string(), "Process 3");
	assert_eq!(FrameState::Owned(3).owner(), Some(3));
    }
}
