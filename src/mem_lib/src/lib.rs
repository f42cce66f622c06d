//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use frame_lib::FrameTable;
use history_lib::{Clock, HistoryLog};
use log::debug;
use process_lib::ProcessRegistry;
use thiserror::Error;

pub use frame_lib::{FrameState, Pid};
pub use history_lib::{EventKind, HistoryEvent};
pub use process_lib::{Burst, Lifetime, Process};

//==================================================================================================
// Errors
//==================================================================================================
/// Failures reported by [`MemoryManager`]. None of them leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PagingError {
    /// More frames requested than are free
    #[error("insufficient memory: {required} frames required, {available} free")]
    InsufficientMemory { required: usize, available: usize },

    #[error("process {0} already owns frames")]
    AlreadyAllocated(Pid),

    /// Memory size is not positive
    #[error("invalid memory size: {0}")]
    InvalidSize(usize),

    #[error("memory size {size} is not a multiple of the page size ({page_size})")]
    NotPageAligned { size: usize, page_size: usize },

    #[error("invalid page size: {0}")]
    InvalidPageSize(usize),

    #[error("unknown process {0}")]
    UnknownProcess(Pid),

    #[error("process {0} already exists")]
    DuplicateProcess(Pid),

    #[error("process identifiers must be positive")]
    InvalidPid,

    #[error("process {pid} has invalid size {size}")]
    InvalidProcessSize { pid: Pid, size: usize },

    #[error("process {0} has a zero lifetime")]
    InvalidLifetime(Pid),

    #[error("process {0} has a zero burst")]
    InvalidBurst(Pid),
}

pub type Result<T> = std::result::Result<T, PagingError>;

//==================================================================================================
// Structures
//==================================================================================================
/// Frame occupancy summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total_frames	: usize,
    pub used_frames	: usize,
    pub free_frames	: usize,
    pub page_size	: usize,
}

/// Owns the whole simulated memory: frame table, processes, history and clock.
///
/// Every operation runs to completion synchronously. Callers embedding the
/// manager in a concurrent host must route all calls through a single owner.
#[derive(Clone, Debug)]
pub struct MemoryManager {
    total_size	: usize,
    page_size	: usize,
    frames	: FrameTable,
    registry	: ProcessRegistry,
    history	: HistoryLog,
    clock	: Clock,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl MemoryUsage {
    pub fn used_bytes(&self) -> usize {
	self.used_frames * self.page_size
    }

    pub fn free_bytes(&self) -> usize {
	self.free_frames * self.page_size
    }
}

impl MemoryManager {
    /// Creates a memory of `total_size` bytes split into `page_size`-byte frames.
    ///
    /// # Returns
    ///
    /// * `Err(InvalidPageSize)` - if `page_size` is zero
    /// * `Err(InvalidSize)`     - if `total_size` is zero
    /// * `Err(NotPageAligned)`  - if `total_size` is not a multiple of `page_size`
    pub fn new(total_size: usize, page_size: usize) -> Result<Self> {
	if page_size == 0 {
	    return Err(PagingError::InvalidPageSize(page_size));
	}
	Self::validate_size(total_size, page_size)?;

	debug!(
	    "[MEM] Creating memory of {} bytes with {} byte pages",
	    total_size,
	    page_size,
	);

	Ok(Self {
	    total_size,
	    page_size,
	    frames: FrameTable::new(total_size / page_size),
	    registry: ProcessRegistry::new(),
	    history: HistoryLog::new(),
	    clock: Clock::new(),
	})
    }

    fn validate_size(size: usize, page_size: usize) -> Result<()> {
	if size == 0 {
	    return Err(PagingError::InvalidSize(size));
	}
	if size % page_size != 0 {
	    return Err(PagingError::NotPageAligned { size, page_size });
	}
	Ok(())
    }

    pub fn total_size(&self) -> usize {
	self.total_size
    }

    pub fn page_size(&self) -> usize {
	self.page_size
    }

    pub fn num_frames(&self) -> usize {
	self.frames.frame_count()
    }

    /// Current simulation time.
    pub fn clock(&self) -> u64 {
	self.clock.now()
    }

    pub fn history(&self) -> &[HistoryEvent] {
	self.history.events()
    }

    pub fn snapshot_frames(&self) -> Vec<(usize, FrameState)> {
	self.frames.snapshot()
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
	self.registry.get(pid)
    }

    /// Registered processes, in registration order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
	self.registry.iter()
    }

    pub fn usage(&self) -> MemoryUsage {
	MemoryUsage {
	    total_frames: self.frames.frame_count(),
	    used_frames: self.frames.used_count(),
	    free_frames: self.frames.free_count(),
	    page_size: self.page_size,
	}
    }

    //==============================================================================================
    // Registry
    //==============================================================================================

    /// Registers an unallocated process arriving at the current time.
    ///
    /// A missing `pid` is generated as one past the largest pid registered
    /// since the last reinitialization.
    pub fn create_process(&mut self, pid: Option<Pid>, size: usize, lifetime: Lifetime) -> Result<Pid> {
	self.register(pid, size, lifetime, None)
    }

    /// Same as [`MemoryManager::create_process`], with a CPU burst of `burst` ticks.
    pub fn create_process_with_burst(
	&mut self,
	pid: Option<Pid>,
	size: usize,
	lifetime: Lifetime,
	burst: u64,
    ) -> Result<Pid> {
	self.register(pid, size, lifetime, Some(burst))
    }

    fn register(&mut self, pid: Option<Pid>, size: usize, lifetime: Lifetime, burst: Option<u64>) -> Result<Pid> {
	let pid = pid.unwrap_or_else(|| self.registry.next_pid());

	/* Sanity checks. */
	if pid == 0 {
	    return Err(PagingError::InvalidPid);
	}
	if size == 0 {
	    return Err(PagingError::InvalidProcessSize { pid, size });
	}
	if lifetime == Lifetime::Ticks(0) {
	    return Err(PagingError::InvalidLifetime(pid));
	}
	if burst == Some(0) {
	    return Err(PagingError::InvalidBurst(pid));
	}

	let mut process = Process::new(pid, size, self.clock.now(), lifetime);
	if let Some(burst) = burst {
	    process = process.with_burst(burst);
	}
	self.registry
	    .register(process)
	    .map_err(|process| PagingError::DuplicateProcess(process.process_pid()))?;

	Ok(pid)
    }

    /// Creates a process and allocates it in one step.
    ///
    /// If allocation fails the process is not kept, so the registry is left
    /// exactly as it was.
    pub fn spawn(
	&mut self,
	pid: Option<Pid>,
	size: usize,
	lifetime: Lifetime,
	burst: Option<u64>,
    ) -> Result<(Pid, usize)> {
	let mark = self.registry.high_water_mark();
	let pid = self.register(pid, size, lifetime, burst)?;
	match self.allocate(pid) {
	    Ok(count) => Ok((pid, count)),
	    Err(e) => {
		self.registry.rollback(pid, mark);
		Err(e)
	    }
	}
    }

    /// Releases a process's frames and drops it from the registry.
    pub fn remove_process(&mut self, pid: Pid) -> Result<usize> {
	let released = self.release(pid)?;
	self.registry.remove(pid);
	debug!("[MEM] Process {} removed, {} frames released", pid, released);
	Ok(released)
    }

    /// Releases and removes every process. Clock, history and size are kept.
    ///
    /// # Returns
    ///
    /// * The number of processes removed.
    pub fn clear(&mut self) -> usize {
	let pids = self.registry.pids();
	for &pid in &pids {
	    self.retire(pid);
	}
	pids.len()
    }

    //==============================================================================================
    // Allocator
    //==============================================================================================

    /// Binds the first free frames (ascending order) to `pid`.
    ///
    /// Either every required frame is bound and one allocation event is
    /// recorded, or nothing changes.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)`                 - number of frames assigned
    /// * `Err(UnknownProcess)`       - if `pid` is not registered
    /// * `Err(AlreadyAllocated)`     - if the process already owns frames
    /// * `Err(InsufficientMemory)`   - if too few frames are free
    pub fn allocate(&mut self, pid: Pid) -> Result<usize> {
	let process = self.process(pid).ok_or(PagingError::UnknownProcess(pid))?;
	if process.is_allocated() {
	    return Err(PagingError::AlreadyAllocated(pid));
	}

	let required = process.frames_needed(self.page_size);
	let selected = self.frames.first_fit(required).ok_or(PagingError::InsufficientMemory {
	    required,
	    available: self.frames.free_count(),
	})?;

	self.frames.commit(pid, &selected);
	self.history.record(self.clock.now(), pid, EventKind::Allocation, selected.clone());
	if let Some(process) = self.registry.get_mut(pid) {
	    process.process_set_frames(selected);
	}

	debug!("[MEM] Process {} allocated {} frames", pid, required);
	Ok(required)
    }

    /// Returns every frame owned by `pid` to the free pool.
    ///
    /// The process stays registered. Releasing a process that owns nothing is
    /// a no-op returning 0 and records no event.
    pub fn release(&mut self, pid: Pid) -> Result<usize> {
	let process = self.registry.get_mut(pid).ok_or(PagingError::UnknownProcess(pid))?;
	if !process.is_allocated() {
	    return Ok(0);
	}

	let released = process.process_take_frames();
	self.frames.free(&released);
	let count = released.len();
	self.history.record(self.clock.now(), pid, EventKind::Release, released);

	Ok(count)
    }

    //==============================================================================================
    // Lifecycle
    //==============================================================================================

    /// Advances the clock `steps` times, retiring processes at each step.
    ///
    /// A process is retired when its bounded lifetime has elapsed or its burst
    /// has run out. Retirement releases its frames and removes it, in registry
    /// order. Non-positive `steps` does nothing.
    ///
    /// # Returns
    ///
    /// * The retired pids, in retirement order.
    pub fn advance(&mut self, steps: i64) -> Vec<Pid> {
	let mut retired = Vec::new();
	for _ in 0..steps.max(0) {
	    retired.extend(self.tick());
	}
	retired
    }

    fn tick(&mut self) -> Vec<Pid> {
	let now = self.clock.tick();
	self.registry.iter_mut().for_each(|process| process.process_tick_burst());

	let retirable = self.registry.retirable(now);
	for &pid in &retirable {
	    self.retire(pid);
	    debug!("Time {}: Process {} finished and released.", now, pid);
	}
	retirable
    }

    fn retire(&mut self, pid: Pid) {
	if self.release(pid).is_ok() {
	    self.registry.remove(pid);
	}
    }

    /// Reinitializes memory with a new total size.
    ///
    /// Every process is released and removed, the frame table is rebuilt,
    /// history is cleared and the clock goes back to 0. Rejected sizes leave
    /// everything untouched.
    pub fn resize(&mut self, new_total_size: usize) -> Result<()> {
	Self::validate_size(new_total_size, self.page_size)?;

	self.clear();
	self.total_size = new_total_size;
	self.frames = FrameTable::new(new_total_size / self.page_size);
	self.registry.reset();
	self.history.reset();
	self.clock.reset();

	debug!(
	    "[MEM] Resized to {} bytes ({} frames)",
	    new_total_size,
	    self.frames.frame_count(),
	);
	Ok(())
    }
}
