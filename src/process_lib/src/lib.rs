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
/// How long a process stays resident once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// Never retired by the clock.
    Unbounded,
    /// Retired once the clock reaches `arrival + ticks`.
    Ticks(u64),
}

//==================================================================================================
// Structures
//==================================================================================================
/// CPU burst countdown carried by a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Burst {
    /// Total burst length in ticks
    pub total	: u64,
    /// Ticks still to run
    pub remaining	: u64,
    /// Ticks already run
    pub elapsed	: u64,
}

/// Represents a logical process competing for physical frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Process
{
    /// Process unique identifier (private field)
    ps_pid		: Pid,
    /// Process size in bytes (private field)
    ps_size		: usize,
    /// Clock value when the process was created (private field)
    ps_arrival		: u64,
    /// Residency limit (private field)
    ps_lifetime		: Lifetime,
    /// Optional CPU burst countdown (private field)
    ps_burst		: Option<Burst>,
    /// Frames owned by the process, in allocation order (private field)
    ps_frames		: Vec<usize>,
}

/// Ordered set of live processes. Iteration follows registration order.
#[derive(Clone, Debug, Default)]
pub struct ProcessRegistry {
    processes	: Vec<Process>,
    /// Largest pid registered since the last reset, used to generate new ones
    highest_pid	: Pid,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl Lifetime {
    /// Maps the UI convention of `-1` (or any negative) to [`Lifetime::Unbounded`].
    pub fn from_signed(value: i64) -> Self {
	if value < 0 {
	    Lifetime::Unbounded
	} else {
	    Lifetime::Ticks(value as u64)
	}
    }

    pub fn is_bounded(&self) -> bool {
	matches!(self, Lifetime::Ticks(_))
    }
}

impl Burst {
    pub fn new(total: u64) -> Self {
	Self {
	    total,
	    remaining: total,
	    elapsed: 0,
	}
    }

    pub fn is_complete(&self) -> bool {
	self.remaining == 0
    }
}

impl Process
{
    /// Creates a new, unallocated Process instance.
    ///
    /// # Arguments
    /// * `pid`      - The unique identifier of the Process;
    /// * `size`     - The Process size in bytes;
    /// * `arrival`  - The clock value at creation;
    /// * `lifetime` - How long the Process stays resident;
    ///
    /// # Returns
    /// * A new `Process` instance owning no frames
    pub fn new(pid: Pid, size: usize, arrival: u64, lifetime: Lifetime) -> Self
    {
	debug!(
	    "Creating Process ({}) size {} at time {} ({:?})",
	    pid,
	    size,
	    arrival,
	    lifetime,
	);

	Self {
	    ps_pid: pid,
	    ps_size: size,
	    ps_arrival: arrival,
	    ps_lifetime: lifetime,
	    ps_burst: None,
	    ps_frames: Vec::new(),
	}
    }

    /// Attaches a CPU burst of `total` ticks to the Process.
    pub fn with_burst(mut self, total: u64) -> Self {
	self.ps_burst = Some(Burst::new(total));
	self
    }

    /// Returns Process's `ps_pid`
    pub fn process_pid(&self) -> Pid
    {
	self.ps_pid
    }

    pub fn process_size(&self) -> usize
    {
	self.ps_size
    }

    pub fn process_arrival(&self) -> u64
    {
	self.ps_arrival
    }

    pub fn process_lifetime(&self) -> Lifetime
    {
	self.ps_lifetime
    }

    pub fn process_burst(&self) -> Option<Burst>
    {
	self.ps_burst
    }

    /// Frames owned by the Process, in the order they were allocated.
    pub fn process_frames(&self) -> &[usize]
    {
	&self.ps_frames
    }

    pub fn is_allocated(&self) -> bool
    {
	!self.ps_frames.is_empty()
    }

    /// Number of `page_size` frames needed to hold the Process.
    pub fn frames_needed(&self, page_size: usize) -> usize
    {
	self.ps_size.div_ceil(page_size)
    }

    /// Binds the Process to `frames`. Only the memory manager calls this.
    pub fn process_set_frames(&mut self, frames: Vec<usize>)
    {
	self.ps_frames = frames;
    }

    /// Unbinds the Process, returning the frames it owned.
    pub fn process_take_frames(&mut self) -> Vec<usize>
    {
	std::mem::take(&mut self.ps_frames)
    }

    /// Whether a bounded lifetime has elapsed by time `now`.
    ///
    /// # Returns
    ///
    /// * `true`  - if `arrival + lifetime <= now`
    /// * `false` - otherwise, and always for unbounded Processes
    pub fn is_expired(&self, now: u64) -> bool
    {
	match self.ps_lifetime {
	    Lifetime::Unbounded => false,
	    Lifetime::Ticks(ticks) => self.ps_arrival.saturating_add(ticks) <= now,
	}
    }

    /// Runs one tick of the Process's burst, if it has one left.
    pub fn process_tick_burst(&mut self)
    {
	if let Some(burst) = self.ps_burst.as_mut() {
	    if burst.remaining > 0 {
		burst.remaining -= 1;
		burst.elapsed += 1;
		debug!(
		    "Process {}: Burst remaining ({})",
		    self.ps_pid,
		    burst.remaining,
		);
	    }
	}
    }

    /// Whether the Process carried a burst and has run all of it.
    pub fn is_burst_complete(&self) -> bool
    {
	self.ps_burst.map(|burst| burst.is_complete()).unwrap_or(false)
    }
}

impl ProcessRegistry {
    pub fn new() -> Self {
	Self::default()
    }

    pub fn contains(&self, pid: Pid) -> bool {
	self.index_of(pid).is_some()
    }

    /// Pid a caller would get by omitting one: one past the largest seen.
    pub fn next_pid(&self) -> Pid {
	self.highest_pid.saturating_add(1)
    }

    /// Largest pid registered since the last reset.
    pub fn high_water_mark(&self) -> Pid {
	self.highest_pid
    }

    /// Adds `process` at the end of the registry.
    ///
    /// Returns the process back if its pid is already registered.
    pub fn register(&mut self, process: Process) -> Result<(), Process> {
	if self.contains(process.process_pid()) {
	    return Err(process);
	}
	self.highest_pid = self.highest_pid.max(process.process_pid());
	self.processes.push(process);
	Ok(())
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
	self.processes.iter().find(|p| p.process_pid() == pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
	self.processes.iter_mut().find(|p| p.process_pid() == pid)
    }

    /// Removes and returns the process, keeping the order of the rest.
    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
	let index = self.index_of(pid)?;
	Some(self.processes.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
	self.processes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
	self.processes.iter_mut()
    }

    pub fn pids(&self) -> Vec<Pid> {
	self.processes.iter().map(|p| p.process_pid()).collect()
    }

    /// Pids that should leave at time `now`: lifetime elapsed or burst done.
    pub fn retirable(&self, now: u64) -> Vec<Pid> {
	self.processes.iter()
	    .filter(|p| p.is_expired(now) || p.is_burst_complete())
	    .map(|p| p.process_pid())
	    .collect()
    }

    /// Undoes a registration: removes `pid` and puts the high-water mark back
    /// to `mark`, as taken by [`ProcessRegistry::high_water_mark`] beforehand.
    pub fn rollback(&mut self, pid: Pid, mark: Pid) -> Option<Process> {
	let process = self.remove(pid);
	self.highest_pid = mark;
	debug!("[REGISTRY] Rolled back process {}, high-water mark {}", pid, mark);
	process
    }

    /// Drops every process and forgets the pid high-water mark.
    pub fn reset(&mut self) {
	self.processes.clear();
	self.highest_pid = 0;
    }

    fn index_of(&self, pid: Pid) -> Option<usize> {
	self.processes.iter().position(|p| p.process_pid() == pid)
    }
}

//==================================================================================================
// Tests
//==================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_needed_rounds_up() {
	let process = Process::new(1, 10, 0, Lifetime::Unbounded);
	assert_eq!(process.frames_needed(4), 3);
	assert_eq!(Process::new(2, 8, 0, Lifetime::Unbounded).frames_needed(4), 2);
	assert_eq!(Process::new(3, 1, 0, Lifetime::Unbounded).frames_needed(4), 1);
    }

    #[test]
    fn expiry_is_arrival_plus_lifetime() {
	let process = Process::new(3, 4, 5, Lifetime::Ticks(2));
	assert!(!process.is_expired(6));
	assert!(process.is_expired(7));
	assert!(process.is_expired(8));
	assert!(!Process::new(4, 4, 0, Lifetime::Unbounded).is_expired(u64::MAX));
    }

    #[test]
    fn lifetime_from_signed() {
	assert_eq!(Lifetime::from_signed(-1), Lifetime::Unbounded);
	assert_eq!(Lifetime::from_signed(3), Lifetime::Ticks(3));
    }

    #[test]
    fn burst_counts_down_to_completion() {
	let mut process = Process::new(1, 4, 0, Lifetime::Unbounded).with_burst(2);
	assert!(!process.is_burst_complete());

	process.process_tick_burst();
	process.process_tick_burst();
	assert!(process.is_burst_complete());

	process.process_tick_burst();
	let burst = process.process_burst().unwrap();
	assert_eq!((burst.remaining, burst.elapsed), (0, 2));
    }

    #[test]
    fn process_without_burst_never_completes() {
	let mut process = Process::new(1, 4, 0, Lifetime::Unbounded);
	process.process_tick_burst();
	assert!(!process.is_burst_complete());
    }

    #[test]
    fn registry_keeps_order_and_rejects_duplicates() {
	let mut registry = ProcessRegistry::new();
	registry.register(Process::new(5, 4, 0, Lifetime::Unbounded)).unwrap();
	registry.register(Process::new(2, 4, 0, Lifetime::Unbounded)).unwrap();
	assert!(registry.register(Process::new(5, 8, 0, Lifetime::Unbounded)).is_err());

	assert_eq!(registry.pids(), vec![5, 2]);
	assert_eq!(registry.next_pid(), 6);

	assert!(registry.remove(5).is_some());
	assert_eq!(registry.pids(), vec![2]);
	assert_eq!(registry.next_pid(), 6);
	assert!(registry.remove(5).is_none());

	registry.reset();
	assert!(registry.pids().is_empty());
	assert_eq!(registry.next_pid(), 1);
    }

    #[test]
    fn rollback_restores_high_water_mark() {
	let mut registry = ProcessRegistry::new();
	registry.register(Process::new(3, 4, 0, Lifetime::Unbounded)).unwrap();

	let mark = registry.high_water_mark();
	registry.register(Process::new(10, 4, 0, Lifetime::Unbounded)).unwrap();
	assert_eq!(registry.next_pid(), 11);

	assert!(registry.rollback(10, mark).is_some());
	assert_eq!(registry.pids(), vec![3]);
	assert_eq!(registry.next_pid(), 4);
    }

    #[test]
    fn retirable_collects_expired_and_finished() {
	let mut registry = ProcessRegistry::new();
	registry.register(Process::new(1, 4, 0, Lifetime::Ticks(1))).unwrap();
	registry.register(Process::new(2, 4, 0, Lifetime::Unbounded)).unwrap();
	registry.register(Process::new(3, 4, 0, Lifetime::Unbounded).with_burst(1)).unwrap();

	assert!(registry.retirable(0).is_empty());
	registry.iter_mut().for_each(|p| p.process_tick_burst());
	assert_eq!(registry.retirable(1), vec![1, 3]);
    }

    #[test]
    fn take_frames_unbinds() {
	let mut process = Process::new(1, 8, 0, Lifetime::Unbounded);
	process.process_set_frames(vec![2, 0]);
	assert!(process.is_allocated());
	assert_eq!(process.process_take_frames(), vec![2, 0]);
	assert!(!process.is_allocated());
    }
}
