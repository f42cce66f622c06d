//==================================================================================================
// Imports
//==================================================================================================
use ::anyhow::{anyhow, Result};
use log::debug;
use mem_lib::{
    FrameState,
    HistoryEvent,
    Lifetime,
    MemoryManager,
    MemoryUsage,
    PagingError,
    Pid,
};
use tokio::{
    sync::{
	mpsc,
	oneshot,
    },
    time::{
	interval,
	Duration,
    },
};

//==================================================================================================
// Aliases
//==================================================================================================
type Responder<T> = oneshot::Sender<T>;

//==================================================================================================
// Enum
//==================================================================================================
/// Work for the task that owns the [`MemoryManager`].
#[derive(Debug)]
pub enum Request {
    Spawn {
	pid: Option<Pid>,
	size: usize,
	lifetime: Lifetime,
	burst: Option<u64>,
	responder: Responder<Result<(Pid, usize), PagingError>>,
    },
    Remove {
	pid: Pid,
	responder: Responder<Result<usize, PagingError>>,
    },
    Resize {
	size: usize,
	responder: Responder<Result<(), PagingError>>,
    },
    Clear {
	responder: Responder<usize>,
    },
    /// Sent by the timer; nobody waits for an answer.
    Tick,
    Snapshot {
	responder: Responder<Vec<(usize, FrameState)>>,
    },
    History {
	responder: Responder<Vec<HistoryEvent>>,
    },
    Usage {
	responder: Responder<MemoryUsage>,
    },
}

//==================================================================================================
// Structures
//==================================================================================================
/// Cloneable front door to the manager task.
#[derive(Clone, Debug)]
pub struct ManagerHandle {
    sender	: mpsc::Sender<Request>,
}

//==================================================================================================
// Implementations
//==================================================================================================
/// Serves requests until every sender is gone, then hands the manager back.
///
/// This is the only place memory state is mutated.
pub async fn manager_loop(
    mut manager: MemoryManager,
    mut receiver: mpsc::Receiver<Request>,
) -> MemoryManager {
    while let Some(request) = receiver.recv().await {
	match request {
	    Request::Spawn { pid, size, lifetime, burst, responder } => {
		let _ = responder.send(manager.spawn(pid, size, lifetime, burst));
	    },
	    Request::Remove { pid, responder } => {
		let _ = responder.send(manager.remove_process(pid));
	    },
	    Request::Resize { size, responder } => {
		let _ = responder.send(manager.resize(size));
	    },
	    Request::Clear { responder } => {
		let _ = responder.send(manager.clear());
	    },
	    Request::Tick => {
		let retired = manager.advance(1);
		if !retired.is_empty() {
		    debug!("[DRIVER] Time {}: retired {:?}", manager.clock(), retired);
		}
	    },
	    Request::Snapshot { responder } => {
		let _ = responder.send(manager.snapshot_frames());
	    },
	    Request::History { responder } => {
		let _ = responder.send(manager.history().to_vec());
	    },
	    Request::Usage { responder } => {
		let _ = responder.send(manager.usage());
	    },
	}
    }

    debug!("[DRIVER] Channel closed at time {}.", manager.clock());
    manager
}

/// Requests `ticks` ticks, one every `period`. Never touches memory state.
pub async fn ticker_loop(handle: ManagerHandle, period: Duration, ticks: usize) {
    let mut timer = interval(period);
    // The first interval tick completes immediately.
    timer.tick().await;

    for _ in 0..ticks {
	timer.tick().await;
	if handle.tick().await.is_err() {
	    debug!("[DRIVER] Manager gone, ticker stopping.");
	    break;
	}
    }
}

impl ManagerHandle {
    /// Spawns the manager task and returns a handle plus the task's join handle.
    pub fn start(
	manager: MemoryManager,
	capacity: usize,
    ) -> (Self, tokio::task::JoinHandle<MemoryManager>) {
	let (sender, receiver) = mpsc::channel(capacity);
	let join = tokio::spawn(manager_loop(manager, receiver));
	(Self { sender }, join)
    }

    async fn request<T>(&self, build: impl FnOnce(Responder<T>) -> Request) -> Result<T> {
	let (responder, response) = oneshot::channel();
	self.sender.send(build(responder)).await
	    .map_err(|_| anyhow!("memory manager is not running"))?;
	response.await
	    .map_err(|_| anyhow!("memory manager dropped the request"))
    }

    pub async fn spawn(
	&self,
	pid: Option<Pid>,
	size: usize,
	lifetime: Lifetime,
	burst: Option<u64>,
    ) -> Result<Result<(Pid, usize), PagingError>> {
	self.request(|responder| Request::Spawn { pid, size, lifetime, burst, responder }).await
    }

    pub async fn remove(&self, pid: Pid) -> Result<Result<usize, PagingError>> {
	self.request(|responder| Request::Remove { pid, responder }).await
    }

    pub async fn resize(&self, size: usize) -> Result<Result<(), PagingError>> {
	self.request(|responder| Request::Resize { size, responder }).await
    }

    /// Removes every process, keeping clock and history.
    pub async fn clear(&self) -> Result<usize> {
	self.request(|responder| Request::Clear { responder }).await
    }

    pub async fn tick(&self) -> Result<()> {
	self.sender.send(Request::Tick).await
	    .map_err(|_| anyhow!("memory manager is not running"))
    }

    pub async fn snapshot(&self) -> Result<Vec<(usize, FrameState)>> {
	self.request(|responder| Request::Snapshot { responder }).await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEvent>> {
	self.request(|responder| Request::History { responder }).await
    }

    pub async fn usage(&self) -> Result<MemoryUsage> {
	self.request(|responder| Request::Usage { responder }).await
    }
}

//==================================================================================================
// Tests
//==================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_serializes_requests() {
	let manager = MemoryManager::new(16, 4).unwrap();
	let (handle, join) = ManagerHandle::start(manager, 8);

	assert_eq!(handle.spawn(Some(1), 10, Lifetime::Unbounded, None).await.unwrap(), Ok((1, 3)));
	assert_eq!(
	    handle.spawn(Some(2), 8, Lifetime::Unbounded, None).await.unwrap(),
	    Err(PagingError::InsufficientMemory { required: 2, available: 1 }),
	);
	assert_eq!(handle.remove(1).await.unwrap(), Ok(3));
	assert_eq!(handle.remove(1).await.unwrap(), Err(PagingError::UnknownProcess(1)));
	assert_eq!(handle.usage().await.unwrap().free_frames, 4);

	drop(handle);
	let manager = join.await.unwrap();
	assert_eq!(manager.history().len(), 2);
    }

    #[tokio::test]
    async fn ticks_retire_expired_processes() {
	let manager = MemoryManager::new(16, 4).unwrap();
	let (handle, join) = ManagerHandle::start(manager, 8);

	handle.spawn(Some(3), 4, Lifetime::Ticks(2), None).await.unwrap().unwrap();
	handle.tick().await.unwrap();
	assert!(handle.snapshot().await.unwrap()[0].1 == FrameState::Owned(3));

	handle.tick().await.unwrap();
	let history = handle.history().await.unwrap();
	assert_eq!(history.len(), 2);
	assert!(history[1].is_release());
	assert_eq!(history[1].timestamp, 2);

	drop(handle);
	assert_eq!(join.await.unwrap().clock(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_only_requests_ticks() {
	let manager = MemoryManager::new(16, 4).unwrap();
	let (handle, join) = ManagerHandle::start(manager, 8);
	handle.spawn(Some(1), 4, Lifetime::Ticks(3), None).await.unwrap().unwrap();

	ticker_loop(handle.clone(), Duration::from_millis(100), 5).await;

	drop(handle);
	let manager = join.await.unwrap();
	assert_eq!(manager.clock(), 5);
	assert!(manager.process(1).is_none());
	assert_eq!(manager.history().last().unwrap().timestamp, 3);
    }

    #[tokio::test]
    async fn resize_through_handle() {
	let manager = MemoryManager::new(16, 4).unwrap();
	let (handle, join) = ManagerHandle::start(manager, 8);
	handle.spawn(None, 8, Lifetime::Unbounded, None).await.unwrap().unwrap();

	assert_eq!(
	    handle.resize(10).await.unwrap(),
	    Err(PagingError::NotPageAligned { size: 10, page_size: 4 }),
	);
	assert_eq!(handle.resize(12).await.unwrap(), Ok(()));
	assert_eq!(handle.snapshot().await.unwrap().len(), 3);
	assert!(handle.history().await.unwrap().is_empty());

	drop(handle);
	join.await.unwrap();
    }

    #[tokio::test]
    async fn clear_through_handle() {
	let manager = MemoryManager::new(16, 4).unwrap();
	let (handle, join) = ManagerHandle::start(manager, 8);
	handle.spawn(Some(1), 4, Lifetime::Unbounded, None).await.unwrap().unwrap();
	handle.spawn(Some(2), 8, Lifetime::Unbounded, None).await.unwrap().unwrap();
	handle.tick().await.unwrap();

	assert_eq!(handle.clear().await.unwrap(), 2);
	assert_eq!(handle.usage().await.unwrap().free_frames, 4);
	assert_eq!(handle.history().await.unwrap().len(), 4);

	drop(handle);
	let manager = join.await.unwrap();
	assert_eq!(manager.clock(), 1);
	assert_eq!(manager.processes().count(), 0);
    }

    #[tokio::test]
    async fn requests_fail_once_manager_is_gone() {
	let (sender, receiver) = mpsc::channel(1);
	drop(receiver);
	let handle = ManagerHandle { sender };
	assert!(handle.tick().await.is_err());
	assert!(handle.usage().await.is_err());
    }
}
