//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Modules
//==================================================================================================
mod args;
mod driver;

//==================================================================================================
// Imports
//==================================================================================================
use anyhow::{Context, Result};
use args::Args;
use display_lib::{frame_lines, history_lines, memory_info, process_row, usage_line};
use driver::{ticker_loop, ManagerHandle};
use log::{debug, info};
use mem_lib::{Lifetime, MemoryManager};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use tokio::{
    runtime::Builder,
    time::Duration,
};

//==================================================================================================
// Constants
//==================================================================================================
const REQUEST_QUEUE: usize = 100;

//==================================================================================================
// Functions
//==================================================================================================
fn main() -> Result<()> {
    env_logger::init();

    let args: Args = Args::parse(std::env::args().collect())?;
    let manager = MemoryManager::new(args.memory(), args.page_size())
	.context("failed to create memory")?;

    let runtime = Builder::new_current_thread()
	.enable_all()
	.build()
	.context("failed to build runtime")?;

    let manager = runtime.block_on(run(manager, &args))?;

    for process in manager.processes() {
	println!("{}", process_row(process));
    }
    println!("{}", memory_info(&manager));
    Ok(())
}

async fn run(manager: MemoryManager, args: &Args) -> Result<MemoryManager> {
    let mut rng = StdRng::seed_from_u64(args.seed());
    let (handle, join) = ManagerHandle::start(manager, REQUEST_QUEUE);

    for _ in 0..args.number_of_processes() {
	let size = rng.gen_range(1..=args.page_size().saturating_mul(4));
	let lifetime = match args.lifetime() {
	    Some(ticks) => Lifetime::from_signed(ticks),
	    None if rng.gen_bool(0.25) => Lifetime::Unbounded,
	    None => Lifetime::Ticks(rng.gen_range(2..=(args.ticks() as u64).max(2))),
	};
	let burst = rng.gen_bool(0.5).then(|| rng.gen_range(3..=10));

	match handle.spawn(None, size, lifetime, burst).await? {
	    Ok((pid, frames)) => info!("Process {} created with {} frames", pid, frames),
	    Err(e) => println!("Process of {} bytes rejected: {}", size, e),
	}
    }

    debug!("Starting timer: {} ticks every {} ms", args.ticks(), args.tick_ms());
    ticker_loop(handle.clone(), Duration::from_millis(args.tick_ms()), args.ticks()).await;

    for line in history_lines(&handle.history().await?) {
	println!("{}", line);
    }
    for line in frame_lines(&handle.snapshot().await?) {
	println!("{}", line);
    }
    println!("{}", usage_line(&handle.usage().await?));

    if let Some(pid) = args.remove() {
	match handle.remove(pid).await? {
	    Ok(frames) => println!("Process {} removed. Frames released: {}", pid, frames),
	    Err(e) => println!("Remove rejected: {}", e),
	}
    }
    if args.clear() {
	let removed = handle.clear().await?;
	println!("Memory cleared. Processes removed: {}", removed);
    }
    if let Some(size) = args.resize() {
	match handle.resize(size).await? {
	    Ok(()) => println!("Memory resized to {} bytes.", size),
	    Err(e) => println!("Resize rejected: {}", e),
	}
    }

    drop(handle);
    join.await.context("memory manager task failed")
}
