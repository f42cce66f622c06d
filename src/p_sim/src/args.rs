//==================================================================================================
// Imports
//==================================================================================================
use ::anyhow::{Context, Result};

//==================================================================================================
// Structures
//==================================================================================================
#[derive(Debug)]
pub struct Args {
    /// Total memory size in bytes
    memory: usize,
    /// Size of a page frame in bytes
    page_size: usize,
    /// Number of random processes to spawn before the clock starts
    num_processes: usize,
    /// Number of ticks the timer requests
    ticks: usize,
    /// Milliseconds between two ticks
    tick_ms: u64,
    /// Seed for the workload generator
    seed: u64,
    /// Lifetime given to every generated process; negative means unbounded
    lifetime: Option<i64>,
    /// Whether to clear every process after the run
    clear: bool,
    /// Optional process to remove after the run
    remove: Option<u32>,
    /// Optional memory size to reinitialize with after the run
    resize: Option<usize>,
}

//==================================================================================================
// Implementation
//==================================================================================================
impl Args {
    const OPT_HELP: &'static str = "--help";
    const OPT_MEMORY: &'static str = "--memory";
    const OPT_PAGE_SIZE: &'static str = "--page_size";
    const OPT_NUM_PROCESSES: &'static str = "--num_processes";
    const OPT_TICKS: &'static str = "--ticks";
    const OPT_TICK_MS: &'static str = "--tick_ms";
    const OPT_SEED: &'static str = "--seed";
    const OPT_LIFETIME: &'static str = "--lifetime";
    const OPT_CLEAR: &'static str = "--clear";
    const OPT_REMOVE: &'static str = "--remove";
    const OPT_RESIZE: &'static str = "--resize";

    pub fn parse(args: Vec<String>) -> Result<Self> {
	let mut memory: usize = 64;
	let mut page_size: usize = 4;
	let mut num_processes: usize = 8;
	let mut ticks: usize = 10;
	let mut tick_ms: u64 = 100;
	let mut seed: u64 = 1;
	let mut lifetime: Option<i64> = None;
	let mut clear: bool = false;
	let mut remove: Option<u32> = None;
	let mut resize: Option<usize> = None;

	let program_name = args.first().map(String::as_str).unwrap_or("p_sim");
	let mut i: usize = 1;
	while i < args.len() {
	    let option = args[i].as_str();
	    if option == Self::OPT_HELP {
		Self::usage(program_name);
		return Err(anyhow::anyhow!("wrong usage"));
	    }
	    if option == Self::OPT_CLEAR {
		clear = true;
		i += 1;
		continue;
	    }

	    i += 1;
	    let value = args.get(i)
		.with_context(|| format!("missing value for {}", option))?;
	    match option {
		Self::OPT_MEMORY => {
		    memory = Self::parse_value(option, value)?;
		},
		Self::OPT_PAGE_SIZE => {
		    page_size = Self::parse_value(option, value)?;
		},
		Self::OPT_NUM_PROCESSES => {
		    num_processes = Self::parse_value(option, value)?;
		},
		Self::OPT_TICKS => {
		    ticks = Self::parse_value(option, value)?;
		},
		Self::OPT_TICK_MS => {
		    tick_ms = Self::parse_value(option, value)?;
		},
		Self::OPT_SEED => {
		    seed = Self::parse_value(option, value)?;
		},
		Self::OPT_LIFETIME => {
		    lifetime = Some(Self::parse_value(option, value)?);
		},
		Self::OPT_REMOVE => {
		    remove = Some(Self::parse_value(option, value)?);
		},
		Self::OPT_RESIZE => {
		    resize = Some(Self::parse_value(option, value)?);
		},
		&_ => {
		    return Err(anyhow::anyhow!("invalid argument {}", option));
		}
	    }

	    i += 1;
	}

	Ok(Self {
	    memory,
	    page_size,
	    num_processes,
	    ticks,
	    tick_ms,
	    seed,
	    lifetime,
	    clear,
	    remove,
	    resize,
	})
    }

    fn parse_value<T>(option: &str, value: &str) -> Result<T>
    where
	T: std::str::FromStr,
	T::Err: std::error::Error + Send + Sync + 'static,
    {
	value.parse::<T>()
	    .with_context(|| format!("invalid value '{}' for {}", value, option))
    }

    pub fn usage(program_name: &str) {
	println!(
	    "Usage: {} [{} <bytes> {} <bytes> {} <n> {} <n> {} <ms> {} <seed> {} <ticks|-1> {} <pid> {} {} <bytes>]",
	    program_name,
	    Self::OPT_MEMORY,
	    Self::OPT_PAGE_SIZE,
	    Self::OPT_NUM_PROCESSES,
	    Self::OPT_TICKS,
	    Self::OPT_TICK_MS,
	    Self::OPT_SEED,
	    Self::OPT_LIFETIME,
	    Self::OPT_REMOVE,
	    Self::OPT_CLEAR,
	    Self::OPT_RESIZE,
	);
    }

    pub fn memory(&self) -> usize {
	self.memory
    }

    pub fn page_size(&self) -> usize {
	self.page_size
    }

    pub fn number_of_processes(&self) -> usize {
	self.num_processes
    }

    pub fn ticks(&self) -> usize {
	self.ticks
    }

    pub fn tick_ms(&self) -> u64 {
	self.tick_ms
    }

    pub fn seed(&self) -> u64 {
	self.seed
    }

    pub fn lifetime(&self) -> Option<i64> {
	self.lifetime
    }

    pub fn clear(&self) -> bool {
	self.clear
    }

    pub fn remove(&self) -> Option<u32> {
	self.remove
    }

    pub fn resize(&self) -> Option<usize> {
	self.resize
    }
}
