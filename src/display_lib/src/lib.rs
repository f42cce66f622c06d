//==================================================================================================
// Configuration
//==================================================================================================
#![deny(clippy::all)]

//==================================================================================================
// Imports
//==================================================================================================
use mem_lib::{
    FrameState,
    HistoryEvent,
    Lifetime,
    MemoryManager,
    MemoryUsage,
    Pid,
    Process,
};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use std::fmt;

//==================================================================================================
// Constants
//==================================================================================================
/// Channels are drawn from this range so process colours stay light.
const CHANNEL_MIN: u8 = 100;
const CHANNEL_MAX: u8 = 255;

//==================================================================================================
// Structures
//==================================================================================================
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r	: u8,
    pub g	: u8,
    pub b	: u8,
}

//==================================================================================================
// Implementations
//==================================================================================================
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Display colour of a process. The same pid always maps to the same colour.
pub fn color_for(pid: Pid) -> Rgb {
    let mut rng = StdRng::seed_from_u64(pid as u64);
    Rgb {
	r: rng.gen_range(CHANNEL_MIN..=CHANNEL_MAX),
	g: rng.gen_range(CHANNEL_MIN..=CHANNEL_MAX),
	b: rng.gen_range(CHANNEL_MIN..=CHANNEL_MAX),
    }
}

/// One line per frame: `Frame i: Process p` or `Frame i: Free`.
pub fn frame_lines(snapshot: &[(usize, FrameState)]) -> Vec<String> {
    snapshot.iter()
	.map(|(index, state)| format!("Frame {}: {}", index, state))
	.collect()
}

pub fn history_line(event: &HistoryEvent) -> String {
    let action = if event.is_allocation() {
	"ALLOCATED"
    } else {
	"RELEASED"
    };
    format!(
	"Time {}: Process {} {} - Frames: {:?}",
	event.timestamp,
	event.pid,
	action,
	event.frames,
    )
}

pub fn history_lines(history: &[HistoryEvent]) -> Vec<String> {
    history.iter().map(history_line).collect()
}

/// Table row for a process: pid, size, lifetime, remaining burst and colour.
pub fn process_row(process: &Process) -> String {
    let lifetime = match process.process_lifetime() {
	Lifetime::Unbounded => "unbounded".to_string(),
	Lifetime::Ticks(ticks) => ticks.to_string(),
    };
    let burst = match process.process_burst() {
	Some(burst) => format!("{}/{}", burst.remaining, burst.total),
	None => "-".to_string(),
    };
    format!(
	"P{:<4} size {:>6}  arrival {:>4}  lifetime {:>9}  burst {:>7}  frames {:?}  {}",
	process.process_pid(),
	process.process_size(),
	process.process_arrival(),
	lifetime,
	burst,
	process.process_frames(),
	color_for(process.process_pid()),
    )
}

pub fn usage_line(usage: &MemoryUsage) -> String {
    format!(
	"Used: {} frames ({} bytes), Free: {} frames ({} bytes), Total: {} frames",
	usage.used_frames,
	usage.used_bytes(),
	usage.free_frames,
	usage.free_bytes(),
	usage.total_frames,
    )
}

/// Summary block with size, page size, frame count and current time.
pub fn memory_info(manager: &MemoryManager) -> String {
    format!(
	"Total memory size: {} bytes\nPage size: {} bytes\nTotal frames: {}\nCurrent time: {}",
	manager.total_size(),
	manager.page_size(),
	manager.num_frames(),
	manager.clock(),
    )
}

//==================================================================================================
// Tests
//==================================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_stable_per_pid() {
	assert_eq!(color_for(7), color_for(7));
	for pid in 1..50 {
	    let color = color_for(pid);
	    assert!(color.r >= CHANNEL_MIN && color.g >= CHANNEL_MIN && color.b >= CHANNEL_MIN);
	}
    }

    #[test]
    fn color_varies_across_pids() {
	let colors: std::collections::HashSet<Rgb> = (1..20).map(color_for).collect();
	assert!(colors.len() > 1);
    }

    #[test]
    fn rgb_formats_as_hex() {
	assert_eq!(Rgb { r: 255, g: 100, b: 10 }.to_string(), "#ff640a");
    }

    #[test]
    fn views_follow_manager_state() {
	let mut manager = MemoryManager::new(12, 4).unwrap();
	manager.spawn(Some(2), 5, Lifetime::Ticks(4), Some(3)).unwrap();
	manager.advance(1);
	manager.release(2).unwrap();

	assert_eq!(
	    frame_lines(&manager.snapshot_frames()),
	    vec!["Frame 0: Free", "Frame 1: Free", "Frame 2: Free"],
	);
	assert_eq!(
	    history_lines(manager.history()),
	    vec![
		"Time 0: Process 2 ALLOCATED - Frames: [0, 1]",
		"Time 1: Process 2 RELEASED - Frames: [0, 1]",
	    ],
	);
	assert_eq!(
	    memory_info(&manager),
	    "Total memory size: 12 bytes\nPage size: 4 bytes\nTotal frames: 3\nCurrent time: 1",
	);

	let row = process_row(manager.process(2).unwrap());
	assert!(row.starts_with("P2"));
	assert!(row.contains("2/3"));
	assert!(row.ends_with(&color_for(2).to_string()));
    }

    #[test]
    fn usage_line_reports_bytes() {
	let mut manager = MemoryManager::new(16, 4).unwrap();
	manager.spawn(None, 4, Lifetime::Unbounded, None).unwrap();
	assert_eq!(
	    usage_line(&manager.usage()),
	    "Used: 1 frames (4 bytes), Free: 3 frames (12 bytes), Total: 4 frames",
	);
    }
}
