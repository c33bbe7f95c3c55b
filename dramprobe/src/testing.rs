//! Test doubles for the hardware seams.
//!
//! Deterministic stand-ins for [`TimestampSource`] and [`CacheController`],
//! to check the engine's protocol without depending on real timings.

// Imports
use {
	crate::{
		cache::{cache_lines, CacheController},
		timestamp::{Timestamp, TimestampSource},
	},
	std::{cell::RefCell, collections::HashSet, rc::Rc},
};

/// Protocol event
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Event {
	/// A region was invalidated
	Invalidate { addr: usize, len: usize },

	/// A timed interval was started
	Start,

	/// A timed interval was ended
	End,
}

/// Shared, ordered, log of events
#[derive(Clone, Default, Debug)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
	/// Creates an empty log
	pub fn new() -> Self {
		Self::default()
	}

	/// Records an event
	pub fn push(&self, event: Event) {
		self.0.borrow_mut().push(event);
	}

	/// Returns all events so far
	pub fn events(&self) -> Vec<Event> {
		self.0.borrow().clone()
	}
}

/// Timestamp source advancing by a fixed step on every reading
#[derive(Debug)]
pub struct CountingTimestamp {
	/// Current reading
	now: u64,

	/// Step, in cycles
	step: u64,

	/// Whether the counter runs backwards
	backwards: bool,

	/// Log
	log: Option<EventLog>,
}

impl CountingTimestamp {
	/// Creates a counter where every interval lasts `step` cycles
	pub fn new(step: u64) -> Self {
		Self {
			now: 0,
			step,
			backwards: false,
			log: None,
		}
	}

	/// Creates a counter logging to `log`
	pub fn with_log(step: u64, log: EventLog) -> Self {
		Self {
			log: Some(log),
			..Self::new(step)
		}
	}

	/// Creates a counter that runs backwards, violating the protocol
	pub fn backwards() -> Self {
		Self {
			now: u64::MAX / 2,
			backwards: true,
			..Self::new(1)
		}
	}

	/// Advances the counter and returns it
	fn advance(&mut self, event: Event) -> Timestamp {
		if let Some(log) = &self.log {
			log.push(event);
		}

		self.now = match self.backwards {
			true => self.now - self.step,
			false => self.now + self.step,
		};
		Timestamp(self.now)
	}
}

impl TimestampSource for CountingTimestamp {
	fn start(&mut self) -> Timestamp {
		self.advance(Event::Start)
	}

	fn end(&mut self) -> Timestamp {
		self.advance(Event::End)
	}
}

/// Cache model tracking which lines are resident
#[derive(Default, Debug)]
pub struct TrackingCache {
	/// Resident lines
	resident: HashSet<usize>,

	/// Accesses to resident lines
	hits: usize,

	/// Accesses to non-resident lines
	misses: usize,

	/// Lines invalidated
	invalidated_lines: usize,

	/// Log
	log: Option<EventLog>,
}

impl TrackingCache {
	/// Creates an empty cache
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty cache logging to `log`
	pub fn with_log(log: EventLog) -> Self {
		Self {
			log: Some(log),
			..Self::default()
		}
	}

	/// Reads `region`, counting a hit or miss for each line and making them resident
	pub fn read(&mut self, region: &[u8]) {
		for line in cache_lines(region.as_ptr() as usize, region.len()) {
			match self.resident.insert(line) {
				true => self.misses += 1,
				false => self.hits += 1,
			}
		}
	}

	/// Returns the number of hits
	pub fn hits(&self) -> usize {
		self.hits
	}

	/// Returns the number of misses
	pub fn misses(&self) -> usize {
		self.misses
	}

	/// Returns the number of lines invalidated
	pub fn invalidated_lines(&self) -> usize {
		self.invalidated_lines
	}

	/// Resets all counters, keeping the resident lines
	pub fn reset_counters(&mut self) {
		self.hits = 0;
		self.misses = 0;
		self.invalidated_lines = 0;
	}
}

impl CacheController for TrackingCache {
	fn invalidate(&mut self, region: &[u8]) {
		if let Some(log) = &self.log {
			log.push(Event::Invalidate {
				addr: region.as_ptr() as usize,
				len:  region.len(),
			});
		}

		for line in cache_lines(region.as_ptr() as usize, region.len()) {
			self.resident.remove(&line);
			self.invalidated_lines += 1;
		}
	}

	fn touch(&mut self, region: &[u8]) {
		self.read(region);
	}
}
