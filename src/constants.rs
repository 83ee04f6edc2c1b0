// Turn orchestration
pub const MIN_INTERVAL_MS: u64 = 2000; // minimum spacing between advisory moves
pub const ADVISOR_TIMEOUT_MS: u64 = 10_000;

// Plan cache
pub const MIN_CACHE_DEPTH: u8 = 1;
pub const MAX_CACHE_DEPTH: u8 = 10;
pub const DEFAULT_CACHE_DEPTH: u8 = 5;

// Boundary representation
pub const EMPTY_SQUARE: char = '.';

// Fingerprints
pub const ZOBRIST_SEED: u64 = 0x5eed_c0de_2024_0001;

// Event broker
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

// Headless driver
pub const INPUT_POLL_MS: u64 = 50;
pub const PROFILES_DIR: &str = "profiles";
