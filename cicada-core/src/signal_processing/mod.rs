//! Pulse-energy matched filtering (C3) and frame search/demodulation (C4, C5).
//!
//! These are pure functions over the immutable pulse bank built by
//! [`crate::waveform`]; they have no shared state and are trivially
//! parallelizable across independent recordings (§5).

pub mod frame_search;
pub mod pulse_energy;

pub use frame_search::{demodulate_at_start, find_frame_starts, DemodulatedFrame};
pub use pulse_energy::pulse_energy_map;
