//! Time subsystem.
//!
//! - one `FrameClock` per window (or per render loop)
//! - call `tick()` once per frame to obtain `FrameTime`
//! - `FrameClock::fixed_step` replaces wall time for deterministic runs

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
