//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame.
//! The renderer consumes `FrameTime` through `Renderer::advance`.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
