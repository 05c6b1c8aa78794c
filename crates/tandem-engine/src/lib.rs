//! Tandem engine crate.
//!
//! A small forward renderer with node-based compute: storage attributes
//! shared between compute and vertex stages, lazily compiled compute nodes,
//! and [`render::ExternalHooks`] for installing GPU objects built elsewhere.
//! Also owns the platform pieces (window runtime, input, frame clock).

pub mod controls;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
