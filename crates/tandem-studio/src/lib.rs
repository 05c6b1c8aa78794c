//! The cube demo: a brick cube whose vertex buffer is shared between the
//! renderer and a typed compute program.

pub mod config;
pub mod programs;

mod demo;

pub use config::DemoConfig;
pub use demo::CubeDemo;
