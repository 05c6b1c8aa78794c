//! Camera controls driven by [`crate::input`].

mod orbit;

pub use orbit::OrbitControls;
