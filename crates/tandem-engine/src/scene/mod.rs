//! Scene description consumed by `Renderer::render`.
//!
//! Plain data: no GPU handles live here. Storage-backed geometry refers to
//! renderer attributes by handle; the renderer resolves them at draw time.

mod camera;
mod fog;
mod geometry;
mod graph;
mod light;
mod material;

pub use camera::PerspectiveCamera;
pub use fog::Fog;
pub use geometry::{BoxGeometry, Geometry, GeometryId, PositionSource};
pub use graph::{Mesh, MeshIndex, Scene};
pub use light::{AmbientLight, DirectionalLight};
pub use material::BrickMaterial;
