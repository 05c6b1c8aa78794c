use glam::Mat4;

use super::fog::Fog;
use super::geometry::Geometry;
use super::light::{AmbientLight, DirectionalLight};
use super::material::BrickMaterial;
use crate::paint::Color;

/// A drawable: geometry, material and model transform.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: BrickMaterial,
    pub transform: Mat4,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: BrickMaterial) -> Self {
        Self {
            geometry,
            material,
            transform: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshIndex(usize);

/// Flat scene: meshes plus one ambient light, an optional directional light
/// and optional fog.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Clear color; the renderer's default is used when unset.
    pub background: Option<Color>,
    pub ambient: AmbientLight,
    pub directional: Option<DirectionalLight>,
    pub fog: Option<Fog>,
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mesh: Mesh) -> MeshIndex {
        self.meshes.push(mesh);
        MeshIndex(self.meshes.len() - 1)
    }

    pub fn mesh(&self, index: MeshIndex) -> Option<&Mesh> {
        self.meshes.get(index.0)
    }

    pub fn mesh_mut(&mut self, index: MeshIndex) -> Option<&mut Mesh> {
        self.meshes.get_mut(index.0)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}
