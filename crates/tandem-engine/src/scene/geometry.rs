use std::sync::atomic::{AtomicU64, Ordering};

use crate::render::StorageAttribute;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GeometryId(u64);

/// Where a geometry's vertex positions come from at draw time.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionSource {
    /// The geometry's own positions, uploaded once.
    Static,
    /// A storage attribute, read as `Float32x4` with a 16-byte stride.
    Storage(StorageAttribute),
}

/// Indexed triangle geometry with normals and UVs.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: GeometryId,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u16>,
    position: PositionSource,
}

impl Geometry {
    fn new() -> Self {
        Self {
            id: GeometryId(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed)),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            position: PositionSource::Static,
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Positions widened to four components with the given `w`.
    pub fn positions_vec4(&self, w: f32) -> Vec<[f32; 4]> {
        self.positions.iter().map(|&[x, y, z]| [x, y, z, w]).collect()
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn position_source(&self) -> &PositionSource {
        &self.position
    }

    /// Draws positions from `attribute` instead of the static data.
    ///
    /// The attribute should hold one four-component element per vertex.
    pub fn set_position_attribute(&mut self, attribute: StorageAttribute) {
        if attribute.count() != self.vertex_count() || attribute.item_size() != 4 {
            log::warn!(
                "position attribute has {}x{} components for {} vertices",
                attribute.count(),
                attribute.item_size(),
                self.vertex_count()
            );
        }
        self.position = PositionSource::Storage(attribute);
    }
}

/// Axis-aligned box centered at the origin, one quad per face.
///
/// Vertex order matches the common web convention: faces +x, −x, +y, −y, +z,
/// −z, four vertices each, counter-clockwise front faces.
pub struct BoxGeometry;

impl BoxGeometry {
    pub fn new(width: f32, height: f32, depth: f32) -> Geometry {
        let mut g = Geometry::new();

        // (u, v, w) axes, u/v directions, plane width/height/depth.
        build_plane(&mut g, [2, 1, 0], -1.0, -1.0, depth, height, width);
        build_plane(&mut g, [2, 1, 0], 1.0, -1.0, depth, height, -width);
        build_plane(&mut g, [0, 2, 1], 1.0, 1.0, width, depth, height);
        build_plane(&mut g, [0, 2, 1], 1.0, -1.0, width, depth, -height);
        build_plane(&mut g, [0, 1, 2], 1.0, -1.0, width, height, depth);
        build_plane(&mut g, [0, 1, 2], -1.0, -1.0, width, height, -depth);

        g
    }
}

fn build_plane(
    g: &mut Geometry,
    [u, v, w]: [usize; 3],
    udir: f32,
    vdir: f32,
    width: f32,
    height: f32,
    depth: f32,
) {
    let base = g.positions.len() as u16;

    for iy in 0..2 {
        let y = iy as f32 * height - height / 2.0;
        for ix in 0..2 {
            let x = ix as f32 * width - width / 2.0;

            let mut p = [0.0; 3];
            p[u] = x * udir;
            p[v] = y * vdir;
            p[w] = depth / 2.0;
            g.positions.push(p);

            let mut n = [0.0; 3];
            n[w] = if depth > 0.0 { 1.0 } else { -1.0 };
            g.normals.push(n);

            g.uvs.push([ix as f32, 1.0 - iy as f32]);
        }
    }

    let (a, b, c, d) = (base, base + 2, base + 3, base + 1);
    g.indices.extend_from_slice(&[a, b, d, b, c, d]);
}
