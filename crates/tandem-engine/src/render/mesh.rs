use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::scene::{Geometry, GeometryId, Mesh, PerspectiveCamera, Scene};

use super::ctx::RenderTarget;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
}

impl FrameUniform {
    pub(crate) fn new(scene: &Scene, camera: &PerspectiveCamera) -> Self {
        let (light_dir, light_color) = match &scene.directional {
            Some(light) => (light.direction_to_light().extend(0.0).to_array(), light.radiance().to_array()),
            None => ([0.0, 1.0, 0.0, 0.0], [0.0; 4]),
        };
        let (fog_color, fog_range) = match &scene.fog {
            Some(fog) => {
                let c = fog.color;
                ([c.r, c.g, c.b, 1.0], [fog.near, fog.far, 0.0, 0.0])
            }
            None => ([0.0; 4], [0.0; 4]),
        };

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            ambient: scene.ambient.radiance().to_array(),
            light_dir,
            light_color,
            fog_color,
            fog_range,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MaterialUniform {
    model: [[f32; 4]; 4],
    brick: [f32; 4],
    mortar: [f32; 4],
    pattern: [f32; 4],
    params: [f32; 4],
}

impl MaterialUniform {
    fn new(mesh: &Mesh) -> Self {
        let m = &mesh.material;
        Self {
            model: mesh.transform.to_cols_array_2d(),
            brick: m.brick.to_array(),
            mortar: m.mortar.to_array(),
            pattern: [m.repeat[0], m.repeat[1], m.bricks[0], m.bricks[1]],
            params: [m.mortar_width, 0.0, 0.0, 0.0],
        }
    }
}

/// Static per-geometry buffers. Positions are widened to `vec4` so static and
/// storage-backed geometry share one vertex layout.
struct GeometryBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    uvs: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GeometryBuffers {
    fn new(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex = |label, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        // Index data is padded to the copy alignment.
        let mut indices = geometry.indices().to_vec();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }

        Self {
            positions: vertex("tandem mesh positions", bytemuck::cast_slice(&geometry.positions_vec4(1.0))),
            normals: vertex("tandem mesh normals", bytemuck::cast_slice(geometry.normals())),
            uvs: vertex("tandem mesh uvs", bytemuck::cast_slice(geometry.uvs())),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tandem mesh indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: geometry.index_count(),
        }
    }
}

/// One mesh to draw with its resolved position buffer (`None` = static).
pub(crate) struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub positions: Option<wgpu::Buffer>,
}

/// Forward renderer for [`Scene`] meshes.
///
/// Pipelines are rebuilt when the target format changes, the depth buffer when
/// the target size changes.
#[derive(Default)]
pub(crate) struct MeshRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    frame_layout: Option<wgpu::BindGroupLayout>,
    material_layout: Option<wgpu::BindGroupLayout>,

    frame_ubo: Option<wgpu::Buffer>,
    frame_bind_group: Option<wgpu::BindGroup>,

    /// One uniform + bind group per mesh slot, grown on demand.
    materials: Vec<(wgpu::Buffer, wgpu::BindGroup)>,

    depth: Option<(wgpu::TextureView, (u32, u32))>,

    geometries: HashMap<GeometryId, GeometryBuffers>,
}

impl MeshRenderer {
    pub(crate) fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &mut RenderTarget<'_>,
        frame: &FrameUniform,
        clear: Color,
        items: &[DrawItem<'_>],
    ) {
        self.ensure_pipeline(device, target.format);
        self.ensure_frame_bindings(device);
        self.ensure_depth(device, target.size);
        self.ensure_materials(device, items.len());
        for item in items {
            self.geometries
                .entry(item.mesh.geometry.id())
                .or_insert_with(|| GeometryBuffers::new(device, &item.mesh.geometry));
        }

        if let Some(ubo) = &self.frame_ubo {
            queue.write_buffer(ubo, 0, bytemuck::bytes_of(frame));
        }
        for (item, (ubo, _)) in items.iter().zip(&self.materials) {
            queue.write_buffer(ubo, 0, bytemuck::bytes_of(&MaterialUniform::new(item.mesh)));
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(frame_group) = self.frame_bind_group.as_ref() else { return };
        let Some((depth_view, _)) = self.depth.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tandem mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, frame_group, &[]);

        for (item, (_, material_group)) in items.iter().zip(&self.materials) {
            let Some(buffers) = self.geometries.get(&item.mesh.geometry.id()) else { continue };
            let positions = item.positions.as_ref().unwrap_or(&buffers.positions);

            rpass.set_bind_group(1, material_group, &[]);
            rpass.set_vertex_buffer(0, positions.slice(..));
            rpass.set_vertex_buffer(1, buffers.normals.slice(..));
            rpass.set_vertex_buffer(2, buffers.uvs.slice(..));
            rpass.set_index_buffer(buffers.indices.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..buffers.index_count, 0, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tandem mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let frame_layout = uniform_layout::<FrameUniform>(device, "tandem mesh frame bgl");
        let material_layout = uniform_layout::<MaterialUniform>(device, "tandem mesh material bgl");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tandem mesh pipeline layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tandem mesh pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    vertex_layout(16, &POSITION_ATTRS),
                    vertex_layout(12, &NORMAL_ATTRS),
                    vertex_layout(8, &UV_ATTRS),
                ],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        log::debug!("mesh pipeline built for {format:?}");

        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.frame_layout = Some(frame_layout);
        self.material_layout = Some(material_layout);

        // Bind groups reference the old layouts.
        self.frame_ubo = None;
        self.frame_bind_group = None;
        self.materials.clear();
    }

    fn ensure_frame_bindings(&mut self, device: &wgpu::Device) {
        if self.frame_bind_group.is_some() {
            return;
        }
        let Some(layout) = self.frame_layout.as_ref() else { return };

        let (ubo, group) = uniform_binding::<FrameUniform>(device, layout, "tandem mesh frame");
        self.frame_ubo = Some(ubo);
        self.frame_bind_group = Some(group);
    }

    fn ensure_materials(&mut self, device: &wgpu::Device, count: usize) {
        let Some(layout) = self.material_layout.as_ref() else { return };
        while self.materials.len() < count {
            self.materials
                .push(uniform_binding::<MaterialUniform>(device, layout, "tandem mesh material"));
        }
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        let size = (size.0.max(1), size.1.max(1));
        if matches!(&self.depth, Some((_, s)) if *s == size) {
            return;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tandem depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some((view, size));
    }
}

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];
const NORMAL_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const UV_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

fn vertex_layout(
    stride: u64,
    attributes: &'static [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

fn uniform_layout<T>(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

fn uniform_binding<T>(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let ubo = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.as_entire_binding(),
        }],
    });
    (ubo, group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AmbientLight, BoxGeometry, BrickMaterial, DirectionalLight, Fog};
    use glam::Vec3;

    #[test]
    fn mesh_shader_validates() {
        let src = include_str!("shaders/mesh.wgsl");
        let module = naga::front::wgsl::parse_str(src)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(src)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap();
    }

    #[test]
    fn uniform_sizes_match_shader_structs() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 160);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 128);
    }

    #[test]
    fn frame_uniform_encodes_lights_and_fog() {
        let mut scene = Scene::new();
        scene.ambient = AmbientLight::new(Color::WHITE, 0.2);
        scene.directional = Some(
            DirectionalLight::new(Color::from_hex(0xff9900), 1.0)
                .with_position(Vec3::new(20.0, 2.0, 5.0)),
        );
        scene.fog = Some(Fog::new(Color::from_hex(0x0f0f0f), 1.0, 10.0));
        scene.add(Mesh::new(BoxGeometry::new(1.0, 1.0, 1.0), BrickMaterial::default()));

        let camera = PerspectiveCamera::new(80.0, 1.0, 0.1, 100.0);
        let u = FrameUniform::new(&scene, &camera);

        assert!((u.ambient[0] - 0.2).abs() < 1e-6);
        assert!(u.light_dir[0] > 0.9);
        assert_eq!(u.fog_color[3], 1.0);
        assert_eq!(&u.fog_range[..2], &[1.0, 10.0]);
    }

    #[test]
    fn no_fog_disables_fog_flag() {
        let u = FrameUniform::new(&Scene::new(), &PerspectiveCamera::new(80.0, 1.0, 0.1, 100.0));
        assert_eq!(u.fog_color[3], 0.0);
        assert_eq!(u.light_color, [0.0; 4]);
    }
}
