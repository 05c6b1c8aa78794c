use tandem_engine::device::{GpuInit, request_headless};
use tandem_engine::paint::Color;
use tandem_engine::render::{
    BufferOrigin, CacheKey, CodeNode, ExternalHooks, FnNode, RenderTarget, Renderer, RendererConfig,
    StorageAttribute, StorageNode,
};
use tandem_engine::scene::{BoxGeometry, BrickMaterial, Mesh, PerspectiveCamera, Scene};
use tandem_engine::time::FrameTime;

fn renderer() -> Option<Renderer> {
    match pollster::block_on(request_headless(&GpuInit::default())) {
        Ok((device, queue)) => Some(Renderer::new(device, queue, RendererConfig::default())),
        Err(err) => {
            eprintln!("skipping: no GPU device ({err:#})");
            None
        }
    }
}

fn vec4s(bytes: &[u8]) -> Vec<[f32; 4]> {
    bytes.chunks_exact(16).map(bytemuck::pod_read_unaligned).collect()
}

fn seeded(renderer: &mut Renderer, count: u32) -> StorageAttribute {
    let attribute = StorageAttribute::new(count, 4);
    let data: Vec<[f32; 4]> = (0..count).map(|i| [i as f32, 0.0, -(i as f32), 1.0]).collect();
    renderer
        .write_attribute(&attribute, bytemuck::cast_slice(&data))
        .unwrap();
    attribute
}

// ── fn nodes ────────────────────────────────────────────────────────────

#[test]
fn fn_node_updates_only_y() {
    let Some(mut renderer) = renderer() else { return };
    let attribute = seeded(&mut renderer, 24);
    let node = FnNode::new()
        .storage("position", &StorageNode::new(attribute.clone()))
        .body("position.y += 1.0;")
        .compute(24);

    renderer.compute(&node).unwrap();
    renderer.compute(&node).unwrap();

    let out = vec4s(&renderer.read_attribute(&attribute).unwrap());
    for (i, v) in out.iter().enumerate() {
        assert_eq!(*v, [i as f32, 2.0, -(i as f32), 1.0]);
    }

    let source = &renderer.compute_data(&node).unwrap().compute_shader;
    let key = CacheKey::for_compute(source, [1, 1, 1]);
    assert_eq!(renderer.record(&key).map(|r| r.used_times), Some(2));
}

#[test]
fn fn_node_sees_advanced_clock() {
    let Some(mut renderer) = renderer() else { return };
    let attribute = seeded(&mut renderer, 4);
    let node = FnNode::new()
        .storage("p", &StorageNode::new(attribute.clone()))
        .body("p.x = delta;\np.w = time;")
        .compute(4);

    renderer.init();
    renderer.advance(&FrameTime::fixed(3, 0.25));
    renderer.compute(&node).unwrap();

    let out = vec4s(&renderer.read_attribute(&attribute).unwrap());
    assert!(out.iter().all(|v| v[0] == 0.25 && v[3] == 0.75));
}

#[test]
fn code_node_runs_verbatim() {
    let Some(mut renderer) = renderer() else { return };
    let attribute = seeded(&mut renderer, 8);
    let source = "@group(0) @binding(0) var<storage, read_write> xs: array<vec4<f32>>;\n\
                  @compute @workgroup_size(8)\n\
                  fn main(@builtin(global_invocation_id) gid: vec3u) {\n    xs[gid.x].z = 5.0;\n}\n";
    let node = CodeNode::new(source, &[StorageNode::new(attribute.clone())]).compute([1, 1, 1]);

    renderer.compute(&node).unwrap();
    let out = vec4s(&renderer.read_attribute(&attribute).unwrap());
    assert!(out.iter().all(|v| v[2] == 5.0));
}

// ── attributes ──────────────────────────────────────────────────────────

#[test]
fn adopting_replaces_owned_buffer() {
    let Some(mut renderer) = renderer() else { return };
    let attribute = seeded(&mut renderer, 2);
    assert_eq!(renderer.stats().owned_attribute_buffers, 1);
    assert_eq!(renderer.attribute_origin(&attribute), Some(BufferOrigin::Owned));

    let external = renderer.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("external"),
        size: attribute.byte_size(),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    renderer.queue().write_buffer(&external, 0, bytemuck::cast_slice(&[[9.0f32; 4]; 2]));
    renderer.adopt_attribute_buffer(&attribute, external, 7);

    let stats = renderer.stats();
    assert_eq!(stats.owned_attribute_buffers, 0);
    assert_eq!(stats.external_attribute_buffers, 1);
    assert_eq!(renderer.attribute_origin(&attribute), Some(BufferOrigin::External(7)));
    assert_eq!(vec4s(&renderer.read_attribute(&attribute).unwrap()), vec![[9.0; 4]; 2]);
}

#[test]
fn bind_groups_follow_adopted_buffers() {
    let Some(mut renderer) = renderer() else { return };
    let attribute = seeded(&mut renderer, 4);
    let node = FnNode::new()
        .storage("p", &StorageNode::new(attribute.clone()))
        .body("p.y += 1.0;")
        .compute(4);
    renderer.compute(&node).unwrap();

    let external = renderer.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("external"),
        size: attribute.byte_size(),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    renderer.queue().write_buffer(&external, 0, bytemuck::cast_slice(&[[0.0f32, 10.0, 0.0, 0.0]; 4]));
    renderer.adopt_attribute_buffer(&attribute, external, 1);

    renderer.compute(&node).unwrap();
    let out = vec4s(&renderer.read_attribute(&attribute).unwrap());
    assert!(out.iter().all(|v| v[1] == 11.0));
}

#[test]
fn oversized_write_is_rejected() {
    let Some(mut renderer) = renderer() else { return };
    let attribute = StorageAttribute::new(1, 4);
    let err = renderer.write_attribute(&attribute, &[0u8; 32]).unwrap_err();
    assert!(err.to_string().contains("exceeds"));
}

// ── draw ────────────────────────────────────────────────────────────────

#[test]
fn renders_storage_backed_box() {
    let Some(mut renderer) = renderer() else { return };

    let mut geometry = BoxGeometry::new(1.0, 1.0, 1.0);
    let attribute = StorageAttribute::new(geometry.vertex_count(), 4);
    renderer
        .write_attribute(&attribute, bytemuck::cast_slice(&geometry.positions_vec4(1.0)))
        .unwrap();
    geometry.set_position_attribute(attribute);

    let mut scene = Scene::new();
    scene.background = Some(Color::BLACK);
    scene.add(Mesh::new(geometry, BrickMaterial::default()));

    let mut camera = PerspectiveCamera::new(80.0, 1.0, 0.1, 100.0);
    camera.position = glam::Vec3::new(3.0, 1.0, 3.0);

    let size = 64u32;
    let texture = renderer.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen"),
        size: wgpu::Extent3d { width: size, height: size, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let readback = renderer.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("pixels"),
        size: (size * size * 4) as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = renderer
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
        let mut target = RenderTarget::new(&mut encoder, &view, wgpu::TextureFormat::Rgba8Unorm, (size, size));
        renderer.render(&scene, &camera, &mut target).unwrap();
    }
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * 4),
                rows_per_image: Some(size),
            },
        },
        wgpu::Extent3d { width: size, height: size, depth_or_array_layers: 1 },
    );
    renderer.queue().submit(std::iter::once(encoder.finish()));

    readback.slice(..).map_async(wgpu::MapMode::Read, |_| {});
    renderer.device().poll(wgpu::PollType::wait_indefinitely()).unwrap();
    let pixels = readback.slice(..).get_mapped_range().to_vec();

    let at = |x: u32, y: u32| {
        let i = ((y * size + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    };
    // Corner shows the background, center shows the box.
    assert_eq!(at(0, 0), [0, 0, 0, 255]);
    assert_ne!(at(size / 2, size / 2), [0, 0, 0, 255]);
}
