use std::f32::consts::TAU;

use tandem_engine::device::{GpuInit, request_headless};
use tandem_engine::render::{ExternalHooks, RenderTarget};
use tandem_engine::time::FrameTime;
use tandem_studio::{CubeDemo, DemoConfig};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const SIZE: u32 = 64;
const DT: f32 = 1.0 / 60.0;

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    match pollster::block_on(request_headless(&GpuInit::default())) {
        Ok(handles) => Some(handles),
        Err(err) => {
            eprintln!("skipping: no GPU device ({err:#})");
            None
        }
    }
}

fn offscreen(device: &wgpu::Device) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen"),
            size: wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn run_frames(demo: &mut CubeDemo, view: &wgpu::TextureView, frames: u64) {
    for frame in 0..frames {
        let device = demo.renderer().device().clone();
        let queue = demo.renderer().queue().clone();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut target = RenderTarget::new(&mut encoder, view, FORMAT, (SIZE, SIZE));
            demo.frame(&FrameTime::fixed(frame, DT), &mut target).unwrap();
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn osc_sine(t: f32) -> f32 {
    ((t + 0.75) * TAU).sin() * 0.5 + 0.5
}

/// Accumulated y offset of element `index` after `frames` frames.
fn expected_offset(index: usize, frames: u64) -> f32 {
    let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
    let mut y = 0.0f32;
    for frame in 0..frames {
        let time = frame as f32 * DT;
        y += osc_sine(time * 0.1) * 0.01 - 0.005;
        let iteration = (frame + 1) as f32;
        y += (iteration / 50.0).sin() / 300.0 * sign;
    }
    y
}

// ── end to end ──────────────────────────────────────────────────────────

#[test]
fn hundred_frames_move_only_y() {
    let Some((device, queue)) = device() else { return };
    let view = offscreen(&device);
    let mut demo = CubeDemo::new(device, queue, &DemoConfig::default()).unwrap();
    let initial = demo.initial_positions().to_vec();
    assert_eq!(initial.len(), 24);

    run_frames(&mut demo, &view, 100);

    let out = demo.vertices().read_as::<[f32; 4]>().unwrap();
    for (i, (now, before)) in out.iter().zip(&initial).enumerate() {
        assert_ne!(now[1], before[1], "element {i} did not move");
        assert_eq!([now[0], now[2], now[3]], [before[0], before[2], before[3]], "element {i}");

        let expected = before[1] + expected_offset(i, 100);
        assert!((now[1] - expected).abs() < 1e-4, "element {i}: {} vs {expected}", now[1]);
    }
}

#[test]
fn renderer_and_typed_views_agree() {
    let Some((device, queue)) = device() else { return };
    let view = offscreen(&device);
    let mut demo = CubeDemo::new(device, queue, &DemoConfig::default()).unwrap();

    run_frames(&mut demo, &view, 3);

    let typed = demo.vertices().read().unwrap();
    let seen = demo.renderer().read_attribute(demo.positions().attribute()).unwrap();
    assert_eq!(typed, seen);
}

#[test]
fn injected_program_is_dispatched_once_per_frame() {
    let Some((device, queue)) = device() else { return };
    let view = offscreen(&device);
    let mut demo = CubeDemo::new(device, queue, &DemoConfig::default()).unwrap();
    assert_eq!(demo.bridge().injected().len(), 1);

    run_frames(&mut demo, &view, 5);

    let key = demo.bridge().injected()[0];
    assert_eq!(demo.renderer().record(&key).map(|r| r.used_times), Some(5));
    assert_eq!(demo.driver().counter().value(), 5);

    let stats = demo.renderer().stats();
    assert_eq!(stats.external_attribute_buffers, 2);
    assert_eq!(stats.owned_attribute_buffers, 0);
    // The injected program plus the native one built on first dispatch.
    assert_eq!(stats.pipeline_records, 2);
}

// ── setup ───────────────────────────────────────────────────────────────

#[test]
fn element_count_must_match_the_cube() {
    let Some((device, queue)) = device() else { return };
    let config = DemoConfig {
        element_count: 36,
        ..DemoConfig::default()
    };
    let err = CubeDemo::new(device, queue, &config).err().unwrap();
    assert!(err.to_string().contains("24 vertices"), "{err}");
}

#[test]
fn resize_updates_camera_aspect() {
    let Some((device, queue)) = device() else { return };
    let mut demo = CubeDemo::new(device, queue, &DemoConfig::default()).unwrap();
    demo.resize(1280, 720, 720.0);
    assert!((demo.camera().aspect - 1280.0 / 720.0).abs() < 1e-6);

    demo.resize(0, 0, 0.0);
    assert!((demo.camera().aspect - 1280.0 / 720.0).abs() < 1e-6);
}
