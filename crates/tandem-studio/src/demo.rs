use anyhow::{Context, Result, ensure};
use glam::Vec3;
use tandem_bridge::{AliasedStorage, Bridge, FrameCounter, FrameDriver, FrameStage};
use tandem_engine::controls::OrbitControls;
use tandem_engine::input::{InputFrame, InputState};
use tandem_engine::render::{EngineError, RenderTarget, Renderer, RendererConfig};
use tandem_engine::scene::{
    AmbientLight, BoxGeometry, BrickMaterial, DirectionalLight, Fog, Mesh, PerspectiveCamera, Scene,
};
use tandem_engine::time::FrameTime;
use tandem_gpu::data as d;
use tandem_gpu::{Root, TypedBuffer, Usage};

use crate::config::DemoConfig;
use crate::programs;

/// Camera, controls and scene; the part of the demo the driver hands frames to.
struct CubeStage {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
}

impl FrameStage for CubeStage {
    fn update(&mut self, _time: &FrameTime) {
        self.controls.update(&mut self.camera);
    }

    fn render(&mut self, renderer: &mut Renderer, target: &mut RenderTarget<'_>) -> Result<(), EngineError> {
        renderer.render(&self.scene, &self.camera, target)
    }
}

/// A brick cube whose vertex buffer is moved by two compute programs each frame,
/// one native to the renderer and one injected from `tandem-gpu`.
pub struct CubeDemo {
    renderer: Renderer,
    bridge: Bridge,
    driver: FrameDriver,
    stage: CubeStage,
    vertices: TypedBuffer,
    positions: AliasedStorage,
    initial: Vec<[f32; 4]>,
}

impl CubeDemo {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, config: &DemoConfig) -> Result<Self> {
        let root = Root::from_device(device.clone(), queue.clone());
        let mut renderer = Renderer::new(
            device,
            queue,
            RendererConfig {
                clear_color: config.background,
                ..RendererConfig::default()
            },
        );
        let mut bridge = Bridge::new(&renderer)?;

        let mut geometry = BoxGeometry::new(config.cube_size, config.cube_size, config.cube_size);
        ensure!(
            geometry.vertex_count() == config.element_count,
            "cube has {} vertices, configured element count is {}",
            geometry.vertex_count(),
            config.element_count
        );

        let initial = geometry.positions_vec4(1.0);
        let vertices = root
            .create_buffer(d::array_of(d::vec4f(), config.element_count))
            .label("cube vertices")
            .usages([Usage::Storage, Usage::Vertex])
            .initial(&initial)
            .create()
            .context("creating the shared vertex buffer")?;
        let counter = FrameCounter::new(&root)?;

        let positions = bridge.alias(&vertices, &mut renderer)?;
        let iteration = bridge.alias(counter.buffer(), &mut renderer)?;
        geometry.set_position_attribute(positions.attribute().clone());

        let program = programs::compile_wobble(&root, &vertices, counter.buffer(), config.workgroup_size)
            .context("compiling the wobble program")?;
        let injected = bridge.inject(
            &program,
            &[positions.node().clone(), iteration.node().clone()],
            &mut renderer,
        )?;

        let mut driver = FrameDriver::new(counter);
        driver.add_native(programs::native_wobble(positions.node()));
        driver.add_injected(injected);

        let mut scene = Scene::new();
        scene.background = Some(config.background);
        scene.ambient = AmbientLight::new(config.ambient_color, config.ambient_intensity);
        scene.directional = Some(
            DirectionalLight::new(config.light_color, config.light_intensity)
                .with_position(config.light_position)
                .look_at(Vec3::ZERO),
        );
        scene.fog = Some(Fog::new(config.fog_color, config.fog_near, config.fog_far));
        let [u, v] = config.brick_repeat;
        scene.add(Mesh::new(geometry, BrickMaterial::default().with_repeat(u, v)));

        let mut camera = PerspectiveCamera::new(config.fov_y, 1.0, config.near, config.far);
        camera.position = config.camera_position;
        camera.look_at(Vec3::ZERO);

        let mut controls =
            OrbitControls::new(Vec3::ZERO).with_distance_limits(config.min_distance, config.max_distance);
        controls.enable_damping = true;
        controls.damping_factor = config.damping_factor;

        log::info!(
            "cube demo ready: {} vertices shared between renderer and typed buffer {}",
            config.element_count,
            vertices.id()
        );

        Ok(Self {
            renderer,
            bridge,
            driver,
            stage: CubeStage { scene, camera, controls },
            vertices,
            positions,
            initial,
        })
    }

    /// Physical size sets the aspect, logical height scales drag rotation.
    pub fn resize(&mut self, width: u32, height: u32, logical_height: f32) {
        self.stage.camera.set_viewport(width, height);
        self.stage.controls.set_viewport_height(logical_height);
    }

    pub fn handle_input(&mut self, frame: &InputFrame, state: &InputState) {
        self.stage.controls.handle_input(frame, state);
    }

    /// One driver tick: both compute programs, then the draw into `target`.
    pub fn frame(&mut self, time: &FrameTime, target: &mut RenderTarget<'_>) -> Result<()> {
        self.driver
            .tick(&mut self.renderer, &mut self.stage, time, target)
            .with_context(|| format!("frame {}", time.frame_index))
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.stage.camera
    }

    /// The typed side of the shared vertex buffer.
    pub fn vertices(&self) -> &TypedBuffer {
        &self.vertices
    }

    /// The renderer side of the shared vertex buffer.
    pub fn positions(&self) -> &AliasedStorage {
        &self.positions
    }

    /// Vertex positions before the first frame.
    pub fn initial_positions(&self) -> &[[f32; 4]] {
        &self.initial
    }
}
