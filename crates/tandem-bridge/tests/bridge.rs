use tandem_bridge::{Bridge, BridgeError, DriverState, FrameCounter, FrameDriver, FrameStage};
use tandem_engine::render::{
    BindGroupId, BufferOrigin, CacheKey, ComputeNode, ComputeNodeData, ComputePipelineRecord, EngineError,
    ExternalHooks, FnNode, RenderTarget, Renderer, RendererConfig, RendererStats, StorageAttribute, StorageNode,
};
use tandem_engine::time::FrameTime;
use tandem_gpu::data as d;
use tandem_gpu::{Access, BindGroupLayout, Builtin, CompiledProgram, ComputeFn, Root, TypedBuffer, Usage};

fn setup() -> Option<(Root, Renderer)> {
    match pollster::block_on(Root::init()) {
        Ok(root) => {
            let renderer = Renderer::new(root.device().clone(), root.queue().clone(), RendererConfig::default());
            Some((root, renderer))
        }
        Err(err) => {
            eprintln!("skipping: no GPU adapter ({err})");
            None
        }
    }
}

fn vertices(root: &Root) -> TypedBuffer {
    let data: Vec<[f32; 4]> = (0..24).map(|i| [i as f32, 0.0, -(i as f32), 1.0]).collect();
    root.create_buffer(d::array_of(d::vec4f(), 24))
        .usages([Usage::Storage, Usage::Vertex])
        .initial(&data)
        .create()
        .unwrap()
}

fn wobble_program(root: &Root, vertices: &TypedBuffer, iteration: &TypedBuffer) -> CompiledProgram {
    let layout = BindGroupLayout::new("wobble")
        .storage("vertices", d::array_of(d::vec4f(), 24), Access::Mutable)
        .storage("iteration", d::u32(), Access::ReadOnly);
    let group = root
        .create_bind_group(&layout, &[("vertices", vertices), ("iteration", iteration)])
        .unwrap();
    let pipeline = root
        .with_compute(
            ComputeFn::new("main")
                .workgroup_size(&[24])
                .builtin("gid", Builtin::GlobalInvocationId)
                .body(
                    "let index = gid.x;\n\
                     let sign = 1.0 - 2.0 * f32(index % 2u);\n\
                     vertices[index] += vec4f(0.0, sin(f32(iteration) / 50.0) / 300.0 * sign, 0.0, 0.0);",
                ),
        )
        .layout(&layout)
        .create()
        .unwrap();
    pipeline.compile(&group, [1, 1, 1]).unwrap()
}

fn vec4s(bytes: &[u8]) -> Vec<[f32; 4]> {
    bytes.chunks_exact(16).map(bytemuck::pod_read_unaligned).collect()
}

// ── alias ───────────────────────────────────────────────────────────────

#[test]
fn aliased_buffer_is_shared_both_ways() {
    let Some((root, mut renderer)) = setup() else { return };
    let bridge = Bridge::new(&renderer).unwrap();
    let buffer = vertices(&root);

    let aliased = bridge.alias(&buffer, &mut renderer).unwrap();
    assert_eq!(aliased.node().count(), 24);
    assert_eq!(aliased.origin(), buffer.id());
    assert_eq!(
        renderer.attribute_origin(aliased.attribute()),
        Some(BufferOrigin::External(buffer.id().get()))
    );

    // Typed write, renderer read.
    buffer.write(&[[7.0f32, 8.0, 9.0, 1.0]; 24]).unwrap();
    let seen = vec4s(&renderer.read_attribute(aliased.attribute()).unwrap());
    assert_eq!(seen, vec![[7.0, 8.0, 9.0, 1.0]; 24]);

    // Renderer write, typed read.
    renderer
        .write_attribute(aliased.attribute(), bytemuck::cast_slice(&[[1.0f32; 4]; 24]))
        .unwrap();
    assert_eq!(buffer.read_as::<f32>().unwrap(), vec![1.0; 96]);

    let stats = renderer.stats();
    assert_eq!(stats.owned_attribute_buffers, 0);
    assert_eq!(stats.external_attribute_buffers, 1);
}

#[test]
fn half_precision_is_rejected_without_side_effects() {
    let Some((root, mut renderer)) = setup() else { return };
    let bridge = Bridge::new(&renderer).unwrap();
    let buffer = root
        .create_buffer(d::array_of(d::vec3h(), 24))
        .usage(Usage::Storage)
        .create()
        .unwrap();

    let before = renderer.stats();
    let err = bridge.alias(&buffer, &mut renderer).unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedElementType { ref found } if found == "vec3h"));
    assert_eq!(renderer.stats(), before);
}

#[test]
fn alias_requires_storage_usage() {
    let Some((root, mut renderer)) = setup() else { return };
    let bridge = Bridge::new(&renderer).unwrap();
    let buffer = root
        .create_buffer(d::array_of(d::vec4f(), 4))
        .usage(Usage::Vertex)
        .create()
        .unwrap();

    let err = bridge.alias(&buffer, &mut renderer).unwrap_err();
    assert!(matches!(err, BridgeError::MissingUsage { usage: Usage::Storage, .. }));
    assert_eq!(renderer.stats().external_attribute_buffers, 0);
}

// ── inject ──────────────────────────────────────────────────────────────

#[test]
fn injection_is_unique_per_cache_key() {
    let Some((root, mut renderer)) = setup() else { return };
    let mut bridge = Bridge::new(&renderer).unwrap();
    let buffer = vertices(&root);
    let counter = FrameCounter::new(&root).unwrap();
    let program = wobble_program(&root, &buffer, counter.buffer());

    let vertices = bridge.alias(&buffer, &mut renderer).unwrap();
    let iteration = bridge.alias(counter.buffer(), &mut renderer).unwrap();
    let storages = [vertices.node().clone(), iteration.node().clone()];

    let handle = bridge.inject(&program, &storages, &mut renderer).unwrap();
    assert!(renderer.is_initialized());
    assert_eq!(renderer.record(&handle.key()).map(|r| r.used_times), Some(0));

    let before = renderer.stats();
    let err = bridge.inject(&program, &storages, &mut renderer).unwrap_err();
    assert!(matches!(err, BridgeError::DuplicateInjection { key } if key == handle.key()));
    assert_eq!(renderer.stats(), before);
    assert_eq!(before.pipeline_records, 1);
    assert_eq!(bridge.injected(), &[handle.key()]);
}

/// Delegates to the renderer but refuses to build bind groups.
struct NoBindings<'a>(&'a mut Renderer);

impl ExternalHooks for NoBindings<'_> {
    fn hooks_version(&self) -> u32 {
        self.0.hooks_version()
    }

    fn is_initialized(&self) -> bool {
        self.0.is_initialized()
    }

    fn init(&mut self) {
        self.0.init();
    }

    fn adopt_attribute_buffer(&mut self, attribute: &StorageAttribute, buffer: wgpu::Buffer, origin: u64) {
        self.0.adopt_attribute_buffer(attribute, buffer, origin);
    }

    fn materialize_compute(&mut self, node: &ComputeNode) -> &mut ComputeNodeData {
        self.0.materialize_compute(node)
    }

    fn register_compute_program(&mut self, source: &str, module: wgpu::ShaderModule) {
        self.0.register_compute_program(source, module);
    }

    fn compute_cache_key(&self, node: &ComputeNode, source: &str) -> CacheKey {
        self.0.compute_cache_key(node, source)
    }

    fn has_pipeline_record(&self, key: &CacheKey) -> bool {
        self.0.has_pipeline_record(key)
    }

    fn insert_pipeline_record(&mut self, record: ComputePipelineRecord) {
        self.0.insert_pipeline_record(record);
    }

    fn override_pipeline(&mut self, key: &CacheKey, pipeline: wgpu::ComputePipeline) -> Result<(), EngineError> {
        self.0.override_pipeline(key, pipeline)
    }

    fn create_bindings(&mut self, node: &ComputeNode, group: u32) -> Result<BindGroupId, EngineError> {
        Err(EngineError::NoSuchGroup { node: node.id(), group })
    }

    fn override_bind_group(
        &mut self,
        id: &BindGroupId,
        group: wgpu::BindGroup,
        layout: wgpu::BindGroupLayout,
    ) -> Result<(), EngineError> {
        self.0.override_bind_group(id, group, layout)
    }

    fn stats(&self) -> RendererStats {
        self.0.stats()
    }
}

#[test]
fn failed_injection_can_be_retried() {
    let Some((root, mut renderer)) = setup() else { return };
    let mut bridge = Bridge::new(&renderer).unwrap();
    let buffer = vertices(&root);
    let counter = FrameCounter::new(&root).unwrap();
    let program = wobble_program(&root, &buffer, counter.buffer());

    let vertices = bridge.alias(&buffer, &mut renderer).unwrap();
    let iteration = bridge.alias(counter.buffer(), &mut renderer).unwrap();
    let storages = [vertices.node().clone(), iteration.node().clone()];

    let err = bridge
        .inject(&program, &storages, &mut NoBindings(&mut renderer))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Renderer(EngineError::NoSuchGroup { group: 0, .. })), "{err:?}");
    assert_eq!(renderer.stats().pipeline_records, 0);
    assert!(bridge.injected().is_empty());

    let handle = bridge.inject(&program, &storages, &mut renderer).unwrap();
    assert_eq!(renderer.record(&handle.key()).map(|r| r.used_times), Some(0));
    assert_eq!(bridge.injected(), &[handle.key()]);
}

#[test]
fn injected_program_runs_through_renderer() {
    let Some((root, mut renderer)) = setup() else { return };
    let mut bridge = Bridge::new(&renderer).unwrap();
    let buffer = vertices(&root);
    let counter = FrameCounter::starting_at(&root, 25).unwrap();
    let program = wobble_program(&root, &buffer, counter.buffer());

    let vertices = bridge.alias(&buffer, &mut renderer).unwrap();
    let iteration = bridge.alias(counter.buffer(), &mut renderer).unwrap();
    let handle = bridge
        .inject(&program, &[vertices.node().clone(), iteration.node().clone()], &mut renderer)
        .unwrap();

    renderer.compute(handle.node()).unwrap();
    renderer.compute(handle.node()).unwrap();
    assert_eq!(renderer.record(&handle.key()).map(|r| r.used_times), Some(2));

    let offset = 2.0 * (0.5f32).sin() / 300.0;
    let out = buffer.read_as::<[f32; 4]>().unwrap();
    for (i, v) in out.iter().enumerate() {
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        assert!((v[1] - sign * offset).abs() < 1e-6, "element {i}: {v:?}");
        assert_eq!([v[0], v[2], v[3]], [i as f32, -(i as f32), 1.0]);
    }
}

// ── counter ─────────────────────────────────────────────────────────────

#[test]
fn counter_matches_buffer_for_ten_thousand_ticks() {
    let Some((root, _)) = setup() else { return };
    let mut counter = FrameCounter::new(&root).unwrap();
    for expected in 1..=10_000u32 {
        assert_eq!(counter.tick().unwrap(), expected);
        assert_eq!(counter.buffer().read_as::<u32>().unwrap(), vec![expected]);
    }
}

#[test]
fn counter_wraps_to_zero() {
    let Some((root, _)) = setup() else { return };
    let mut counter = FrameCounter::starting_at(&root, u32::MAX).unwrap();
    assert_eq!(counter.tick().unwrap(), 0);
    assert_eq!(counter.buffer().read_as::<u32>().unwrap(), vec![0]);
}

// ── driver ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct CountingStage {
    updates: u32,
    renders: u32,
}

impl FrameStage for CountingStage {
    fn update(&mut self, _time: &FrameTime) {
        self.updates += 1;
    }

    fn render(&mut self, _renderer: &mut Renderer, _target: &mut RenderTarget<'_>) -> Result<(), EngineError> {
        self.renders += 1;
        Ok(())
    }
}

#[test]
fn driver_runs_native_then_injected() {
    let Some((root, mut renderer)) = setup() else { return };
    let mut bridge = Bridge::new(&renderer).unwrap();
    let buffer = vertices(&root);
    let counter = FrameCounter::new(&root).unwrap();
    let program = wobble_program(&root, &buffer, counter.buffer());

    let vertices = bridge.alias(&buffer, &mut renderer).unwrap();
    let iteration = bridge.alias(counter.buffer(), &mut renderer).unwrap();
    let handle = bridge
        .inject(&program, &[vertices.node().clone(), iteration.node().clone()], &mut renderer)
        .unwrap();

    // Native program pins x to a constant; the injected one only touches y.
    let native = FnNode::new()
        .storage("position", &StorageNode::from(vertices.attribute()))
        .body("position.x = 0.5;")
        .compute(24);

    let mut driver = FrameDriver::new(counter);
    driver.add_native(native);
    driver.add_injected(handle.clone());
    assert_eq!(driver.state(), DriverState::Idle);

    let mut stage = CountingStage::default();
    for frame in 0..3 {
        driver
            .compute(&mut renderer, &mut stage, &FrameTime::fixed(frame, 1.0 / 60.0))
            .unwrap();
    }

    assert_eq!(driver.state(), DriverState::Running);
    assert_eq!(driver.counter().value(), 3);
    assert_eq!(stage.updates, 3);
    assert_eq!(stage.renders, 0);
    assert_eq!(renderer.record(&handle.key()).map(|r| r.used_times), Some(3));

    let expected: f32 = (1..=3).map(|i| (i as f32 / 50.0).sin() / 300.0).sum();
    let out = buffer.read_as::<[f32; 4]>().unwrap();
    assert_eq!(out[0][0], 0.5);
    assert!((out[0][1] - expected).abs() < 1e-6);
    assert!((out[1][1] + expected).abs() < 1e-6);
}

#[test]
fn rejected_dispatch_is_a_submission_failure() {
    let Some((root, mut renderer)) = setup() else { return };
    let bridge = Bridge::new(&renderer).unwrap();
    let counter = FrameCounter::new(&root).unwrap();

    // The counter holds one u32; the aliased attribute claims one vec4f, so
    // the dispatch binds 4 bytes where the shader needs 16.
    let undersized = bridge.alias(counter.buffer(), &mut renderer).unwrap();
    let native = FnNode::new()
        .storage("value", &StorageNode::from(undersized.attribute()))
        .body("value.x = 1.0;")
        .compute(1);

    let mut driver = FrameDriver::new(FrameCounter::new(&root).unwrap());
    driver.add_native(native);

    let mut stage = CountingStage::default();
    let err = driver
        .compute(&mut renderer, &mut stage, &FrameTime::fixed(0, 1.0 / 60.0))
        .unwrap_err();
    assert!(matches!(err, BridgeError::GpuSubmissionFailure(_)), "{err:?}");
    assert_eq!(stage.updates, 1);

    // The counter was never written by the rejected dispatch.
    assert_eq!(counter.buffer().read_as::<u32>().unwrap(), vec![0]);
}
