//! The two compute programs that move the cube's vertices.
//!
//! Both only touch the y component. The renderer-native one is a `Fn` node
//! body; the typed one is a `ComputeFn` compiled by `tandem-gpu` and injected
//! into the renderer.

use tandem_engine::render::{ComputeNode, FnNode, StorageNode};
use tandem_gpu::data as d;
use tandem_gpu::{Access, BindGroupLayout, Builtin, CompiledProgram, ComputeFn, Root, TypedBuffer};

/// Body of the renderer-native program, one invocation per vertex.
pub const NATIVE_BODY: &str = "position.y += osc_sine(time * 0.1) * 0.01 - 0.005;";

pub fn native_wobble(positions: &StorageNode) -> ComputeNode {
    FnNode::new()
        .storage("position", positions)
        .body(NATIVE_BODY)
        .compute(positions.count())
}

/// Layout of the injected program: the shared vertices and the frame counter.
pub fn wobble_layout(count: u32) -> BindGroupLayout {
    BindGroupLayout::new("wobble")
        .storage("vertices", d::array_of(d::vec4f(), count), Access::Mutable)
        .storage("iteration", d::u32(), Access::ReadOnly)
}

/// Even elements move up while odd ones move down, by `sin(iteration / 50) / 300`.
pub fn wobble_function(count: u32, workgroup_size: u32) -> ComputeFn {
    ComputeFn::new("main")
        .workgroup_size(&[workgroup_size])
        .builtin("gid", Builtin::GlobalInvocationId)
        .body(format!(
            "let index = gid.x;\n\
             if (index >= {count}u) {{\n    return;\n}}\n\
             let sign = 1.0 - 2.0 * f32(index % 2u);\n\
             vertices[index] += vec4f(0.0, sin(f32(iteration) / 50.0) / 300.0 * sign, 0.0, 0.0);"
        ))
}

/// Builds and compiles the injected program against the given buffers.
pub fn compile_wobble(
    root: &Root,
    vertices: &TypedBuffer,
    iteration: &TypedBuffer,
    workgroup_size: u32,
) -> Result<CompiledProgram, tandem_gpu::TypedError> {
    let count = vertices.element_count();
    let workgroup_size = workgroup_size.max(1);
    let layout = wobble_layout(count);
    let group = root.create_bind_group(&layout, &[("vertices", vertices), ("iteration", iteration)])?;
    let pipeline = root
        .with_compute(wobble_function(count, workgroup_size))
        .layout(&layout)
        .create()?;
    pipeline.compile(&group, [count.div_ceil(workgroup_size), 1, 1])
}
