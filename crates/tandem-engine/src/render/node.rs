//! Compute nodes and the WGSL node builder.
//!
//! Two kinds of compute node exist:
//! - [`FnNode`]: a per-element body over named storages; the renderer's node
//!   builder generates the full shader, including the `render_info` clock
//!   uniform and the `osc_sine` helper.
//! - [`CodeNode`]: WGSL used verbatim with an explicit dispatch shape; group 0
//!   binds its storages in order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::attribute::StorageNode;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Per-element compute body over named storages.
///
/// Inside the body each storage name is a `var` holding the current element;
/// it is written back after the body runs. `instance_index`, `time` and
/// `delta` are in scope, as is `osc_sine(t)`.
#[derive(Debug, Clone, Default)]
pub struct FnNode {
    names: Vec<String>,
    storages: Vec<StorageNode>,
    body: String,
    workgroup_size: Option<u32>,
}

impl FnNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage(mut self, name: impl Into<String>, node: &StorageNode) -> Self {
        self.names.push(name.into());
        self.storages.push(node.clone());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Overrides the renderer's default workgroup size for this node.
    pub fn workgroup_size(mut self, size: u32) -> Self {
        self.workgroup_size = Some(size.max(1));
        self
    }

    /// One invocation per element, `count` elements.
    pub fn compute(self, count: u32) -> ComputeNode {
        ComputeNode::new(ComputeKind::Fn { node: self, count })
    }

    pub fn storages(&self) -> &[StorageNode] {
        &self.storages
    }
}

/// Verbatim WGSL plus the storages bound at group 0.
#[derive(Debug, Clone)]
pub struct CodeNode {
    source: String,
    storages: Vec<StorageNode>,
}

impl CodeNode {
    pub fn new(source: impl Into<String>, storages: &[StorageNode]) -> Self {
        Self {
            source: source.into(),
            storages: storages.to_vec(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn storages(&self) -> &[StorageNode] {
        &self.storages
    }

    /// Dispatches `dispatch` workgroups per dimension.
    pub fn compute(self, dispatch: [u32; 3]) -> ComputeNode {
        ComputeNode::new(ComputeKind::Code { node: self, dispatch })
    }
}

#[derive(Debug, Clone)]
pub enum ComputeKind {
    Fn { node: FnNode, count: u32 },
    Code { node: CodeNode, dispatch: [u32; 3] },
}

/// Bind group contents a compute node declares.
#[derive(Debug, Copy, Clone)]
pub(crate) enum GroupLayout<'a> {
    Storages(&'a [StorageNode]),
    RenderInfo,
}

/// A dispatchable compute node. Identity is per construction.
#[derive(Debug, Clone)]
pub struct ComputeNode {
    id: NodeId,
    kind: ComputeKind,
}

impl ComputeNode {
    fn new(kind: ComputeKind) -> Self {
        Self { id: NodeId::next(), kind }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &ComputeKind {
        &self.kind
    }

    pub fn storages(&self) -> &[StorageNode] {
        match &self.kind {
            ComputeKind::Fn { node, .. } => &node.storages,
            ComputeKind::Code { node, .. } => &node.storages,
        }
    }

    pub(crate) fn group_count(&self) -> u32 {
        match self.kind {
            ComputeKind::Fn { .. } => 2,
            ComputeKind::Code { .. } => 1,
        }
    }

    pub(crate) fn group(&self, index: u32) -> Option<GroupLayout<'_>> {
        match (index, &self.kind) {
            (0, _) => Some(GroupLayout::Storages(self.storages())),
            (1, ComputeKind::Fn { .. }) => Some(GroupLayout::RenderInfo),
            _ => None,
        }
    }

    /// Workgroup counts given the renderer's default workgroup size.
    pub(crate) fn dispatch(&self, default_workgroup_size: u32) -> [u32; 3] {
        match &self.kind {
            ComputeKind::Fn { node, count } => {
                let size = node.workgroup_size.unwrap_or(default_workgroup_size).max(1);
                [count.div_ceil(size).max(1), 1, 1]
            }
            ComputeKind::Code { dispatch, .. } => *dispatch,
        }
    }

    /// Shader source the node builder produces for this node.
    pub(crate) fn build_shader(&self, default_workgroup_size: u32) -> String {
        match &self.kind {
            ComputeKind::Fn { node, count } => {
                let size = node.workgroup_size.unwrap_or(default_workgroup_size).max(1);
                build_fn_shader(node, *count, size)
            }
            ComputeKind::Code { node, .. } => node.source.clone(),
        }
    }
}

/// Oscillates in `[0, 1]` with period 1; zero at `t = 0`.
const OSC_SINE: &str = "fn osc_sine(t: f32) -> f32 {\n    return sin((t + 0.75) * 6.283185307179586) * 0.5 + 0.5;\n}\n";

pub(crate) const RENDER_INFO_STRUCT: &str =
    "struct RenderInfo {\n    time: f32,\n    delta: f32,\n    frame: u32,\n    _pad: u32,\n}\n";

fn build_fn_shader(node: &FnNode, count: u32, workgroup_size: u32) -> String {
    let mut out = String::new();

    out.push_str(RENDER_INFO_STRUCT);
    out.push('\n');
    for (binding, (name, storage)) in node.names.iter().zip(&node.storages).enumerate() {
        out.push_str(&format!(
            "@group(0) @binding({binding}) var<storage, read_write> {name}_storage: array<{}>;\n",
            storage.attribute().wgsl_element()
        ));
    }
    out.push_str("@group(1) @binding(0) var<uniform> render_info: RenderInfo;\n\n");
    out.push_str(OSC_SINE);
    out.push('\n');

    out.push_str(&format!("@compute @workgroup_size({workgroup_size})\n"));
    out.push_str("fn main(@builtin(global_invocation_id) gid: vec3u) {\n");
    out.push_str("    let instance_index = gid.x;\n");
    out.push_str(&format!("    if (instance_index >= {count}u) {{\n        return;\n    }}\n"));
    out.push_str("    let time = render_info.time;\n");
    out.push_str("    let delta = render_info.delta;\n");
    for name in &node.names {
        out.push_str(&format!("    var {name} = {name}_storage[instance_index];\n"));
    }
    for line in node.body.trim().lines() {
        out.push_str("    ");
        out.push_str(line.trim());
        out.push('\n');
    }
    for name in &node.names {
        out.push_str(&format!("    {name}_storage[instance_index] = {name};\n"));
    }
    out.push_str("}\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StorageAttribute;

    fn validate(source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{e:?}\n{source}"));
    }

    fn position_node() -> StorageNode {
        StorageNode::new(StorageAttribute::new(24, 4))
    }

    // ── fn nodes ────────────────────────────────────────────────────────

    #[test]
    fn fn_shader_validates() {
        let node = FnNode::new()
            .storage("position", &position_node())
            .body("position.y += osc_sine(time * 0.1) * 0.01 - 0.005;")
            .compute(24);
        let src = node.build_shader(64);
        validate(&src);
        assert!(src.contains("@compute @workgroup_size(64)"));
        assert!(src.contains("if (instance_index >= 24u)"));
        assert!(src.contains("var<storage, read_write> position_storage: array<vec4<f32>>"));
    }

    #[test]
    fn fn_dispatch_rounds_up() {
        let node = FnNode::new().storage("p", &position_node()).compute(24);
        assert_eq!(node.dispatch(64), [1, 1, 1]);
        assert_eq!(node.dispatch(8), [3, 1, 1]);
        assert_eq!(node.dispatch(7), [4, 1, 1]);

        let pinned = FnNode::new().workgroup_size(4).compute(24);
        assert_eq!(pinned.dispatch(64), [6, 1, 1]);
    }

    #[test]
    fn fn_nodes_bind_render_info_at_group_one() {
        let node = FnNode::new().storage("p", &position_node()).compute(1);
        assert_eq!(node.group_count(), 2);
        assert!(matches!(node.group(0), Some(GroupLayout::Storages(s)) if s.len() == 1));
        assert!(matches!(node.group(1), Some(GroupLayout::RenderInfo)));
        assert!(node.group(2).is_none());
    }

    #[test]
    fn multiple_storages_get_consecutive_bindings() {
        let node = FnNode::new()
            .storage("a", &position_node())
            .storage("b", &position_node())
            .body("a = a + b;")
            .compute(24);
        let src = node.build_shader(64);
        assert!(src.contains("@group(0) @binding(1) var<storage, read_write> b_storage"));
        validate(&src);
    }

    // ── code nodes ──────────────────────────────────────────────────────

    #[test]
    fn code_node_is_verbatim_with_explicit_dispatch() {
        let src = "@compute @workgroup_size(1) fn main() {}";
        let node = CodeNode::new(src, &[position_node()]).compute([2, 3, 1]);
        assert_eq!(node.build_shader(64), src);
        assert_eq!(node.dispatch(64), [2, 3, 1]);
        assert_eq!(node.group_count(), 1);
        assert!(node.group(1).is_none());
    }

    #[test]
    fn node_ids_are_unique() {
        let a = CodeNode::new("", &[]).compute([1, 1, 1]);
        let b = CodeNode::new("", &[]).compute([1, 1, 1]);
        assert_ne!(a.id(), b.id());
    }
}
