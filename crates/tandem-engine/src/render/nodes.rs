use std::collections::HashMap;
use std::fmt;

use super::node::{ComputeNode, NodeId};

/// Identity of one bind group of one compute node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BindGroupId {
    pub node: NodeId,
    pub group: u32,
}

impl fmt::Display for BindGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/group({})", self.node, self.group)
    }
}

/// Per-dispatch bookkeeping the renderer keeps for a compute node.
#[derive(Debug, Clone)]
pub struct ComputeNodeData {
    /// Shader source the dispatch compiles. Generated on first use and
    /// replaceable before the first dispatch.
    pub compute_shader: String,

    /// Workgroup counts per dimension.
    pub dispatch: [u32; 3],

    pub(crate) bindings: Vec<BindGroupId>,
}

impl ComputeNodeData {
    pub fn bindings(&self) -> &[BindGroupId] {
        &self.bindings
    }
}

/// Node builder output keyed by node identity.
#[derive(Debug, Default)]
pub(crate) struct Nodes {
    compute: HashMap<NodeId, ComputeNodeData>,
}

impl Nodes {
    /// Returns the node's data, building its shader on first request.
    pub(crate) fn get_for_compute(
        &mut self,
        node: &ComputeNode,
        default_workgroup_size: u32,
    ) -> &mut ComputeNodeData {
        self.compute.entry(node.id()).or_insert_with(|| {
            log::debug!("building compute shader for {}", node.id());
            ComputeNodeData {
                compute_shader: node.build_shader(default_workgroup_size),
                dispatch: node.dispatch(default_workgroup_size),
                bindings: (0..node.group_count())
                    .map(|group| BindGroupId { node: node.id(), group })
                    .collect(),
            }
        })
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&ComputeNodeData> {
        self.compute.get(&id)
    }
}
