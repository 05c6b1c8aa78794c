//! Compute entry functions.

use std::fmt;

/// Compute-stage built-in inputs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Builtin {
    GlobalInvocationId,
    LocalInvocationId,
    LocalInvocationIndex,
    WorkgroupId,
    NumWorkgroups,
}

impl Builtin {
    pub const fn wgsl(self) -> &'static str {
        match self {
            Builtin::GlobalInvocationId => "global_invocation_id",
            Builtin::LocalInvocationId => "local_invocation_id",
            Builtin::LocalInvocationIndex => "local_invocation_index",
            Builtin::WorkgroupId => "workgroup_id",
            Builtin::NumWorkgroups => "num_workgroups",
        }
    }

    /// WGSL type of the built-in value.
    pub const fn ty(self) -> &'static str {
        match self {
            Builtin::LocalInvocationIndex => "u32",
            _ => "vec3u",
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl())
    }
}

/// A compute entry point: name, workgroup size, built-in inputs and a WGSL body.
///
/// The body refers to bind-group entries by their layout names; [`crate::resolve`]
/// supplies the declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeFn {
    name: String,
    workgroup_size: Option<[u32; 3]>,
    inputs: Vec<(String, Builtin)>,
    body: String,
}

impl ComputeFn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workgroup_size: None,
            inputs: Vec::new(),
            body: String::new(),
        }
    }

    /// Sets the workgroup size. Missing trailing dimensions default to 1.
    pub fn workgroup_size(mut self, size: &[u32]) -> Self {
        let mut full = [1; 3];
        for (dst, src) in full.iter_mut().zip(size) {
            *dst = *src;
        }
        self.workgroup_size = Some(full);
        self
    }

    /// Declares a built-in parameter bound to `name`.
    pub fn builtin(mut self, name: impl Into<String>, builtin: Builtin) -> Self {
        self.inputs.push((name.into(), builtin));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Option<[u32; 3]> {
        self.workgroup_size
    }

    pub fn inputs(&self) -> &[(String, Builtin)] {
        &self.inputs
    }

    pub fn source_body(&self) -> &str {
        &self.body
    }
}
