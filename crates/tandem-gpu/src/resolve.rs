use crate::compute::ComputeFn;
use crate::layout::BindGroupLayout;
use crate::TypedError;

/// Produces a complete WGSL module for `function`.
///
/// `layouts[i]` is declared at `@group(i)`. The output is deterministic: the same
/// function and layouts always yield the same text, which downstream caches key on.
pub fn resolve(function: &ComputeFn, layouts: &[&BindGroupLayout]) -> Result<String, TypedError> {
    let [x, y, z] = function.size().ok_or_else(|| TypedError::MissingWorkgroupSize {
        function: function.name().to_string(),
    })?;

    let mut out = String::new();
    if layouts.iter().any(|l| l.uses_f16()) {
        out.push_str("enable f16;\n\n");
    }

    for (group, layout) in layouts.iter().enumerate() {
        out.push_str(&layout.declarations(group as u32));
    }
    if !layouts.is_empty() {
        out.push('\n');
    }

    let params = function
        .inputs()
        .iter()
        .map(|(name, b)| format!("@builtin({}) {name}: {}", b.wgsl(), b.ty()))
        .collect::<Vec<_>>()
        .join(", ");

    out.push_str(&format!(
        "@compute @workgroup_size({x}, {y}, {z})\nfn {}({params}) {{\n",
        function.name()
    ));
    for line in function.source_body().trim().lines() {
        out.push_str("    ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str("}\n");

    Ok(out)
}
