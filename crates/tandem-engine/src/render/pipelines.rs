use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};

/// Key of a cached compute pipeline: SHA-256 over the shader source and the
/// dispatch shape. Two nodes with identical source and shape share a record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn for_compute(source: &str, dispatch: [u32; 3]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"compute\0");
        hasher.update(source.as_bytes());
        for d in dispatch {
            hasher.update(d.to_le_bytes());
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Cache entry for a compute pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputePipelineRecord {
    pub cache_key: CacheKey,
    /// Source of the program the pipeline was built from.
    pub program_source: String,
    /// Dispatches executed through this record.
    pub used_times: u64,
}

impl ComputePipelineRecord {
    pub fn new(cache_key: CacheKey, program_source: impl Into<String>) -> Self {
        Self {
            cache_key,
            program_source: program_source.into(),
            used_times: 0,
        }
    }
}

/// Program and pipeline-record caches.
#[derive(Debug, Default)]
pub(crate) struct Pipelines {
    programs: HashMap<String, wgpu::ShaderModule>,
    caches: HashMap<CacheKey, ComputePipelineRecord>,
}

impl Pipelines {
    /// Returns the module for `source`, compiling it on first use.
    pub(crate) fn program(&mut self, device: &wgpu::Device, source: &str) -> wgpu::ShaderModule {
        if let Some(module) = self.programs.get(source) {
            return module.clone();
        }

        log::debug!("compiling compute program ({} bytes)", source.len());
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tandem compute program"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        self.programs.insert(source.to_string(), module.clone());
        module
    }

    pub(crate) fn register_program(&mut self, source: &str, module: wgpu::ShaderModule) {
        self.programs.insert(source.to_string(), module);
    }

    pub(crate) fn record(&self, key: &CacheKey) -> Option<&ComputePipelineRecord> {
        self.caches.get(key)
    }

    pub(crate) fn record_mut(&mut self, key: &CacheKey) -> Option<&mut ComputePipelineRecord> {
        self.caches.get_mut(key)
    }

    pub(crate) fn insert_record(&mut self, record: ComputePipelineRecord) {
        self.caches.insert(record.cache_key, record);
    }

    pub(crate) fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub(crate) fn record_count(&self) -> usize {
        self.caches.len()
    }
}
