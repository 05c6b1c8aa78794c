//! Bridges `tandem-gpu` and `tandem-engine`.
//!
//! A typed buffer can be aliased as a renderer storage attribute, and a
//! compiled compute program can be installed in the renderer's caches so the
//! renderer's own `compute` call runs it. [`FrameDriver`] sequences both kinds
//! of dispatch with the draw.

mod alias;
mod counter;
mod driver;
mod error;
mod inject;

use std::ops::RangeInclusive;

use tandem_engine::render::{CacheKey, ExternalHooks};

pub use alias::AliasedStorage;
pub use counter::FrameCounter;
pub use driver::{DriverState, FrameDriver, FrameStage};
pub use error::BridgeError;
pub use inject::DispatchHandle;

/// Renderer hook versions this crate can drive.
pub const SUPPORTED_HOOKS: RangeInclusive<u32> = 1..=1;

/// Entry point for aliasing and injection against one renderer.
#[derive(Debug)]
pub struct Bridge {
    injected: Vec<CacheKey>,
}

impl Bridge {
    /// Checks that `renderer` speaks a supported hooks version.
    pub fn new(renderer: &impl ExternalHooks) -> Result<Self, BridgeError> {
        let found = renderer.hooks_version();
        check_hooks_version(found)?;
        log::debug!("bridge attached to renderer hooks v{found}");
        Ok(Self { injected: Vec::new() })
    }

    /// Cache keys of the programs injected so far, in order.
    pub fn injected(&self) -> &[CacheKey] {
        &self.injected
    }
}

fn check_hooks_version(found: u32) -> Result<(), BridgeError> {
    if SUPPORTED_HOOKS.contains(&found) {
        return Ok(());
    }
    Err(BridgeError::IncompatibleRendererVersion {
        found,
        supported: format!("{}..={}", SUPPORTED_HOOKS.start(), SUPPORTED_HOOKS.end()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_engine::render::HOOKS_VERSION;

    #[test]
    fn current_renderer_is_supported() {
        assert!(check_hooks_version(HOOKS_VERSION).is_ok());
    }

    #[test]
    fn other_versions_are_rejected() {
        for found in [0, 2, u32::MAX] {
            let err = check_hooks_version(found).unwrap_err();
            assert!(matches!(err, BridgeError::IncompatibleRendererVersion { found: f, .. } if f == found));
        }
        assert_eq!(
            check_hooks_version(2).unwrap_err().to_string(),
            "renderer hooks version 2 is not supported (supported: 1..=1)"
        );
    }
}
