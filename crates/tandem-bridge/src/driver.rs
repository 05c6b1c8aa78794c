use tandem_engine::render::{ComputeNode, EngineError, RenderTarget, Renderer};
use tandem_engine::time::FrameTime;

use crate::counter::FrameCounter;
use crate::inject::DispatchHandle;
use crate::BridgeError;

/// What the driver calls around the compute dispatches.
pub trait FrameStage {
    /// Camera and controls. Runs before any GPU work for the frame.
    fn update(&mut self, time: &FrameTime);

    /// Draw. Runs after this frame's compute work has completed.
    fn render(&mut self, renderer: &mut Renderer, target: &mut RenderTarget<'_>) -> Result<(), EngineError>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    /// No tick has run yet.
    Idle,
    Running,
}

/// Per-frame sequencing of the compute programs and the draw.
pub struct FrameDriver {
    state: DriverState,
    counter: FrameCounter,
    native: Vec<ComputeNode>,
    injected: Vec<DispatchHandle>,
}

impl FrameDriver {
    pub fn new(counter: FrameCounter) -> Self {
        Self {
            state: DriverState::Idle,
            counter,
            native: Vec::new(),
            injected: Vec::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn counter(&self) -> &FrameCounter {
        &self.counter
    }

    /// Renderer-native nodes run first, in the order added.
    pub fn add_native(&mut self, node: ComputeNode) {
        self.native.push(node);
    }

    /// Injected programs run after the native nodes, in the order added.
    pub fn add_injected(&mut self, handle: DispatchHandle) {
        self.injected.push(handle);
    }

    /// Runs one frame: update, clock, counter, native dispatches, injected
    /// dispatches, wait, render.
    pub fn tick(
        &mut self,
        renderer: &mut Renderer,
        stage: &mut impl FrameStage,
        time: &FrameTime,
        target: &mut RenderTarget<'_>,
    ) -> Result<(), BridgeError> {
        self.compute(renderer, stage, time)?;
        stage.render(renderer, target).map_err(dispatch_failure)
    }

    /// Everything in [`tick`](Self::tick) except the render stage.
    pub fn compute(
        &mut self,
        renderer: &mut Renderer,
        stage: &mut impl FrameStage,
        time: &FrameTime,
    ) -> Result<(), BridgeError> {
        if self.state == DriverState::Idle {
            log::debug!(
                "frame driver starting: {} native, {} injected",
                self.native.len(),
                self.injected.len()
            );
            self.state = DriverState::Running;
        }

        stage.update(time);
        renderer.advance(time);
        self.counter.tick()?;

        for node in &self.native {
            renderer.compute(node).map_err(dispatch_failure)?;
        }
        for handle in &self.injected {
            renderer.compute(handle.node()).map_err(dispatch_failure)?;
        }

        renderer.wait_for_submitted_work().map_err(submission_failure)
    }
}

fn submission_failure(err: EngineError) -> BridgeError {
    BridgeError::GpuSubmissionFailure(err.to_string())
}

/// Device-side failures become [`BridgeError::GpuSubmissionFailure`]; cache
/// misses keep their renderer error.
fn dispatch_failure(err: EngineError) -> BridgeError {
    if err.is_device_failure() {
        submission_failure(err)
    } else {
        BridgeError::Renderer(err)
    }
}
