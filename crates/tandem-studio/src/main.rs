use anyhow::Context;
use tandem_engine::core::{App, AppControl, FrameCtx};
use tandem_engine::device::GpuInit;
use tandem_engine::logging::{LoggingConfig, init_logging};
use tandem_engine::window::{Runtime, RuntimeConfig};
use tandem_studio::{CubeDemo, DemoConfig};
use winit::event::WindowEvent;

/// Builds the demo on the first frame, once a device exists.
struct Studio {
    config: DemoConfig,
    demo: Option<CubeDemo>,
    resized: bool,
}

impl Studio {
    fn new(config: DemoConfig) -> Self {
        Self { config, demo: None, resized: true }
    }
}

impl App for Studio {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if matches!(event, WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }) {
            self.resized = true;
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.demo.is_none() {
            let device = ctx.gpu.device().clone();
            let queue = ctx.gpu.queue().clone();
            match CubeDemo::new(device, queue, &self.config).context("setting up the cube demo") {
                Ok(demo) => self.demo = Some(demo),
                Err(err) => {
                    log::error!("{err:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(demo) = self.demo.as_mut() else {
            return AppControl::Exit;
        };

        if std::mem::take(&mut self.resized) {
            let (width, height) = ctx.window.physical_size();
            let (_, logical_height) = ctx.window.logical_size();
            demo.resize(width, height, logical_height);
        }

        demo.handle_input(ctx.input_frame, ctx.input);

        let time = ctx.time;
        ctx.render(|target| match demo.frame(&time, target) {
            Ok(()) => AppControl::Continue,
            Err(err) => {
                log::error!("{err:#}");
                AppControl::Exit
            }
        })
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "tandem: typed compute on a shared vertex buffer".to_string(),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, GpuInit::default(), Studio::new(DemoConfig::default()))
}
