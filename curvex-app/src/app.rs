use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use curvex_core::{Button, ButtonSet, EdgeDetector};
use curvex_experiment::{
    DriversBuilder, ExperimentConfig, ExperimentController, ExperimentEvent, TrialSet,
};
use curvex_render::{Scene, SkiaRenderer};
use curvex_timing::{FramePacer, HighPrecisionTimer, Timer};
use log::{debug, error, info, trace, warn};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::collections::HashSet;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

fn button_for(key: KeyCode) -> Option<Button> {
    match key {
        KeyCode::KeyA | KeyCode::Space => Some(Button::Confirm),
        KeyCode::KeyX => Some(Button::ChoiceX),
        KeyCode::KeyY => Some(Button::ChoiceY),
        KeyCode::Escape => Some(Button::Abort),
        _ => None,
    }
}

fn axis(held: &HashSet<KeyCode>, plus: KeyCode, minus: KeyCode) -> f32 {
    held.contains(&plus) as i32 as f32 - held.contains(&minus) as i32 as f32
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    controller: ExperimentController<HighPrecisionTimer, ThreadRng>,
    scene: Scene,
    renderer: Option<SkiaRenderer>,
    font: Option<FontVec>,
    pacing: HighPrecisionTimer,
    /// Requested frame rate; the monitor's refresh rate when unset.
    frame_rate: Option<f64>,
    pacer: Option<FramePacer>,
    held: HashSet<KeyCode>,
    edges: EdgeDetector,
    last_frame: Option<u64>,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    should_exit: bool,
}

impl App {
    pub fn new(
        config: ExperimentConfig,
        trials: TrialSet,
        font: Option<FontVec>,
        frame_rate: Option<f64>,
    ) -> Result<Self> {
        let scene = Scene::new();
        let drivers = DriversBuilder::new()
            .reference(scene.reference())
            .dashed(scene.dashed())
            .arrow(scene.arrow())
            .preview(scene.preview())
            .demo(scene.demo())
            .text(scene.text())
            .build()?;
        let timer = HighPrecisionTimer::new();
        let controller = ExperimentController::new(config, trials, drivers, timer, rand::rng())?;

        Ok(Self {
            window: None,
            pixels: None,
            controller,
            scene,
            renderer: None,
            font,
            pacing: HighPrecisionTimer::new(),
            frame_rate,
            pacer: None,
            held: HashSet::new(),
            edges: EdgeDetector::new(),
            last_frame: None,
            scale_factor: 1.0,
            refresh_rate: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            "platform {} / {}; A or Space confirms, X and Y answer, Escape aborts",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Curvex")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        info!(
            "display {}x{} at scale {:.2}{}",
            physical_size.width,
            physical_size.height,
            self.scale_factor,
            self.refresh_rate
                .map(|hz| format!(", {:.1} Hz", hz))
                .unwrap_or_default()
        );

        // Frames are paced by the high-precision timer when a rate is known,
        // otherwise by vsync.
        self.pacer = self.frame_rate.or(self.refresh_rate).and_then(FramePacer::from_hz);
        match &self.pacer {
            Some(pacer) => info!(
                "pacing frames every {:.3}ms",
                pacer.interval().as_secs_f64() * 1e3
            ),
            None => info!("no frame rate known; pacing frames by vsync"),
        }

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(
            PixelsBuilder::new(physical_size.width, physical_size.height, surface_texture)
                .enable_vsync(self.pacer.is_none())
                .build()?,
        );
        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            self.font.take(),
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    /// One scheduler tick followed by one rendered frame.
    fn frame(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let now = self.pacing.now();
        let dt = self
            .last_frame
            .map(|prev| now.saturating_sub(prev) as f32 / 1e9)
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        let held: ButtonSet = self.held.iter().filter_map(|k| button_for(*k)).collect();
        let pressed = self.edges.update(held);
        if pressed.contains(Button::Abort) {
            if !self.controller.is_finished() {
                warn!("session aborted by the operator; no data written");
            }
            self.cleanup_and_exit(event_loop);
            return Ok(());
        }

        let a_axis = axis(&self.held, KeyCode::ArrowUp, KeyCode::ArrowDown);
        let multiplier_axis = axis(&self.held, KeyCode::KeyW, KeyCode::KeyS);
        self.scene
            .state_mut()
            .adjust_preview(a_axis, multiplier_axis, dt);

        let was_finished = self.controller.is_finished();
        for event in self.controller.tick(pressed) {
            match event {
                ExperimentEvent::DataSaved(path) => info!("results in {}", path.display()),
                ExperimentEvent::SaveFailed(reason) => error!("results were not saved: {}", reason),
                other => debug!("{:?}", other),
            }
        }
        self.scene.state_mut().advance(dt);

        self.render()?;
        if let Some(pacer) = self.pacer.as_mut() {
            pacer.wait(&self.pacing);
        }

        if was_finished && pressed.contains(Button::Confirm) {
            self.cleanup_and_exit(event_loop);
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let stats = renderer.render_frame(&self.scene.state(), pixels.frame_mut(), &mut self.pacing)?;
        pixels.render().context("presenting frame")?;
        trace!(
            "clear {:.3}ms, draw {:.3}ms, copy {:.3}ms, total {:.3}ms",
            stats.clear.as_secs_f64() * 1e3,
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3,
        );
        Ok(())
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        if repeat {
            return;
        }
        match state {
            ElementState::Pressed => {
                self.held.insert(code);
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!("Failed to resize canvas: {}", e);
            }
        }
        info!(
            "Display resized to: {}x{} (scale {:.2})",
            new_size.width, new_size.height, self.scale_factor
        );
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }

        let stats = self.pacing.pacing_stats();
        info!(
            "{} frames, mean render {:.3}ms, jitter {:.3}ms, max {:.3}ms",
            stats.frames,
            stats.average_frame_time_ns / 1e6,
            stats.jitter_ns / 1e6,
            stats.max_frame_time_ns / 1e6,
        );
        if let Some(pacer) = &self.pacer {
            info!("{} frames overran their slot", pacer.missed());
        }
        if self.controller.is_finished() {
            info!("Experiment completed with {} trials", self.controller.outcomes().len());
        }

        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("Failed to create window and surface: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame(event_loop) {
                    error!("frame failed: {:#}", e);
                    self.cleanup_and_exit(event_loop);
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event.physical_key, event.state, event.repeat);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_onto_logical_buttons() {
        assert_eq!(button_for(KeyCode::Space), Some(Button::Confirm));
        assert_eq!(button_for(KeyCode::KeyA), Some(Button::Confirm));
        assert_eq!(button_for(KeyCode::KeyX), Some(Button::ChoiceX));
        assert_eq!(button_for(KeyCode::KeyY), Some(Button::ChoiceY));
        assert_eq!(button_for(KeyCode::Escape), Some(Button::Abort));
        assert_eq!(button_for(KeyCode::KeyQ), None);
    }

    #[test]
    fn opposing_keys_cancel_on_an_axis() {
        let mut held = HashSet::new();
        held.insert(KeyCode::ArrowUp);
        assert_eq!(axis(&held, KeyCode::ArrowUp, KeyCode::ArrowDown), 1.0);
        held.insert(KeyCode::ArrowDown);
        assert_eq!(axis(&held, KeyCode::ArrowUp, KeyCode::ArrowDown), 0.0);
        held.remove(&KeyCode::ArrowUp);
        assert_eq!(axis(&held, KeyCode::ArrowUp, KeyCode::ArrowDown), -1.0);
    }
}
