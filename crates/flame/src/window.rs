use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder, WindowId};

use crate::config::FlameConfig;
use crate::effect::{FlameEffect, TickOutcome};
use crate::gpu::GpuRenderer;
use crate::host::{Container, FrameRequest, Host, SceneDescriptor};
use crate::intensity::MAX_LEVEL;
use crate::texture::FlameTexture;
use crate::types::SurfaceAlpha;

const WINDOW_TITLE: &str = "Flame";

/// [`Host`] backed by winit windows; each registered window is one container.
#[derive(Default)]
pub struct WindowHost {
    containers: HashMap<String, Arc<Window>>,
    pending: HashMap<WindowId, FrameRequest>,
    next_request: u64,
}

impl WindowHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, window: Arc<Window>) {
        let id = id.into();
        debug!(container = %id, "registered window container");
        self.containers.insert(id, window);
    }

    /// Claims the frame request tied to a redraw of `window`, if one is live.
    /// Redraws without a live request (expose events, cancelled frames) yield `None`.
    pub fn take_fired(&mut self, window: WindowId) -> Option<FrameRequest> {
        self.pending.remove(&window)
    }

    fn window(&self, container: &Container) -> Result<&Arc<Window>> {
        self.containers
            .get(&container.id)
            .ok_or_else(|| anyhow!("container '{}' is not a registered window", container.id))
    }
}

impl Host for WindowHost {
    type Surface = Arc<Window>;
    type Renderer = GpuRenderer;

    fn find_container(&self, id: &str) -> Option<Container> {
        self.containers.get(id).map(|window| {
            let size = window.inner_size();
            Container {
                id: id.to_string(),
                width: size.width,
                height: size.height,
            }
        })
    }

    fn attach_surface(&mut self, container: &Container) -> Result<Arc<Window>> {
        let window = self.window(container)?.clone();
        window.set_title(WINDOW_TITLE);
        Ok(window)
    }

    fn detach_surface(&mut self, container: &Container, surface: Arc<Window>) {
        surface.set_title(&format!("{WINDOW_TITLE} (stopped)"));
        debug!(container = %container.id, "detached flame surface");
    }

    fn create_renderer(
        &mut self,
        surface: &Arc<Window>,
        scene: &SceneDescriptor,
    ) -> Result<GpuRenderer> {
        GpuRenderer::new(surface.clone(), scene)
    }

    fn request_frame(&mut self, container: &Container) -> FrameRequest {
        self.next_request += 1;
        let request = FrameRequest(self.next_request);
        if let Some(window) = self.containers.get(&container.id) {
            self.pending.insert(window.id(), request);
            window.request_redraw();
        }
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.retain(|_, pending| *pending != request);
    }
}

/// Keyboard action in the preview window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewCommand {
    SetLevel(f32),
    Raise,
    Lower,
    ToggleSession,
    Quit,
}

impl PreviewCommand {
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Named(NamedKey::ArrowUp) => Some(Self::Raise),
            Key::Named(NamedKey::ArrowDown) => Some(Self::Lower),
            Key::Named(NamedKey::Escape) => Some(Self::Quit),
            Key::Character(text) => {
                let mut chars = text.chars();
                let (Some(ch), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                match ch {
                    'd' | 'D' => Some(Self::ToggleSession),
                    'q' | 'Q' => Some(Self::Quit),
                    '+' | '=' => Some(Self::Raise),
                    '-' => Some(Self::Lower),
                    digit => digit
                        .to_digit(10)
                        .map(|value| Self::SetLevel(value as f32 * MAX_LEVEL / 10.0)),
                }
            }
            _ => None,
        }
    }
}

/// Opens a window registered as `config.container` and animates the flame in it
/// until the window closes.
pub fn run_preview(config: &FlameConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .with_transparent(config.surface_alpha == SurfaceAlpha::Transparent)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);
    let window_id = window.id();

    let mut host = WindowHost::new();
    host.register(config.container.clone(), window);

    let texture = FlameTexture::load(&config.texture, config.texture_timeout);
    let mut effect = FlameEffect::new(texture, config.effect_options());
    effect.change_level(config.level);
    effect
        .init(&mut host, &config.container)
        .context("failed to start flame effect")?;

    let container = config.container.clone();
    let level_step = config.level_step;
    info!(
        container = %container,
        level = effect.level(),
        "flame preview running; arrows adjust level, 0-9 set it, D toggles, Esc quits"
    );

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);
            match event {
                Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        effect.destroy(&mut host);
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                logical_key,
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        let Some(command) = PreviewCommand::from_key(&logical_key) else {
                            return;
                        };
                        match command {
                            PreviewCommand::Raise => effect.change_level(effect.level() + level_step),
                            PreviewCommand::Lower => effect.change_level(effect.level() - level_step),
                            PreviewCommand::SetLevel(level) => effect.change_level(level),
                            PreviewCommand::ToggleSession if effect.is_active() => {
                                effect.destroy(&mut host);
                                info!("flame stopped");
                            }
                            PreviewCommand::ToggleSession => {
                                if let Err(err) = effect.init(&mut host, &container) {
                                    error!("failed to restart flame: {err:#}");
                                }
                            }
                            PreviewCommand::Quit => {
                                effect.destroy(&mut host);
                                elwt.exit();
                            }
                        }
                        debug!(level = effect.level(), active = effect.is_active(), "preview input");
                    }
                    WindowEvent::Resized(size) => {
                        effect.resize(size.width, size.height);
                    }
                    WindowEvent::RedrawRequested => {
                        if host.take_fired(window_id).is_some()
                            && effect.tick(&mut host) == TickOutcome::Stopped
                        {
                            warn!("flame animation stopped");
                        }
                    }
                    _ => {}
                },
                Event::LoopExiting => {
                    effect.destroy(&mut host);
                }
                _ => {}
            }
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(text: &str) -> Key {
        Key::Character(text.into())
    }

    #[test]
    fn digits_map_to_tenths_of_range() {
        assert_eq!(
            PreviewCommand::from_key(&character("0")),
            Some(PreviewCommand::SetLevel(0.0))
        );
        assert_eq!(
            PreviewCommand::from_key(&character("7")),
            Some(PreviewCommand::SetLevel(70.0))
        );
        assert_eq!(
            PreviewCommand::from_key(&character("9")),
            Some(PreviewCommand::SetLevel(90.0))
        );
    }

    #[test]
    fn named_keys_drive_level_and_lifecycle() {
        assert_eq!(
            PreviewCommand::from_key(&Key::Named(NamedKey::ArrowUp)),
            Some(PreviewCommand::Raise)
        );
        assert_eq!(
            PreviewCommand::from_key(&Key::Named(NamedKey::ArrowDown)),
            Some(PreviewCommand::Lower)
        );
        assert_eq!(
            PreviewCommand::from_key(&Key::Named(NamedKey::Escape)),
            Some(PreviewCommand::Quit)
        );
        assert_eq!(
            PreviewCommand::from_key(&character("D")),
            Some(PreviewCommand::ToggleSession)
        );
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        assert_eq!(PreviewCommand::from_key(&character("x")), None);
        assert_eq!(PreviewCommand::from_key(&character("12")), None);
        assert_eq!(PreviewCommand::from_key(&Key::Named(NamedKey::Space)), None);
    }
}
