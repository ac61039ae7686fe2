//! The flame session state machine.
//!
//! [`FlameEffect`] owns the level and the shared texture handle across
//! sessions. A session binds one render surface and one frame chain to a
//! container between `init` and `destroy`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::geometry::{Camera, PlaneTransform};
use crate::host::{
    Container, FlameRenderer, FrameRequest, Host, RenderError, SceneDescriptor,
};
use crate::intensity::Intensity;
use crate::texture::{FlameImage, FlameTexture, TextureStatus};
use crate::types::RenderOptions;

/// Animation time added per frame callback. Speed follows the refresh rate.
pub const TIME_STEP: f32 = 0.02;

#[derive(Debug, thiserror::Error)]
pub enum FlameError {
    #[error("container '{id}' not found")]
    ContainerNotFound { id: String },
    #[error("failed to attach render surface to container '{id}'")]
    Surface {
        id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to create flame renderer for container '{id}'")]
    Renderer {
        id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("first flame frame failed in container '{id}'")]
    FirstFrame {
        id: String,
        #[source]
        source: RenderError,
    },
}

/// Tunables fixed for the lifetime of an effect handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectOptions {
    pub time_step: f32,
    pub render: RenderOptions,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            time_step: TIME_STEP,
            render: RenderOptions::default(),
        }
    }
}

/// Result of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Frame drawn (or skipped after a recoverable error); next frame requested.
    Scheduled(FrameRequest),
    /// No session is active; nothing was touched and no frame was requested.
    Stopped,
}

struct ActiveSession<H: Host> {
    container: Container,
    surface: H::Surface,
    renderer: H::Renderer,
    camera: Camera,
    plane: PlaneTransform,
    time: f32,
    pending_frame: Option<FrameRequest>,
    bound_texture: Option<Arc<FlameImage>>,
}

enum SessionState<H: Host> {
    Inactive,
    Active(ActiveSession<H>),
}

/// One flame effect: level, shared texture and the session bound to a container.
///
/// ```text
///   Inactive ──init──▶ Active ──destroy──▶ Inactive
///                        │ ▲
///                        └─┘ tick (time += step, render, request frame)
/// ```
///
/// Every resource of a session lives inside `Active`, so a half-initialised or
/// half-destroyed session cannot be observed.
pub struct FlameEffect<H: Host> {
    intensity: Intensity,
    texture: FlameTexture,
    options: EffectOptions,
    texture_failure_reported: bool,
    state: SessionState<H>,
}

impl<H: Host> FlameEffect<H> {
    pub fn new(texture: FlameTexture, options: EffectOptions) -> Self {
        Self {
            intensity: Intensity::default(),
            texture,
            options,
            texture_failure_reported: false,
            state: SessionState::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Stored level in `[0, 100]`.
    pub fn level(&self) -> f32 {
        self.intensity.level()
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// Animation time of the active session.
    pub fn time(&self) -> Option<f32> {
        match &self.state {
            SessionState::Active(session) => Some(session.time),
            SessionState::Inactive => None,
        }
    }

    pub fn container(&self) -> Option<&Container> {
        match &self.state {
            SessionState::Active(session) => Some(&session.container),
            SessionState::Inactive => None,
        }
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        match &self.state {
            SessionState::Active(session) => session.pending_frame,
            SessionState::Inactive => None,
        }
    }

    /// Starts rendering into the container named `container_id`.
    ///
    /// Does nothing when a session is already active. On error the effect stays
    /// inactive and anything attached along the way has been detached again.
    pub fn init(&mut self, host: &mut H, container_id: &str) -> Result<(), FlameError> {
        if let SessionState::Active(session) = &self.state {
            debug!(
                requested = container_id,
                active = %session.container.id,
                "flame effect already active; ignoring init"
            );
            return Ok(());
        }

        let container =
            host.find_container(container_id)
                .ok_or_else(|| FlameError::ContainerNotFound {
                    id: container_id.to_string(),
                })?;

        let surface = host
            .attach_surface(&container)
            .map_err(|source| FlameError::Surface {
                id: container.id.clone(),
                source,
            })?;

        let camera = Camera::for_container(container.width, container.height);
        let plane = PlaneTransform::for_container(container.width, container.height);
        let scene = SceneDescriptor {
            width: container.width,
            height: container.height,
            camera,
            plane,
            intensity: self.intensity.normalized(),
            options: self.options.render,
        };

        let renderer = match host.create_renderer(&surface, &scene) {
            Ok(renderer) => renderer,
            Err(source) => {
                host.detach_surface(&container, surface);
                return Err(FlameError::Renderer {
                    id: container.id,
                    source,
                });
            }
        };

        info!(
            container = %container.id,
            width = container.width,
            height = container.height,
            level = self.intensity.level(),
            "flame effect initialised"
        );

        self.state = SessionState::Active(ActiveSession {
            container,
            surface,
            renderer,
            camera,
            plane,
            time: 0.0,
            pending_frame: None,
            bound_texture: None,
        });

        // The first frame is drawn right away; it schedules the rest.
        match self.advance(host) {
            Ok(_) => Ok(()),
            Err((id, source)) => Err(FlameError::FirstFrame { id, source }),
        }
    }

    /// Stops the animation and releases every resource of the session.
    /// Safe to call any number of times.
    pub fn destroy(&mut self, host: &mut H) {
        let SessionState::Active(session) =
            std::mem::replace(&mut self.state, SessionState::Inactive)
        else {
            trace!("flame effect not active; nothing to destroy");
            return;
        };

        let ActiveSession {
            container,
            surface,
            mut renderer,
            pending_frame,
            ..
        } = session;

        if let Some(request) = pending_frame {
            host.cancel_frame(request);
        }
        if let Err(err) = renderer.clear() {
            debug!(error = %err, "could not blank flame surface before release");
        }
        renderer.dispose();
        host.detach_surface(&container, surface);
        debug!(container = %container.id, "flame effect destroyed");
    }

    /// Clamps `level` to `[0, 100]` and applies it. Takes effect immediately on
    /// an active session and becomes the starting level of the next `init`.
    pub fn change_level(&mut self, level: f32) {
        let Some(intensity) = Intensity::new(level) else {
            warn!("ignoring NaN flame level");
            return;
        };
        self.intensity = intensity;
        if let SessionState::Active(session) = &mut self.state {
            session.renderer.set_intensity(intensity.normalized());
        }
        trace!(level = intensity.level(), "flame level changed");
    }

    /// Animation driver, invoked when a requested frame fires.
    pub fn tick(&mut self, host: &mut H) -> TickOutcome {
        self.advance(host).unwrap_or(TickOutcome::Stopped)
    }

    /// One frame. A fatal render error has already torn the session down when
    /// it is returned, together with the container id.
    fn advance(&mut self, host: &mut H) -> Result<TickOutcome, (String, RenderError)> {
        let SessionState::Active(session) = &mut self.state else {
            trace!("frame fired after destroy; stopping");
            return Ok(TickOutcome::Stopped);
        };

        session.pending_frame = None;
        session.time += self.options.time_step;
        session.renderer.set_time(session.time);
        sync_texture(
            session,
            &self.texture,
            &mut self.texture_failure_reported,
        );

        if let Err(err) = session.renderer.render() {
            if !err.is_recoverable() {
                let id = session.container.id.clone();
                error!(error = %err, container = %id, "flame render failed; tearing down");
                self.destroy(host);
                return Err((id, err));
            }
            if matches!(err, RenderError::SurfaceLost) {
                session.renderer.recover();
            }
            debug!(error = %err, "skipping flame frame");
        }

        let request = host.request_frame(&session.container);
        session.pending_frame = Some(request);
        Ok(TickOutcome::Scheduled(request))
    }

    /// Follows a container size change. Zero-sized updates are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let SessionState::Active(session) = &mut self.state {
            if session.container.width == width && session.container.height == height {
                return;
            }
            session.container.width = width;
            session.container.height = height;
            session.camera = Camera::for_container(width, height);
            session.plane = PlaneTransform::for_container(width, height);
            session
                .renderer
                .resize(width, height, &session.camera, &session.plane);
            debug!(width, height, "flame effect resized");
        }
    }
}

fn sync_texture<H: Host>(
    session: &mut ActiveSession<H>,
    texture: &FlameTexture,
    failure_reported: &mut bool,
) {
    match texture.poll() {
        TextureStatus::Ready(image) => {
            let fresh = session
                .bound_texture
                .as_ref()
                .is_none_or(|bound| !Arc::ptr_eq(bound, &image));
            if fresh {
                session.renderer.bind_texture(&image);
                debug!(
                    width = image.width,
                    height = image.height,
                    "flame texture bound"
                );
                session.bound_texture = Some(image);
            }
        }
        TextureStatus::Pending => {}
        TextureStatus::Failed(reason) => {
            if !*failure_reported {
                warn!(%reason, "flame texture unavailable; rendering untextured");
                *failure_reported = true;
            }
        }
    }
}

impl<H: Host> fmt::Debug for FlameEffect<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlameEffect")
            .field("level", &self.intensity.level())
            .field("active", &self.is_active())
            .field("container", &self.container().map(|c| c.id.as_str()))
            .field("time", &self.time())
            .finish()
    }
}
