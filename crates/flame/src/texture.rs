use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError};
use image::imageops::flip_vertical_in_place;

/// Relative path of the flame appearance image.
pub const DEFAULT_TEXTURE_PATH: &str = "flame-appearance.png";

/// Decoded RGBA8 flame image, rows flipped so row 0 is the bottom of the picture.
pub struct FlameImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl FlameImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            anyhow::bail!(
                "flame image of {width}x{height} needs {expected} bytes, got {}",
                rgba.len()
            );
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }
}

impl fmt::Debug for FlameImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlameImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Opens and decodes the flame image from disk.
pub fn decode_flame_image(path: &Path) -> Result<FlameImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to open flame texture at {}", path.display()))?;
    let mut rgba = image.to_rgba8();
    flip_vertical_in_place(&mut rgba);
    let (width, height) = rgba.dimensions();
    FlameImage::from_rgba(width, height, rgba.into_raw())
}

/// Observable state of a texture load.
#[derive(Debug, Clone)]
pub enum TextureStatus {
    Pending,
    Ready(Arc<FlameImage>),
    Failed(Arc<str>),
}

enum LoadState {
    Pending {
        receiver: Receiver<Result<FlameImage>>,
        deadline: Option<Instant>,
    },
    Ready(Arc<FlameImage>),
    Failed(Arc<str>),
}

/// Shared handle to a one-shot background texture load.
///
/// Clones observe the same load; the image is decoded once no matter how many
/// effects poll it.
#[derive(Clone)]
pub struct FlameTexture {
    state: Arc<Mutex<LoadState>>,
}

impl FlameTexture {
    /// Starts decoding `path` on a worker thread. With a `timeout`, a load
    /// still pending past the deadline is reported as failed.
    pub fn load(path: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        let path = path.into();
        let (sender, receiver) = bounded(1);
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name("flame-texture".into())
            .spawn(move || {
                let result = decode_flame_image(&worker_path);
                let _ = sender.send(result);
            });

        let state = match spawned {
            Ok(_) => {
                tracing::debug!(path = %path.display(), ?timeout, "flame texture load started");
                LoadState::Pending { receiver, deadline }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to spawn flame texture loader");
                LoadState::Failed(format!("failed to spawn loader: {err}").into())
            }
        };
        Self::from_state(state)
    }

    /// Handle that is ready immediately with an already decoded image.
    pub fn ready(image: FlameImage) -> Self {
        Self::from_state(LoadState::Ready(Arc::new(image)))
    }

    /// Handle whose load has already failed; effects render untextured.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::from_state(LoadState::Failed(reason.into().into()))
    }

    fn from_state(state: LoadState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn poll(&self) -> TextureStatus {
        self.poll_at(Instant::now())
    }

    /// Non-blocking status check; resolves the pending load if the worker has
    /// finished or the deadline passed at `now`.
    pub fn poll_at(&self, now: Instant) -> TextureStatus {
        let mut state = self.lock();
        let next = match &*state {
            LoadState::Ready(image) => return TextureStatus::Ready(image.clone()),
            LoadState::Failed(reason) => return TextureStatus::Failed(reason.clone()),
            LoadState::Pending { receiver, deadline } => match receiver.try_recv() {
                Ok(result) => settle(result),
                Err(TryRecvError::Empty) => match deadline {
                    Some(deadline) if now >= *deadline => {
                        LoadState::Failed("texture load timed out".into())
                    }
                    _ => return TextureStatus::Pending,
                },
                Err(TryRecvError::Disconnected) => {
                    LoadState::Failed("texture loader exited without a result".into())
                }
            },
        };
        *state = next;
        status_of(&state)
    }

    /// Blocks up to `limit` for the load to settle.
    pub fn wait(&self, limit: Duration) -> TextureStatus {
        let mut state = self.lock();
        let next = match &*state {
            LoadState::Ready(image) => return TextureStatus::Ready(image.clone()),
            LoadState::Failed(reason) => return TextureStatus::Failed(reason.clone()),
            LoadState::Pending { receiver, .. } => match receiver.recv_timeout(limit) {
                Ok(result) => settle(result),
                Err(RecvTimeoutError::Timeout) => return TextureStatus::Pending,
                Err(RecvTimeoutError::Disconnected) => {
                    LoadState::Failed("texture loader exited without a result".into())
                }
            },
        };
        *state = next;
        status_of(&state)
    }

    fn lock(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FlameTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &*self.lock() {
            LoadState::Pending { .. } => "pending",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        };
        f.debug_struct("FlameTexture").field("state", &label).finish()
    }
}

fn settle(result: Result<FlameImage>) -> LoadState {
    match result {
        Ok(image) => {
            tracing::debug!(
                width = image.width,
                height = image.height,
                "flame texture decoded"
            );
            LoadState::Ready(Arc::new(image))
        }
        Err(err) => LoadState::Failed(format!("{err:#}").into()),
    }
}

fn status_of(state: &LoadState) -> TextureStatus {
    match state {
        LoadState::Pending { .. } => TextureStatus::Pending,
        LoadState::Ready(image) => TextureStatus::Ready(image.clone()),
        LoadState::Failed(reason) => TextureStatus::Failed(reason.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_pixel_buffers() {
        assert!(FlameImage::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(FlameImage::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(FlameImage::from_rgba(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn ready_handle_is_shared_between_clones() {
        let texture = FlameTexture::ready(FlameImage::from_rgba(1, 1, vec![1, 2, 3, 4]).unwrap());
        let clone = texture.clone();
        let (TextureStatus::Ready(a), TextureStatus::Ready(b)) = (texture.poll(), clone.poll())
        else {
            panic!("expected ready texture");
        };
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unavailable_handle_reports_reason() {
        let texture = FlameTexture::unavailable("no asset");
        match texture.poll() {
            TextureStatus::Failed(reason) => assert_eq!(&*reason, "no asset"),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn pending_load_times_out_at_deadline() {
        let (_sender, receiver) = bounded::<Result<FlameImage>>(1);
        let start = Instant::now();
        let texture = FlameTexture::from_state(LoadState::Pending {
            receiver,
            deadline: Some(start + Duration::from_millis(50)),
        });
        assert!(matches!(texture.poll_at(start), TextureStatus::Pending));
        assert!(matches!(
            texture.poll_at(start + Duration::from_millis(60)),
            TextureStatus::Failed(_)
        ));
        // Failure is sticky.
        assert!(matches!(texture.poll_at(start), TextureStatus::Failed(_)));
    }

    #[test]
    fn pending_load_without_deadline_waits_forever() {
        let (_sender, receiver) = bounded::<Result<FlameImage>>(1);
        let texture = FlameTexture::from_state(LoadState::Pending {
            receiver,
            deadline: None,
        });
        let far_future = Instant::now() + Duration::from_secs(3600);
        assert!(matches!(texture.poll_at(far_future), TextureStatus::Pending));
    }
}
