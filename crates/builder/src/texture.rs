//! Image textures and their out-of-band decoding.
//!
//! Decoding runs on a worker thread when a runtime is available and inline
//! otherwise; either way results are delivered through a channel and only
//! applied by [`TextureQueue::poll`], on the thread that owns the scene. A
//! result whose object was deleted in the meantime is discarded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::state::scene::{NodeId, SceneGraph};

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to read texture: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),
    #[error("malformed data URL: {0}")]
    DataUrl(#[from] base64::DecodeError),
}

/// Where texture pixels come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Bytes handed over by the user. They live exactly as long as the
    /// material that shows them.
    Upload {
        name: String,
        /// Session-local `blob:<uuid>` locator
        locator: String,
        bytes: Arc<[u8]>,
    },
    /// A static locator as found in an exported document. `path` is set
    /// when the locator resolves to a local file.
    Locator { locator: String, path: Option<PathBuf> },
}

impl TextureSource {
    pub fn upload(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Upload {
            name: name.into(),
            locator: format!("blob:{}", uuid::Uuid::new_v4()),
            bytes: bytes.into(),
        }
    }

    /// Resolve a document locator. Remote URLs are kept as references only.
    pub fn from_locator(locator: &str, base_dir: Option<&Path>) -> Self {
        let remote = locator.contains("://") || locator.starts_with("data:");
        let path = if remote {
            None
        } else {
            Some(match base_dir {
                Some(dir) => dir.join(locator),
                None => PathBuf::from(locator),
            })
        };
        Self::Locator {
            locator: locator.to_string(),
            path,
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            Self::Upload { locator, .. } | Self::Locator { locator, .. } => locator,
        }
    }
}

/// A decoded texture bound to a material.
#[derive(Debug, Clone)]
pub struct TextureRef {
    pub source: TextureSource,
    /// Pixel size, unknown for remote locators
    pub size: Option<[u32; 2]>,
    /// Mean colour, used to tint the flat-shaded preview
    pub average_color: Option<[u8; 3]>,
}

impl TextureRef {
    /// Bound to `source` before anything is known about its pixels.
    pub fn unresolved(source: TextureSource) -> Self {
        Self { source, size: None, average_color: None }
    }
}

/// Read and decode a texture source.
pub fn decode(source: TextureSource) -> Result<TextureRef, TextureError> {
    let bytes: Arc<[u8]> = match &source {
        TextureSource::Upload { bytes, .. } => bytes.clone(),
        TextureSource::Locator { path: Some(path), .. } => std::fs::read(path)?.into(),
        TextureSource::Locator { locator, path: None } => match data_url_payload(locator) {
            Some(payload) => BASE64.decode(payload)?.into(),
            None => return Ok(TextureRef::unresolved(source)),
        },
    };

    let image = image::load_from_memory(&bytes)?;
    let size = [image.width(), image.height()];
    let thumb = image.thumbnail(16, 16).to_rgb8();
    let mut sum = [0u64; 3];
    for pixel in thumb.pixels() {
        for (acc, channel) in sum.iter_mut().zip(pixel.0) {
            *acc += u64::from(channel);
        }
    }
    let count = u64::from(thumb.width() * thumb.height()).max(1);

    Ok(TextureRef {
        source,
        size: Some(size),
        average_color: Some(sum.map(|s| (s / count) as u8)),
    })
}

/// Base64 payload of a `data:...;base64,` locator.
fn data_url_payload(locator: &str) -> Option<&str> {
    let (header, payload) = locator.strip_prefix("data:")?.split_once(',')?;
    header.ends_with(";base64").then_some(payload)
}

struct Decoded {
    target: NodeId,
    result: Result<TextureRef, TextureError>,
}

/// Pending texture decodes and their completions.
pub struct TextureQueue {
    tx: UnboundedSender<Decoded>,
    rx: UnboundedReceiver<Decoded>,
    #[cfg(feature = "desktop")]
    runtime: Option<tokio::runtime::Runtime>,
    pending: usize,
}

impl TextureQueue {
    /// Decode on the calling thread; completions still arrive on the next poll.
    pub fn inline() -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            tx,
            rx,
            #[cfg(feature = "desktop")]
            runtime: None,
            pending: 0,
        }
    }

    /// Decode on a background worker thread.
    #[cfg(feature = "desktop")]
    pub fn threaded() -> Self {
        let mut queue = Self::inline();
        match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("texture-decode")
            .build()
        {
            Ok(rt) => queue.runtime = Some(rt),
            Err(e) => tracing::warn!("Texture worker unavailable, decoding inline: {e}"),
        }
        queue
    }

    /// Number of requests whose result has not been polled yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Start decoding `source` for `target`. Returns immediately.
    pub fn request(&mut self, target: NodeId, source: TextureSource) {
        self.pending += 1;
        let tx = self.tx.clone();
        let job = move || {
            let result = decode(source);
            // Receiver lives as long as the queue; a closed channel means shutdown
            let _ = tx.send(Decoded { target, result });
        };

        self.run(job);
    }

    #[cfg(feature = "desktop")]
    fn run(&self, job: impl FnOnce() + Send + 'static) {
        match &self.runtime {
            Some(rt) => {
                rt.spawn_blocking(job);
            }
            None => job(),
        }
    }

    #[cfg(not(feature = "desktop"))]
    fn run(&self, job: impl FnOnce() + Send + 'static) {
        job();
    }

    /// Apply finished decodes to their materials. Returns how many were applied.
    pub fn poll(&mut self, scene: &mut SceneGraph) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match done.result {
                Ok(texture) => {
                    let locator = texture.source.locator().to_string();
                    if scene.set_texture(done.target, Some(texture)) {
                        tracing::debug!("Texture {locator} bound");
                        applied += 1;
                    } else {
                        tracing::debug!("Discarding texture {locator}: object no longer exists");
                    }
                }
                Err(e) => tracing::warn!("Texture load failed: {e}"),
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use shared::{Material, ShapeKind, Transform};

    fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb(rgb));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn scene_with_object() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new(Box::new(HeadlessBackend::new()));
        let id = scene.add_placed(ShapeKind::Box, Transform::new(), Material::placed());
        (scene, id)
    }

    #[test]
    fn test_upload_locator_is_blob() {
        let source = TextureSource::upload("wood.png", vec![1u8, 2, 3]);
        assert!(source.locator().starts_with("blob:"));
    }

    #[test]
    fn test_locator_resolution() {
        let local = TextureSource::from_locator("textures/a.png", Some(Path::new("/tmp/out")));
        match local {
            TextureSource::Locator { path, .. } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/out/textures/a.png")))
            }
            _ => panic!("expected locator"),
        }

        let remote = TextureSource::from_locator("https://example.com/a.png", None);
        assert!(matches!(remote, TextureSource::Locator { path: None, .. }));
    }

    #[test]
    fn test_decode_average_color() {
        let tex = decode(TextureSource::upload("red.png", png_bytes([200, 10, 10]))).unwrap();
        assert_eq!(tex.size, Some([4, 4]));
        assert_eq!(tex.average_color, Some([200, 10, 10]));
    }

    #[test]
    fn test_decode_data_url() {
        use base64::engine::general_purpose::STANDARD;
        let locator = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes([0, 90, 180])));
        let tex = decode(TextureSource::from_locator(&locator, None)).unwrap();
        assert_eq!(tex.size, Some([4, 4]));
        assert_eq!(tex.average_color, Some([0, 90, 180]));

        let broken = decode(TextureSource::from_locator("data:image/png;base64,@@@", None));
        assert!(matches!(broken, Err(TextureError::DataUrl(_))));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode(TextureSource::upload("bad.png", vec![0u8; 8]));
        assert!(matches!(result, Err(TextureError::Decode(_))));
    }

    #[test]
    fn test_poll_applies_texture() {
        let (mut scene, id) = scene_with_object();
        let mut queue = TextureQueue::inline();
        queue.request(id, TextureSource::upload("a.png", png_bytes([1, 2, 3])));
        assert_eq!(queue.pending(), 1);
        // Not applied until polled
        assert!(scene.get(id).unwrap().texture.is_none());

        assert_eq!(queue.poll(&mut scene), 1);
        assert_eq!(queue.pending(), 0);
        assert!(scene.get(id).unwrap().texture.is_some());
    }

    #[test]
    fn test_poll_discards_texture_for_deleted_object() {
        let (mut scene, id) = scene_with_object();
        let mut queue = TextureQueue::inline();
        queue.request(id, TextureSource::upload("a.png", png_bytes([1, 2, 3])));
        scene.remove(id);

        assert_eq!(queue.poll(&mut scene), 0);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_last_write_wins() {
        let (mut scene, id) = scene_with_object();
        let mut queue = TextureQueue::inline();
        queue.request(id, TextureSource::upload("first.png", png_bytes([1, 1, 1])));
        queue.request(id, TextureSource::upload("second.png", png_bytes([9, 9, 9])));
        queue.poll(&mut scene);

        let tex = scene.get(id).unwrap().texture.as_ref().unwrap();
        match &tex.source {
            TextureSource::Upload { name, .. } => assert_eq!(name, "second.png"),
            _ => panic!("expected upload"),
        }
    }

    #[test]
    fn test_failed_decode_keeps_previous_texture() {
        let (mut scene, id) = scene_with_object();
        let mut queue = TextureQueue::inline();
        queue.request(id, TextureSource::upload("ok.png", png_bytes([5, 5, 5])));
        queue.request(id, TextureSource::upload("bad.png", vec![0u8; 4]));
        assert_eq!(queue.poll(&mut scene), 1);
        assert!(scene.get(id).unwrap().texture.is_some());
    }
}
