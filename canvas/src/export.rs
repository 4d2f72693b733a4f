//! Export: flattens a document into one encoded image.
//!
//! The output surface takes the background's native dimensions. Everything is
//! painted in the same order the editor shows it: background, below-mask
//! layers, the cutout at its offset, above-mask layers. Images are fetched
//! and decoded one at a time when their turn comes so paint order stays
//! deterministic.
//!
//! Any image that cannot be fetched or decoded aborts the whole export; a
//! partial composition is never returned.
//!
//! [`Exporter`] wraps [`flatten`] for one project and joins concurrent
//! callers asking for the same document onto a single in-flight export.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;
use tracing::{debug, info};

use crate::doc::{Document, Layer, LayerContent};
use crate::fonts::FontBook;
use crate::geometry::{Size, pct_to_px, render_scale};
use crate::render::{RenderContext, draw_full_canvas, draw_layer, pixmap_from_rgba, pixmap_to_rgba};

/// The one message shown to users when an export fails.
pub const EXPORT_FAILED_MESSAGE: &str = "could not prepare image, try again";

// =============================================================
// Image sources
// =============================================================

/// Why an image reference could not be turned into bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("image not found: {0}")]
    NotFound(String),
    /// The bytes are not readable for export (e.g. an origin outside the allow-list).
    #[error("image source is not readable: {0}")]
    Tainted(String),
    #[error("image fetch failed: {0}")]
    Io(String),
}

/// Resolves an image reference (URL or storage key) to encoded bytes.
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the encoded bytes behind `reference`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the reference is unknown, not readable,
    /// or the transport fails.
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError>;
}

/// In-memory source keyed by reference. Useful for tests and previews.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    images: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(reference.into(), bytes);
    }
}

#[async_trait::async_trait]
impl ImageSource for MemorySource {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(reference.to_owned()))
    }
}

// =============================================================
// Errors and formats
// =============================================================

/// Export failure. Cloneable so concurrent callers can share one result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("could not load image `{reference}`: {reason}")]
    ImageDecode { reference: String, reason: String },
    #[error("could not allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
    #[error("could not encode output: {0}")]
    Encode(String),
}

impl ExportError {
    /// User-facing text. Every failure reads the same to the user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        EXPORT_FAILED_MESSAGE
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg {
        quality: u8,
    },
}

impl OutputFormat {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

/// Decode encoded image bytes into a premultiplied surface.
///
/// # Errors
///
/// Returns [`ExportError::ImageDecode`] for unreadable or empty images.
pub fn decode_image(reference: &str, bytes: &[u8]) -> Result<Pixmap, ExportError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ExportError::ImageDecode {
        reference: reference.to_owned(),
        reason: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    pixmap_from_rgba(width, height, rgba.into_raw()).ok_or_else(|| ExportError::ImageDecode {
        reference: reference.to_owned(),
        reason: format!("unusable dimensions {width}x{height}"),
    })
}

/// Encode a surface in `format`.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] when the encoder rejects the pixels.
pub fn encode_pixmap(pixmap: &Pixmap, format: OutputFormat) -> Result<Vec<u8>, ExportError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let rgba = RgbaImage::from_raw(width, height, pixmap_to_rgba(pixmap))
        .ok_or_else(|| ExportError::Encode(format!("buffer does not match {width}x{height}")))?;
    let mut out = Vec::new();
    match format {
        OutputFormat::Png => {
            DynamicImage::ImageRgba8(rgba)
                .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
        OutputFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
                .map_err(|e| ExportError::Encode(e.to_string()))?;
        }
    }
    Ok(out)
}

// =============================================================
// Flatten
// =============================================================

async fn load(sources: &dyn ImageSource, reference: &str) -> Result<Pixmap, ExportError> {
    let bytes = sources.fetch(reference).await.map_err(|e| ExportError::ImageDecode {
        reference: reference.to_owned(),
        reason: e.to_string(),
    })?;
    decode_image(reference, &bytes)
}

async fn draw_bucket(
    surface: &mut Pixmap,
    layers: Vec<&Layer>,
    ctx: &RenderContext<'_>,
    sources: &dyn ImageSource,
) -> Result<(), ExportError> {
    for layer in layers {
        match &layer.content {
            LayerContent::Image(props) => {
                let pixels = load(sources, &props.src).await?;
                draw_layer(surface, layer, ctx, Some(pixels.as_ref()));
            }
            _ => {
                draw_layer(surface, layer, ctx, None);
            }
        }
    }
    Ok(())
}

/// Paint `doc` onto a surface the size of its background.
///
/// `reference_viewport_height` is the on-screen height the document was
/// edited at; text, strokes and effects scale by output height over it.
///
/// # Errors
///
/// Returns [`ExportError::ImageDecode`] when any referenced image cannot be
/// fetched or decoded.
pub async fn flatten_to_pixmap(
    doc: &Document,
    reference_viewport_height: f64,
    sources: &dyn ImageSource,
    fonts: &FontBook,
) -> Result<Pixmap, ExportError> {
    let mut surface = load(sources, &doc.background_url).await?;
    let size = Size::new(f64::from(surface.width()), f64::from(surface.height()));
    let ctx = RenderContext { size, scale: render_scale(size.height, reference_viewport_height), fonts };
    debug!(width = surface.width(), height = surface.height(), scale = ctx.scale, "flatten surface ready");

    draw_bucket(&mut surface, doc.visible_bucket(false).collect(), &ctx, sources).await?;

    if let Some(cutout_url) = &doc.cutout_url {
        let cutout = load(sources, cutout_url).await?;
        let ox = pct_to_px(doc.mask_translate_x_pct, size.width);
        let oy = pct_to_px(doc.mask_translate_y_pct, size.height);
        draw_full_canvas(&mut surface, cutout.as_ref(), ox, oy);
    }

    draw_bucket(&mut surface, doc.visible_bucket(true).collect(), &ctx, sources).await?;
    Ok(surface)
}

/// Flatten `doc` and encode it.
///
/// # Errors
///
/// Returns [`ExportError`] when an image cannot be loaded or the output
/// cannot be encoded. No bytes are produced on failure.
pub async fn flatten(
    doc: &Document,
    reference_viewport_height: f64,
    sources: &dyn ImageSource,
    fonts: &FontBook,
    format: OutputFormat,
) -> Result<Vec<u8>, ExportError> {
    let started = Instant::now();
    let surface = flatten_to_pixmap(doc, reference_viewport_height, sources, fonts).await?;
    let bytes = encode_pixmap(&surface, format)?;
    info!(
        width = surface.width(),
        height = surface.height(),
        layers = doc.layers.len(),
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "export complete"
    );
    Ok(bytes)
}

// =============================================================
// Single-flight exporter
// =============================================================

type ExportResult = Result<Arc<Vec<u8>>, ExportError>;
type PendingExport = Shared<BoxFuture<'static, ExportResult>>;

/// The export currently running and the request it is answering.
struct InFlight {
    doc: Arc<Document>,
    reference_viewport_height: f64,
    future: PendingExport,
}

impl InFlight {
    fn answers(&self, doc: &Document, reference_viewport_height: f64) -> bool {
        self.reference_viewport_height.to_bits() == reference_viewport_height.to_bits() && *self.doc == *doc
    }
}

/// Exports one project, joining concurrent requests for the same document
/// onto the export already in flight.
pub struct Exporter {
    sources: Arc<dyn ImageSource>,
    fonts: Arc<FontBook>,
    format: OutputFormat,
    pending: Mutex<Option<InFlight>>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter").field("format", &self.format).finish_non_exhaustive()
    }
}

impl Exporter {
    #[must_use]
    pub fn new(sources: Arc<dyn ImageSource>, fonts: Arc<FontBook>, format: OutputFormat) -> Self {
        Self { sources, fonts, format, pending: Mutex::new(None) }
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether an export is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Export `doc`.
    ///
    /// A call for the same document and reference height as the running
    /// export awaits that export's result. A call for anything else waits
    /// for the running export to finish, then runs its own.
    ///
    /// # Errors
    ///
    /// Returns the shared [`ExportError`] of the export that ran.
    pub async fn export(&self, doc: Document, reference_viewport_height: f64) -> ExportResult {
        let doc = Arc::new(doc);
        loop {
            let (pending, ours) = {
                let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                match slot.as_ref() {
                    Some(running) if running.answers(&doc, reference_viewport_height) => {
                        debug!("joining export already in flight");
                        (running.future.clone(), true)
                    }
                    Some(running) => (running.future.clone(), false),
                    None => {
                        let future = self.start(Arc::clone(&doc), reference_viewport_height);
                        *slot = Some(InFlight {
                            doc: Arc::clone(&doc),
                            reference_viewport_height,
                            future: future.clone(),
                        });
                        (future, true)
                    }
                }
            };

            let result = pending.clone().await;
            self.release(&pending);
            if ours {
                return result;
            }
            debug!(previous_ok = result.is_ok(), "export of another document finished, starting this one");
        }
    }

    fn start(&self, doc: Arc<Document>, reference_viewport_height: f64) -> PendingExport {
        let sources = Arc::clone(&self.sources);
        let fonts = Arc::clone(&self.fonts);
        let format = self.format;
        async move {
            flatten(&doc, reference_viewport_height, sources.as_ref(), &fonts, format)
                .await
                .map(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Clear the slot if it still holds `finished`.
    fn release(&self, finished: &PendingExport) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|running| running.future.ptr_eq(finished)) {
            *slot = None;
        }
    }
}
