//! Image shape for embedding raster images.

use super::{ObjectFlags, ObjectId, ShapeStyle, ShapeTrait, new_object_id};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }
        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A raster image placed on the drawing layer.
///
/// `src` is either a `data:` URL carrying the bytes or an external URL kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ObjectId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    pub src: String,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Image {
    /// Create an image from raw bytes, displayed at its natural size.
    pub fn new(
        position: Point,
        data: &[u8],
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        let src = format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data));
        Self::from_src(position, src, source_width as f64, source_height as f64)
    }

    pub fn from_src(position: Point, src: String, width: f64, height: f64) -> Self {
        Self {
            id: new_object_id(),
            position,
            width,
            height,
            src,
            style: ShapeStyle {
                stroke_width: 0.0,
                ..ShapeStyle::default()
            },
            flags: ObjectFlags::default(),
        }
    }

    /// Scale uniformly so the display width equals `width`.
    pub fn scale_to_width(&mut self, width: f64) {
        if self.width <= 0.0 {
            self.width = width;
            return;
        }
        let factor = width / self.width;
        self.width = width;
        self.height *= factor;
    }

    /// Format of an embedded `data:` URL.
    pub fn format(&self) -> Option<ImageFormat> {
        let (mime, _) = self.src.strip_prefix("data:")?.split_once(';')?;
        ImageFormat::from_mime_type(mime)
    }

    /// Raw bytes of an embedded `data:` URL.
    pub fn data(&self) -> Option<Vec<u8>> {
        let (_, payload) = self.src.strip_prefix("data:")?.split_once(";base64,")?;
        STANDARD.decode(payload).ok()
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn flags(&self) -> ObjectFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut ObjectFlags {
        &mut self.flags
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}
