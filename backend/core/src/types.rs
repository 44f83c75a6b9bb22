use std::fmt;

use serde::Serialize;

/// Four `[x, y]` corners of a text line, in source-image pixel coordinates.
pub type Quad = [[f64; 2]; 4];

/// Image container formats the gateway knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
    Gif,
    Webp,
    Tiff,
    Ico,
    Other,
}

impl ImageKind {
    /// Every named kind, in the order used by error messages.
    pub const KNOWN: [ImageKind; 7] = [
        ImageKind::Jpeg,
        ImageKind::Png,
        ImageKind::Bmp,
        ImageKind::Gif,
        ImageKind::Webp,
        ImageKind::Tiff,
        ImageKind::Ico,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
            ImageKind::Bmp => "bmp",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
            ImageKind::Tiff => "tiff",
            ImageKind::Ico => "ico",
            ImageKind::Other => "other",
        }
    }

    /// Parse a configured format name. `jpg` and `tif` are accepted aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "bmp" => Some(ImageKind::Bmp),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::Webp),
            "tiff" | "tif" => Some(ImageKind::Tiff),
            "ico" => Some(ImageKind::Ico),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated image, owned by exactly one recognition call.
#[derive(Debug)]
pub struct RecognitionRequest {
    bytes: Vec<u8>,
    kind: ImageKind,
    width: u32,
    height: u32,
}

impl RecognitionRequest {
    pub fn new(bytes: Vec<u8>, kind: ImageKind, width: u32, height: u32) -> Self {
        Self {
            bytes,
            kind,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineRecord {
    text: String,
    confidence: f64,
    #[serde(rename = "box")]
    bounding_box: Quad,
}

impl LineRecord {
    /// Builds a line record. Confidence is clamped to `[0, 1]` and rounded
    /// to four decimal places; NaN becomes `0.0`.
    pub fn new(text: impl Into<String>, confidence: f64, bounding_box: Quad) -> Self {
        Self {
            text: text.into(),
            confidence: round_confidence(confidence),
            bounding_box,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn bounding_box(&self) -> &Quad {
        &self.bounding_box
    }
}

fn round_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    (value.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}

/// Text recognized in one image: the joined plain text plus per-line detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionResult {
    plain_text: String,
    detailed: Vec<LineRecord>,
}

impl RecognitionResult {
    /// Builds a result from lines in detection order.
    pub fn from_lines(lines: Vec<LineRecord>) -> Self {
        let plain_text = lines
            .iter()
            .map(LineRecord::text)
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            plain_text,
            detailed: lines,
        }
    }

    /// A result for an image with no detected text.
    pub fn empty() -> Self {
        Self::from_lines(Vec::new())
    }

    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn detailed(&self) -> &[LineRecord] {
        &self.detailed
    }

    pub fn line_count(&self) -> usize {
        self.detailed.len()
    }
}
