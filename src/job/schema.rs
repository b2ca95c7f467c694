//! JSON job documents.
//!
//! ```json
//! {
//!   "primitives": [
//!     { "type": "text", "content": "HELLO", "emphasized": true, "alignment": "center" },
//!     { "type": "barcode", "symbology": "code39", "height": 60, "width_class": 1, "data": "12345678" },
//!     { "type": "qr_code", "correction_level": "M", "module_size": 4, "data": "https://example.com" },
//!     { "type": "bitmap", "path": "logo.png", "compression": true }
//!   ],
//!   "trailing": [{ "type": "feed", "lines": 3 }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::primitive::{PrintPrimitive, TrailingAction};
use crate::error::{Error, PrintError};
use crate::printer::{CorrectionLevel, Limits, WidthClass};
use crate::protocol::barcode::Symbology;
use crate::protocol::text::{DoubleByteCharset, FormattingState};
use crate::render::{BitmapOptions, Dithering};
use crate::signature::{self, Strokes};

fn default_module_size() -> u8 {
    4
}

fn default_columns() -> u8 {
    4
}

fn default_security() -> u8 {
    2
}

fn default_ratio() -> u8 {
    3
}

fn default_barcode_height() -> u8 {
    60
}

/// Top-level JSON document.
#[derive(Debug, Deserialize)]
pub struct JobDocument {
    pub primitives: Vec<JsonPrimitive>,
    #[serde(default)]
    pub trailing: Vec<TrailingAction>,
}

/// A single primitive in the document.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonPrimitive {
    Text {
        content: String,
        #[serde(flatten)]
        format: FormattingState,
    },
    DoubleByteText {
        content: String,
        charset: DoubleByteCharset,
        #[serde(flatten)]
        format: FormattingState,
    },
    Barcode {
        symbology: Symbology,
        #[serde(default = "default_barcode_height")]
        height: u8,
        #[serde(default)]
        width_class: u8,
        data: String,
    },
    QrCode {
        #[serde(default)]
        correction_level: CorrectionLevel,
        #[serde(default = "default_module_size")]
        module_size: u8,
        #[serde(default)]
        size_by_ec_level: u8,
        data: String,
    },
    Pdf417 {
        #[serde(default)]
        width_class: u8,
        #[serde(default = "default_columns")]
        columns: u8,
        #[serde(default = "default_security")]
        security_level: u8,
        #[serde(default = "default_ratio")]
        ratio: u8,
        data: String,
    },
    Bitmap {
        path: String,
        #[serde(default)]
        target_width_dots: Option<u16>,
        #[serde(default)]
        compression: bool,
        #[serde(default)]
        page_mode: bool,
        #[serde(default)]
        dithering: Dithering,
    },
    Signature {
        strokes: Strokes,
    },
}

fn width_class(index: usize, ordinal: u8) -> Result<WidthClass, Error> {
    WidthClass::try_from(ordinal)
        .map_err(|source| Error::Print(PrintError::Encoding { index, source }))
}

impl JsonPrimitive {
    /// Resolve into a primitive. Relative bitmap paths are read from `base`.
    pub fn into_primitive(
        self,
        index: usize,
        base: &Path,
        limits: &Limits,
    ) -> Result<PrintPrimitive, Error> {
        Ok(match self {
            Self::Text { content, format } => PrintPrimitive::text_from_str(&content, format)
                .map_err(|source| PrintError::Encoding { index, source })?,
            Self::DoubleByteText {
                content,
                charset,
                format,
            } => PrintPrimitive::DoubleByteText {
                content,
                charset,
                format,
            },
            Self::Barcode {
                symbology,
                height,
                width_class: ordinal,
                data,
            } => PrintPrimitive::Barcode {
                symbology,
                height,
                width: width_class(index, ordinal)?,
                payload: data.into_bytes(),
            },
            Self::QrCode {
                correction_level,
                module_size,
                size_by_ec_level,
                data,
            } => PrintPrimitive::QrCode {
                correction_level,
                module_size,
                size_by_ec_level,
                payload: data.into_bytes(),
            },
            Self::Pdf417 {
                width_class: ordinal,
                columns,
                security_level,
                ratio,
                data,
            } => PrintPrimitive::Pdf417 {
                width: width_class(index, ordinal)?,
                columns,
                security_level,
                ratio,
                payload: data.into_bytes(),
            },
            Self::Bitmap {
                path,
                target_width_dots,
                compression,
                page_mode,
                dithering,
            } => {
                let full = base.join(&path);
                let image = image::open(&full)
                    .map_err(|e| Error::Image(format!("{}: {}", full.display(), e)))?;
                PrintPrimitive::Bitmap {
                    image,
                    options: BitmapOptions {
                        target_width_dots: target_width_dots.unwrap_or(limits.max_dot_width),
                        compression,
                        page_mode,
                        dithering,
                    },
                }
            }
            Self::Signature { strokes } => signature::primitive(&strokes, limits),
        })
    }
}

impl JobDocument {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve every primitive, stopping at the first failure.
    pub fn into_parts(
        self,
        base: &Path,
        limits: &Limits,
    ) -> Result<(Vec<PrintPrimitive>, Vec<TrailingAction>), Error> {
        let primitives = self
            .primitives
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.into_primitive(i, base, limits))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((primitives, self.trailing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodingError;
    use crate::protocol::text::Alignment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_text_flattened_format() {
        let doc = JobDocument::from_json(
            r#"{"primitives":[{"type":"text","content":"HI","emphasized":true,"alignment":"center","height_scale":2}]}"#,
        )
        .unwrap();
        let (prims, trailing) = doc.into_parts(Path::new("."), &Limits::default()).unwrap();
        assert!(trailing.is_empty());
        assert_eq!(
            prims,
            vec![PrintPrimitive::text(
                "HI",
                FormattingState {
                    emphasized: true,
                    alignment: Alignment::Center,
                    height_scale: 2,
                    ..FormattingState::default()
                }
            )]
        );
    }

    #[test]
    fn test_parse_codes_with_defaults() {
        let doc = JobDocument::from_json(
            r#"{
                "primitives": [
                    {"type":"barcode","symbology":"itf","data":"1234"},
                    {"type":"qr_code","data":"x"},
                    {"type":"pdf417","data":"y","width_class":7}
                ],
                "trailing": [{"type":"feed","lines":2},{"type":"cut"}]
            }"#,
        )
        .unwrap();
        let (prims, trailing) = doc.into_parts(Path::new("."), &Limits::default()).unwrap();
        assert_eq!(prims.len(), 3);
        assert_eq!(
            prims[1],
            PrintPrimitive::QrCode {
                correction_level: CorrectionLevel::M,
                module_size: 4,
                size_by_ec_level: 0,
                payload: b"x".to_vec(),
            }
        );
        assert_eq!(
            trailing,
            vec![
                TrailingAction::Feed { lines: 2 },
                TrailingAction::Cut { partial: false }
            ]
        );
    }

    #[test]
    fn test_invalid_width_class_reports_index() {
        let doc = JobDocument::from_json(
            r#"{"primitives":[{"type":"text","content":"a"},{"type":"barcode","symbology":"code93","width_class":9,"data":"A"}]}"#,
        )
        .unwrap();
        let err = doc
            .into_parts(Path::new("."), &Limits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Print(PrintError::Encoding {
                index: 1,
                source: EncodingError::InvalidWidthClass(9)
            })
        ));
    }

    #[test]
    fn test_text_transcoded_to_code_page() {
        let doc = JobDocument::from_json(r#"{"primitives":[{"type":"text","content":"Café"}]}"#)
            .unwrap();
        let (prims, _) = doc.into_parts(Path::new("."), &Limits::default()).unwrap();
        assert_eq!(
            prims,
            vec![PrintPrimitive::text(b"Caf\x82".to_vec(), FormattingState::default())]
        );
    }

    #[test]
    fn test_unmappable_text_reports_index() {
        let doc = JobDocument::from_json(
            r#"{"primitives":[{"type":"text","content":"ok"},{"type":"text","content":"Café €5"}]}"#,
        )
        .unwrap();
        let err = doc
            .into_parts(Path::new("."), &Limits::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Print(PrintError::Encoding {
                index: 1,
                source: EncodingError::UnmappableText { charset: "PC437" }
            })
        ));
    }

    #[test]
    fn test_missing_bitmap_is_image_error() {
        let doc = JobDocument::from_json(
            r#"{"primitives":[{"type":"bitmap","path":"does-not-exist.png"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            doc.into_parts(Path::new("/nonexistent"), &Limits::default()),
            Err(Error::Image(_))
        ));
    }
}
