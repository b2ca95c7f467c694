//! # Decoder Tests
//!
//! Encode through the public API, then parse the bytes back with small
//! decoders that only exist here. A decoder that recovers every field is a
//! stronger check than comparing against stored byte dumps.

use estrellita::error::EncodingError;
use estrellita::job::{PrintPrimitive, TrailingAction, compose};
use estrellita::printer::{CorrectionLevel, Limits, WidthClass};
use estrellita::protocol::barcode::Symbology;
use estrellita::protocol::text::{Alignment, FormattingState};
use estrellita::render::BitmapOptions;
use estrellita::{encode_barcode, encode_bitmap, encode_pdf417, encode_qr, encode_text_print};
use image::{DynamicImage, GrayImage, Luma};
use pretty_assertions::assert_eq;

// ============================================================================
// TEST-ONLY DECODERS
// ============================================================================

#[derive(Debug, PartialEq)]
struct DecodedBarcode {
    symbology: Symbology,
    height: u8,
    width_class: u8,
    payload: Vec<u8>,
}

/// `GS h n  GS w n  GS k m len data`
fn decode_barcode(bytes: &[u8]) -> DecodedBarcode {
    assert_eq!(&bytes[..2], &[0x1D, b'h']);
    assert_eq!(&bytes[3..5], &[0x1D, b'w']);
    assert_eq!(&bytes[6..8], &[0x1D, b'k']);
    let len = bytes[9] as usize;
    assert_eq!(bytes.len(), 10 + len, "trailing bytes after barcode");
    DecodedBarcode {
        symbology: Symbology::from_type_code(bytes[8]).expect("known symbology"),
        height: bytes[2],
        width_class: bytes[5],
        payload: bytes[10..].to_vec(),
    }
}

#[derive(Debug, PartialEq)]
struct Raster {
    bands: usize,
    width_bytes: usize,
    height: usize,
    data: Vec<u8>,
}

fn unpack_bits(stream: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < stream.len() {
        let n = stream[i] as i8;
        i += 1;
        if n >= 0 {
            let count = n as usize + 1;
            out.extend_from_slice(&stream[i..i + count]);
            i += count;
        } else if n != -128 {
            out.extend(std::iter::repeat_n(stream[i], (1 - n as isize) as usize));
            i += 1;
        }
    }
    out
}

/// Every `GS v 0` / `GS v 1` band in `bytes`, expanded and stacked.
fn decode_rasters(bytes: &[u8]) -> Raster {
    let mut raster = Raster {
        bands: 0,
        width_bytes: 0,
        height: 0,
        data: Vec::new(),
    };
    let mut i = 0;
    while i < bytes.len() {
        assert_eq!(&bytes[i..i + 2], &[0x1D, b'v'], "expected raster at {i}");
        let kind = bytes[i + 2];
        let width_bytes = u16::from_le_bytes([bytes[i + 4], bytes[i + 5]]) as usize;
        let height = u16::from_le_bytes([bytes[i + 6], bytes[i + 7]]) as usize;
        i += 8;
        let band = match kind {
            0 => {
                let len = width_bytes * height;
                let band = bytes[i..i + len].to_vec();
                i += len;
                band
            }
            1 => {
                let len = u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
                    as usize;
                i += 4;
                let band = unpack_bits(&bytes[i..i + len]);
                i += len;
                band
            }
            other => panic!("unknown raster kind {other}"),
        };
        assert_eq!(band.len(), width_bytes * height);
        raster.bands += 1;
        raster.width_bytes = width_bytes;
        raster.height += height;
        raster.data.extend(band);
    }
    raster
}

fn position(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Deterministic grayscale test card: gradient plus noise-like texture.
fn test_card(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
        Luma([((x * 7 + y * 13 + (x * y) % 29) % 256) as u8])
    }))
}

// ============================================================================
// BARCODES
// ============================================================================

#[test]
fn test_barcode_roundtrip_all_symbologies() {
    let limits = Limits::default();
    let payloads: [&[u8]; 4] = [b"CODE-39 $", b"ABC123", b"12345678", b"{Bestrellita"];
    for (symbology, payload) in Symbology::ALL.into_iter().zip(payloads) {
        for width_class in 0..=7u8 {
            let bytes = encode_barcode(symbology, 80, width_class, payload, &limits).unwrap();
            assert_eq!(
                decode_barcode(&bytes),
                DecodedBarcode {
                    symbology,
                    height: 80,
                    width_class,
                    payload: payload.to_vec(),
                }
            );
        }
    }
}

#[test]
fn test_barcode_too_long_emits_nothing() {
    for symbology in Symbology::ALL {
        let result = encode_barcode(symbology, 80, 1, &[b'0'; 256], &Limits::default());
        assert!(matches!(
            result,
            Err(EncodingError::PayloadTooLarge { len: 256, max: 255, .. })
        ));
    }
}

// ============================================================================
// TEXT / QR / PDF417 SCENARIOS
// ============================================================================

#[test]
fn test_hello_emphasized_centered() {
    let state = FormattingState::new()
        .emphasized(true)
        .alignment(Alignment::Center);
    let bytes = encode_text_print(&state, b"HELLO", &Limits::default());

    assert_eq!(&bytes[..3], &[0x1B, b'!', 0x08]);
    let center = position(&bytes, &[0x1B, b'a', 1]).expect("center alignment");
    let hello = position(&bytes, b"HELLO").expect("content");
    assert!(center < hello);
}

#[test]
fn test_qr_length_field() {
    let payload = b"0123456789abcdef";
    let bytes = encode_qr(CorrectionLevel::M, 0, 4, payload, &Limits::default()).unwrap();
    let start = position(&bytes, &[0x1B, b'Z']).unwrap();
    assert_eq!(bytes[start + 3], b'M');
    let len = &bytes[start + 5..start + 9];
    assert_eq!(u32::from_le_bytes([len[0], len[1], len[2], len[3]]), 16);
    assert_eq!(&bytes[start + 9..], payload);
}

#[test]
fn test_pdf417_300_bytes_rejected() {
    let result = encode_pdf417(1, 4, 2, 3, &[b'x'; 300], &Limits::default());
    assert!(matches!(
        result,
        Err(EncodingError::PayloadTooLarge { len: 300, .. })
    ));
}

// ============================================================================
// BITMAPS
// ============================================================================

#[test]
fn test_compressed_matches_raw() {
    let limits = Limits::PORTABLE_2INCH;
    let image = test_card(300, 600);
    let raw = encode_bitmap(&image, 384, false, false, &limits).unwrap();
    let packed = encode_bitmap(&image, 384, true, false, &limits).unwrap();

    let raw = decode_rasters(&raw);
    let packed = decode_rasters(&packed);
    assert_eq!(raw.height, 600);
    assert_eq!(raw, packed);
}

#[test]
fn test_bands_follow_max_band_rows() {
    let limits = Limits::PORTABLE_2INCH;
    let bytes = encode_bitmap(&test_card(64, 600), 384, false, false, &limits).unwrap();
    let raster = decode_rasters(&bytes);
    assert_eq!(raster.bands, 600usize.div_ceil(limits.max_band_rows as usize));
    assert_eq!((raster.width_bytes, raster.height), (8, 600));
}

#[test]
fn test_monochrome_transcode_is_idempotent() {
    let limits = Limits::PORTABLE_3INCH;
    let image = DynamicImage::ImageLuma8(GrayImage::from_fn(200, 40, |x, y| {
        Luma([if (x / 5 + y / 3) % 2 == 0 { 0 } else { 255 }])
    }));
    let first = encode_bitmap(&image, 576, true, false, &limits).unwrap();
    let second = encode_bitmap(&image, 576, true, false, &limits).unwrap();
    assert_eq!(first, second);

    // Feeding the decoded raster back in as an image changes nothing either
    let raster = decode_rasters(&first);
    let again = DynamicImage::ImageLuma8(GrayImage::from_fn(200, 40, |x, y| {
        let byte = raster.data[y as usize * raster.width_bytes + x as usize / 8];
        Luma([if byte & (0x80 >> (x % 8)) != 0 { 0 } else { 255 }])
    }));
    assert_eq!(encode_bitmap(&again, 576, true, false, &limits).unwrap(), first);
}

#[test]
fn test_page_mode_wraps_raster() {
    let bytes = encode_bitmap(&test_card(16, 8), 384, false, true, &Limits::default()).unwrap();
    assert_eq!(&bytes[..2], &[0x1B, b'L']);
    assert!(bytes.ends_with(&[0x1B, 0x0C, 0x1B, b'S']));
}

// ============================================================================
// COMPOSED JOBS
// ============================================================================

#[test]
fn test_composed_job_layout() {
    let limits = Limits::PORTABLE_3INCH;
    let job = compose(
        &[
            PrintPrimitive::text("TITLE", FormattingState::new().center().scale(2, 2)),
            PrintPrimitive::Barcode {
                symbology: Symbology::Itf,
                height: 50,
                width: WidthClass::W500,
                payload: b"0123456789".to_vec(),
            },
            PrintPrimitive::Bitmap {
                image: test_card(32, 4),
                options: BitmapOptions {
                    compression: true,
                    ..BitmapOptions::default()
                },
            },
        ],
        &[TrailingAction::FeedDots { dots: 40 }],
        &limits,
    )
    .unwrap();

    let bytes = job.as_bytes();
    assert_eq!(job.primitive_count(), 3);
    assert_eq!(&bytes[..2], &[0x1B, b'@']);
    assert!(position(bytes, &[0x1D, b'!', 0x11]).is_some());
    let barcode_at = position(bytes, &[0x1D, b'h', 50]).unwrap();
    let decoded = decode_barcode(&bytes[barcode_at..barcode_at + 20]);
    assert_eq!(decoded.width_class, 3);
    assert_eq!(decoded.symbology, Symbology::Itf);
    assert!(position(bytes, &[0x1D, b'v', 1]).is_some());
    assert!(bytes.ends_with(&[0x1B, b'J', 40]));
}
