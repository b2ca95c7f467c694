//! # Signature Rendering
//!
//! Signature pads hand over strokes as JSON: a list of lines, each a list of
//! `[x, y]` points.
//!
//! ```json
//! [[[10, 20], [11, 24], [15, 30]], [[40, 20], [40, 60]]]
//! ```
//!
//! The strokes are redrawn with a 3-dot pen on a white canvas as wide as the
//! paper and 300 dots tall, shifted right so the widest point is centred,
//! and framed with a border. The result prints as a compressed bitmap.

use image::{DynamicImage, GrayImage, Luma};
use serde::Deserialize;

use crate::error::Error;
use crate::job::PrintPrimitive;
use crate::printer::Limits;
use crate::render::{BitmapOptions, Dithering};

/// Canvas height in dots
pub const CANVAS_HEIGHT: u32 = 300;

/// Pen and border width in dots
pub const PEN_WIDTH: f32 = 3.0;

/// Lines of `[x, y]` points.
pub type Strokes = Vec<Vec<[f32; 2]>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Encoded {
    Strokes(Strokes),
    /// Some pads wrap the strokes in a one-element array of JSON text
    Wrapped(Vec<String>),
}

/// Parse a stroke document.
pub fn parse(json: &str) -> Result<Strokes, Error> {
    match serde_json::from_str::<Encoded>(json)? {
        Encoded::Strokes(strokes) => Ok(strokes),
        Encoded::Wrapped(inner) => match inner.first() {
            Some(text) => Ok(serde_json::from_str(text)?),
            None => Ok(Vec::new()),
        },
    }
}

const BLACK: Luma<u8> = Luma([0]);

fn stamp(canvas: &mut GrayImage, cx: f32, cy: f32) {
    let r = PEN_WIDTH / 2.0;
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let x0 = (cx - r).floor() as i64;
    let y0 = (cy - r).floor() as i64;
    for y in y0..=(cy + r).ceil() as i64 {
        for x in x0..=(cx + r).ceil() as i64 {
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(x as u32, y as u32, BLACK);
            }
        }
    }
}

fn draw_line(canvas: &mut GrayImage, from: [f32; 2], to: [f32; 2]) {
    let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
    let steps = (dx.abs().max(dy.abs()) * 2.0).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp(canvas, from[0] + dx * t, from[1] + dy * t);
    }
}

/// Draw the strokes onto a `width` x [`CANVAS_HEIGHT`] canvas.
pub fn render(strokes: &Strokes, width: u32) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(width, CANVAS_HEIGHT, Luma([255]));

    let max_x = strokes
        .iter()
        .flatten()
        .map(|p| p[0].round())
        .fold(0.0f32, f32::max);
    let offset = ((width as f32 - max_x) / 2.0).max(0.0);

    for line in strokes {
        let points: Vec<[f32; 2]> = line
            .iter()
            .map(|p| [p[0].round() + offset, p[1].round()])
            .collect();
        match points.as_slice() {
            [single] => stamp(&mut canvas, single[0], single[1]),
            _ => {
                for pair in points.windows(2) {
                    draw_line(&mut canvas, pair[0], pair[1]);
                }
            }
        }
    }

    let (right, bottom) = (width as f32 - 1.0, CANVAS_HEIGHT as f32 - 1.0);
    for (from, to) in [
        ([0.0, 0.0], [right, 0.0]),
        ([right, 0.0], [right, bottom]),
        ([right, bottom], [0.0, bottom]),
        ([0.0, bottom], [0.0, 0.0]),
    ] {
        draw_line(&mut canvas, from, to);
    }

    canvas
}

/// Signature as a ready-to-print bitmap primitive for this model.
pub fn primitive(strokes: &Strokes, limits: &Limits) -> PrintPrimitive {
    let width = limits.max_dot_width;
    PrintPrimitive::Bitmap {
        image: DynamicImage::ImageLuma8(render(strokes, width as u32)),
        options: BitmapOptions {
            target_width_dots: width,
            compression: true,
            page_mode: false,
            dithering: Dithering::Threshold,
        },
    }
}
