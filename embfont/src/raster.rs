/*!
Scanline rasterization of outline path commands.

The input is the command stream an outline font yields for one glyph:
`MoveTo`/`LineTo`/`QuadTo`/`CurveTo`/`Close` in em-unit coordinates with
y growing upward. Curves are flattened with a fixed subdivision count,
the polygons are transformed into the pixel grid, and an even-odd
scanline fill writes opaque pixels.

Everything here is deterministic on purpose: subdivision counts, the
half-open edge rule, and the floor/ceil span rounding are all fixed, so
the same outline always produces the same bytes. Firmware-side decoders
were validated against exactly this rendition.
*/

use image::GrayImage;

/// One outline path command, em-unit coordinates, y-up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    QuadTo { x1: f32, y1: f32, x: f32, y: f32 },
    CurveTo { x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32 },
    Close,
}

/// Fixed subdivision of a quadratic Bézier: samples at t = 0.25 .. 1.0.
const QUAD_SEGMENTS: u32 = 4;
/// Fixed subdivision of a cubic Bézier: samples at t = 0.125 .. 1.0.
const CUBIC_SEGMENTS: u32 = 8;

/**
Flatten a command stream into closed contours.

Each contour is an ordered point list; the closing edge from the last
point back to the first is implicit. Curves contribute their fixed
subdivision samples (the on-curve start point is already present as the
previous point).
*/
pub fn flatten(commands: &[PathCommand]) -> Vec<Vec<(f32, f32)>> {
    let mut contours: Vec<Vec<(f32, f32)>> = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    // Pen position; also the contour start for the post-Close pen.
    let mut pen = (0.0f32, 0.0f32);

    for command in commands {
        match *command {
            PathCommand::MoveTo { x, y } => {
                if !current.is_empty() {
                    contours.push(std::mem::take(&mut current));
                }
                pen = (x, y);
                current.push(pen);
            }
            PathCommand::LineTo { x, y } => {
                pen = (x, y);
                current.push(pen);
            }
            PathCommand::QuadTo { x1, y1, x, y } => {
                let (x0, y0) = pen;
                for i in 1..=QUAD_SEGMENTS {
                    let t = i as f32 / QUAD_SEGMENTS as f32;
                    let u = 1.0 - t;
                    let px = u * u * x0 + 2.0 * u * t * x1 + t * t * x;
                    let py = u * u * y0 + 2.0 * u * t * y1 + t * t * y;
                    current.push((px, py));
                }
                pen = (x, y);
            }
            PathCommand::CurveTo { x1, y1, x2, y2, x, y } => {
                let (x0, y0) = pen;
                for i in 1..=CUBIC_SEGMENTS {
                    let t = i as f32 / CUBIC_SEGMENTS as f32;
                    let u = 1.0 - t;
                    let px = u * u * u * x0
                        + 3.0 * u * u * t * x1
                        + 3.0 * u * t * t * x2
                        + t * t * t * x;
                    let py = u * u * u * y0
                        + 3.0 * u * u * t * y1
                        + 3.0 * u * t * t * y2
                        + t * t * t * y;
                    current.push((px, py));
                }
                pen = (x, y);
            }
            PathCommand::Close => {
                if !current.is_empty() {
                    pen = current[0];
                    contours.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        contours.push(current);
    }

    contours
}

/**
Fill flattened contours into a fresh `width x height` grayscale buffer.

Contour points map into the pixel grid as `px = scale * x + origin_x`,
`py = origin_y - scale * y` (the y-axis flips: fonts point up, rasters
point down). For each integer scanline the crossing edges are those with
`min(y1, y2) <= scanline < max(y1, y2)`; their intersections are sorted
and consecutive pairs become spans `max(0, floor(xa)) ..=
min(width - 1, ceil(xb))` of value 255.
*/
pub fn fill(
    contours: &[Vec<(f32, f32)>],
    scale: f32,
    origin_x: f32,
    origin_y: f32,
    width: u32,
    height: u32,
) -> GrayImage {
    let mut img = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return img;
    }

    let device: Vec<Vec<(f32, f32)>> = contours
        .iter()
        .map(|contour| {
            contour
                .iter()
                .map(|&(x, y)| (scale * x + origin_x, origin_y - scale * y))
                .collect()
        })
        .collect();

    let mut crossings: Vec<f32> = Vec::new();
    for scanline in 0..height {
        let yf = scanline as f32;
        crossings.clear();

        for contour in &device {
            if contour.len() < 2 {
                continue;
            }
            for i in 0..contour.len() {
                let (x1, y1) = contour[i];
                let (x2, y2) = contour[(i + 1) % contour.len()];
                if y1.min(y2) <= yf && yf < y1.max(y2) {
                    crossings.push(x1 + (yf - y1) * (x2 - x1) / (y2 - y1));
                }
            }
        }

        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for pair in crossings.chunks_exact(2) {
            let x_start = (pair[0].floor() as i64).max(0);
            let x_end = (pair[1].ceil() as i64).min(width as i64 - 1);
            for x in x_start..=x_end {
                img.put_pixel(x as u32, scanline, image::Luma([255]));
            }
        }
    }

    img
}
