/*!
Pure transforms over 8-bit grayscale glyph buffers.

Every operation takes a [`GrayImage`], returns a new one (no in-place
mutation), and is bit-for-bit deterministic: the container format is
consumed by firmware that was written against one exact rendition, so
rounding directions and pixel orderings here are part of the output
contract, not implementation detail.
*/

use image::{imageops, GrayImage, Luma};

use crate::config::Rotation;

/// Horizontal shear per row of height, matching a 12-degree slant.
const ITALIC_SLANT: f64 = 0.207;

/// Tight bounding box of the non-zero pixels of a pre-crop buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InkBox {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/**
Build the 256-entry lookup table for gamma correction:
`p' = round(255 * (p/255)^(1/gamma))`.

`gamma == 1.0` yields the identity table.
*/
pub fn gamma_lut(gamma: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let exponent = 1.0 / gamma;
    for (i, slot) in lut.iter_mut().enumerate() {
        let normalized = i as f64 / 255.0;
        *slot = (255.0 * normalized.powf(exponent)).round() as u8;
    }
    lut
}

/// Map every pixel through a gamma lookup table.
pub fn apply_gamma(img: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        p[0] = lut[p[0] as usize];
    }
    out
}

/**
One-pixel horizontal dilation: `p'[x, y] = max(p[x, y], p[x-1, y])`.

The result is one pixel wider so the rightmost column survives the
smear; height is unchanged.
*/
pub fn embolden(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    GrayImage::from_fn(w + 1, h, |x, y| {
        let here = if x < w { img.get_pixel(x, y)[0] } else { 0 };
        let west = if x > 0 { img.get_pixel(x - 1, y)[0] } else { 0 };
        Luma([here.max(west)])
    })
}

/**
Horizontal shear: row `y` moves right by `floor((height-1-y) * slant)`
pixels, so the top of the glyph leans furthest. The buffer grows by the
largest shift; vacated pixels are zero.
*/
pub fn italicize(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    if h == 0 {
        return img.clone();
    }
    let grow = ((h - 1) as f64 * ITALIC_SLANT).floor() as u32;
    let mut out = GrayImage::new(w + grow, h);
    for y in 0..h {
        let shift = ((h - 1 - y) as f64 * ITALIC_SLANT).floor() as u32;
        for x in 0..w {
            out.put_pixel(x + shift, y, *img.get_pixel(x, y));
        }
    }
    out
}

/// Rotate by an exact multiple of 90 degrees (clockwise).
pub fn rotate(img: &GrayImage, rotation: Rotation) -> GrayImage {
    match rotation {
        Rotation::None => img.clone(),
        Rotation::Cw90 => imageops::rotate90(img),
        Rotation::Cw180 => imageops::rotate180(img),
        Rotation::Cw270 => imageops::rotate270(img),
    }
}

/**
Cut the buffer down to the tight bounding box of its non-zero pixels.

The returned [`InkBox`] locates the sub-image within the input. An
all-zero input yields an empty buffer and a zeroed box.
*/
pub fn crop_to_ink(img: &GrayImage) -> (GrayImage, InkBox) {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut any = false;

    for (x, y, p) in img.enumerate_pixels() {
        if p[0] != 0 {
            any = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !any {
        return (GrayImage::new(0, 0), InkBox::default());
    }

    let ink = InkBox {
        top: min_y,
        left: min_x,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    };
    let cropped = GrayImage::from_fn(ink.width, ink.height, |x, y| {
        *img.get_pixel(ink.left + x, ink.top + y)
    });
    (cropped, ink)
}

/**
Grow width and height up to the next multiple of 8, padding the new
right and bottom edges with zero.
*/
pub fn pad_to_alignment(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    let (w8, h8) = (round_up_8(w), round_up_8(h));
    if (w8, h8) == (w, h) {
        return img.clone();
    }
    let mut out = GrayImage::new(w8, h8);
    for (x, y, p) in img.enumerate_pixels() {
        out.put_pixel(x, y, *p);
    }
    out
}

fn round_up_8(n: u32) -> u32 {
    (n + 7) & !7
}

/**
Pack the buffer down to `bits` bits per pixel (1, 2, 4, or 8), MSB
first within each byte, pixels in row-major order.

An 8-bit value `v` quantizes to `v >> (8 - bits)`. The pixel stream is
packed continuously; rows are not padded to byte boundaries (aligned
buffers have widths that are multiples of 8, so their rows end up
byte-aligned anyway; cropped buffers are expected to pack tight).
A trailing partial byte is zero-filled on its low bits.
*/
pub fn pack_bits(img: &GrayImage, bits: u8) -> Vec<u8> {
    debug_assert!(matches!(bits, 1 | 2 | 4 | 8));
    let total_bits = img.width() as usize * img.height() as usize * bits as usize;
    let mut out = Vec::with_capacity((total_bits + 7) / 8);

    let mut acc: u16 = 0;
    let mut filled: u32 = 0;
    for p in img.pixels() {
        let q = (p[0] >> (8 - bits)) as u16;
        acc = (acc << bits) | q;
        filled += u32::from(bits);
        if filled == 8 {
            out.push(acc as u8);
            acc = 0;
            filled = 0;
        }
    }
    if filled > 0 {
        out.push((acc << (8 - filled)) as u8);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(w: u32, h: u32, px: &[u8]) -> GrayImage {
        GrayImage::from_raw(w, h, px.to_vec()).unwrap()
    }

    #[test]
    fn gamma_identity_and_endpoints() {
        let identity = gamma_lut(1.0);
        for (i, v) in identity.iter().enumerate() {
            assert_eq!(*v as usize, i);
        }

        for g in [0.1, 0.5, 2.2, 5.0] {
            let lut = gamma_lut(g);
            assert_eq!(lut[0], 0);
            assert_eq!(lut[255], 255);
            // monotone non-decreasing
            for i in 1..256 {
                assert!(lut[i] >= lut[i - 1]);
            }
        }

        // spot value: 255 * (128/255)^(1/2.2) rounds to 186
        assert_eq!(gamma_lut(2.2)[128], 186);
    }

    #[test]
    fn gamma_applies_per_pixel() {
        let img = gray(2, 1, &[0, 128]);
        let out = apply_gamma(&img, &gamma_lut(2.2));
        assert_eq!(out.as_raw(), &vec![0, 186]);
    }

    #[test]
    fn bold_widens_and_smears_right() {
        let img = gray(3, 2, &[9, 0, 5, 0, 7, 0]);
        let out = embolden(&img);
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.as_raw(), &vec![9, 9, 5, 5, 0, 7, 7, 0]);
    }

    #[test]
    fn italic_shears_by_row() {
        // height 16: grow = floor(15 * 0.207) = 3
        let img = gray(1, 16, &[255; 16]);
        let out = italicize(&img);
        assert_eq!(out.dimensions(), (4, 16));
        // row 0 shifts by floor(15 * 0.207) = 3, row 15 by 0
        assert_eq!(out.get_pixel(3, 0)[0], 255);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(0, 15)[0], 255);
        // row 5: floor(10 * 0.207) = 2
        assert_eq!(out.get_pixel(2, 5)[0], 255);
        assert_eq!(out.get_pixel(1, 5)[0], 0);
        assert_eq!(out.get_pixel(3, 5)[0], 0);
    }

    #[test]
    fn short_glyphs_do_not_shear() {
        // floor((5-1-y) * 0.207) is 0 for every row of a 5-tall buffer
        let img = gray(2, 5, &[1; 10]);
        let out = italicize(&img);
        assert_eq!(out.dimensions(), (2, 5));
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn rotations_permute_exactly() {
        let img = gray(3, 2, &[1, 2, 3, 4, 5, 6]);

        let r90 = rotate(&img, Rotation::Cw90);
        assert_eq!(r90.dimensions(), (2, 3));
        assert_eq!(r90.as_raw(), &vec![4, 1, 5, 2, 6, 3]);

        let r180 = rotate(&img, Rotation::Cw180);
        assert_eq!(r180.dimensions(), (3, 2));
        assert_eq!(r180.as_raw(), &vec![6, 5, 4, 3, 2, 1]);

        let r270 = rotate(&img, Rotation::Cw270);
        assert_eq!(r270.dimensions(), (2, 3));
        assert_eq!(r270.as_raw(), &vec![3, 6, 2, 5, 1, 4]);

        let r0 = rotate(&img, Rotation::None);
        assert_eq!(r0.as_raw(), img.as_raw());
    }

    #[test]
    fn crop_finds_the_ink_box() {
        #[rustfmt::skip]
        let img = gray(4, 4, &[
            0, 0, 0, 0,
            0, 8, 0, 0,
            0, 3, 9, 0,
            0, 0, 0, 0,
        ]);
        let (out, ink) = crop_to_ink(&img);
        assert_eq!(
            ink,
            InkBox { top: 1, left: 1, width: 2, height: 2 }
        );
        assert_eq!(out.as_raw(), &vec![8, 0, 3, 9]);
    }

    #[test]
    fn crop_of_blank_is_empty() {
        let img = GrayImage::new(5, 3);
        let (out, ink) = crop_to_ink(&img);
        assert_eq!(ink, InkBox::default());
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn padding_rounds_up_to_eight() {
        let img = gray(3, 2, &[1, 2, 3, 4, 5, 6]);
        let out = pad_to_alignment(&img);
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out.get_pixel(0, 0)[0], 1);
        assert_eq!(out.get_pixel(2, 1)[0], 6);
        assert_eq!(out.get_pixel(3, 0)[0], 0);
        assert_eq!(out.get_pixel(0, 2)[0], 0);

        let aligned = gray(8, 8, &[7; 64]);
        let out = pad_to_alignment(&aligned);
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out.as_raw(), aligned.as_raw());

        assert_eq!(pad_to_alignment(&gray(9, 1, &[0; 9])).dimensions(), (16, 8));
    }

    #[test]
    fn packing_is_msb_first() {
        // 1 bpp: pixels quantize to their top bit
        let img = gray(8, 1, &[255, 0, 200, 10, 128, 127, 255, 0]);
        assert_eq!(pack_bits(&img, 1), vec![0b1010_1010]);

        // 2 bpp: top two bits per pixel
        let img = gray(4, 1, &[0b1100_0000, 0b0100_0000, 0b1000_0000, 0]);
        assert_eq!(pack_bits(&img, 2), vec![0b1101_1000]);

        // 4 bpp
        let img = gray(2, 1, &[0xAB, 0xCD]);
        assert_eq!(pack_bits(&img, 4), vec![0xAC]);

        // 8 bpp is a copy
        let img = gray(2, 2, &[1, 2, 3, 4]);
        assert_eq!(pack_bits(&img, 8), vec![1, 2, 3, 4]);
    }

    #[test]
    fn packing_crosses_rows_without_padding() {
        // 3 wide at 2 bpp: 6 bits per row, rows share bytes
        let img = gray(3, 2, &[255, 0, 255, 0, 255, 0]);
        // pixels: 11 00 11 | 00 11 00 -> 1100 1100 1100 0000
        assert_eq!(pack_bits(&img, 2), vec![0b1100_1100, 0b1100_0000]);
    }
}
