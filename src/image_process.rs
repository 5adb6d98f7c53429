//! Grayscale preprocessing and the morphology chain that turns a photo into
//! plate shaped blobs.

use image::{ GrayImage, RgbImage, Luma, imageops::{ self, FilterType } };
use imageproc::{ gradients, morphology::{ self, Mask } };
use tracing::debug;

use crate::config::{ KernelSize, LocatorConfig };
use crate::error::LprError;

/// Output of the morphology chain.
#[derive(Debug, Clone)]
pub struct Regions {
    /// white connected components are plate shaped candidates
    pub binary: GrayImage,
    /// the color input at working size, candidates index into it
    pub resized: RgbImage,
}

fn min_max(img: &GrayImage) -> Option<(u8, u8)> {
    img.pixels().fold(None, |acc, p| {
        let v = p.0[0];
        match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }
    })
}

/// Stretch the intensities of `img` in place so they span 0..=255.
///
/// A constant (or empty) image has no range to stretch and is reported as
/// degenerate, the buffer is left untouched in that case.
pub fn stretch(img: &mut GrayImage) -> Result<(), LprError> {
    let (min, max) = min_max(img).ok_or_else(|| LprError::degenerate("empty image"))?;
    if max == min {
        return Err(LprError::degenerate(format!("constant intensity {}", min)));
    }
    let range = (max - min) as u32;
    img.pixels_mut().for_each(|p| {
        let v = (p.0[0] - min) as u32;
        p.0[0] = (255 * v / range) as u8;
    });
    Ok(())
}

/// Two level image split at the midpoint between the darkest and brightest sample.
pub fn binarize(img: &GrayImage) -> GrayImage {
    let (min, max) = min_max(img).unwrap_or((0, 0));
    let threshold = max as f32 - (max as f32 - min as f32) / 2.0;
    let mut out = GrayImage::new(img.width(), img.height());
    out.pixels_mut().zip(img.pixels()).for_each(|(o, p)| {
        o.0[0] = if p.0[0] as f32 >= threshold { 255 } else { 0 };
    });
    out
}

pub fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    out.pixels_mut().zip(a.pixels().zip(b.pixels())).for_each(|(o, (pa, pb))| {
        *o = Luma([pa.0[0].abs_diff(pb.0[0])]);
    });
    out
}

// tan(22.5°) and tan(67.5°), bounds of the horizontal and vertical sectors
const TAN_22_5: f32 = 0.414_213_56;
const TAN_67_5: f32 = 2.414_213_6;

/// Canny edges of `img`, edge pixels 255 and the rest 0.
///
/// There is no Gaussian pre-blur and the gradient magnitude is the L1 norm
/// `|gx| + |gy|` of the 3x3 Sobel responses, so `low` and `high` are on a
/// 0..=2040 scale. A pixel above `high` that survives non-maximum
/// suppression seeds an edge, which then grows through 8-connected
/// survivors above `low`.
pub fn canny(img: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let gx = gradients::horizontal_sobel(img);
    let gy = gradients::vertical_sobel(img);
    let grad: Vec<(f32, f32)> = gx.pixels().zip(gy.pixels())
        .map(|(x, y)| (x.0[0] as f32, y.0[0] as f32))
        .collect();
    let magnitude: Vec<f32> = grad.iter().map(|(x, y)| x.abs() + y.abs()).collect();
    let at = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0.0
        } else {
            magnitude[y as usize * w + x as usize]
        }
    };

    let mut edges = GrayImage::new(width, height);
    let mut weak = vec![false; w * h];
    let mut stack = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = magnitude[i];
            if m <= low {
                continue;
            }
            let (dx, dy) = grad[i];
            let (ax, ay) = (dx.abs(), dy.abs());
            let (xi, yi) = (x as i64, y as i64);
            // one side strict, the other not, so a plateau keeps exactly one pixel
            let is_max = if ay <= ax * TAN_22_5 {
                m > at(xi - 1, yi) && m >= at(xi + 1, yi)
            } else if ay >= ax * TAN_67_5 {
                m > at(xi, yi - 1) && m >= at(xi, yi + 1)
            } else if (dx > 0.0) == (dy > 0.0) {
                m > at(xi - 1, yi - 1) && m > at(xi + 1, yi + 1)
            } else {
                m > at(xi + 1, yi - 1) && m > at(xi - 1, yi + 1)
            };
            if !is_max {
                continue;
            }
            if m > high {
                edges.put_pixel(x as u32, y as u32, Luma([255]));
                stack.push((x, y));
            } else {
                weak[i] = true;
            }
        }
    }

    // hysteresis
    while let Some((x, y)) = stack.pop() {
        for ny in y.saturating_sub(1)..(y + 2).min(h) {
            for nx in x.saturating_sub(1)..(x + 2).min(w) {
                let i = ny * w + nx;
                if weak[i] {
                    weak[i] = false;
                    edges.put_pixel(nx as u32, ny as u32, Luma([255]));
                    stack.push((nx, ny));
                }
            }
        }
    }
    edges
}

/// Flat structuring element of the given size, anchored at its center.
pub fn rect_mask(size: KernelSize) -> Mask {
    let width = size.width.max(1);
    let height = size.height.max(1);
    let kernel = GrayImage::from_pixel(width as u32, height as u32, Luma([255]));
    Mask::from_image(&kernel, width / 2, height / 2)
}

/// Resize `img` to `width` keeping the aspect ratio.
pub fn resize_to_width(img: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w == width || w == 0 {
        return img.clone();
    }
    let height = ((width as u64 * h as u64) / w as u64).max(1) as u32;
    imageops::resize(img, width, height, FilterType::CatmullRom)
}

/// Run the fixed open, diff, binarize, canny, close, open, open chain.
pub fn extract_regions(img: &RgbImage, config: &LocatorConfig) -> Result<Regions, LprError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(LprError::degenerate("empty image"));
    }
    let resized = resize_to_width(img, config.resize_width);
    let (width, height) = resized.dimensions();
    debug!(width, height, "resized input");

    let mut gray = imageops::grayscale(&resized);
    stretch(&mut gray)?;

    // top-hat: what the disk opening removes are the thin bright strokes
    let disk = Mask::disk(config.opening_radius);
    let opened = morphology::grayscale_open(&gray, &disk);
    let strokes = abs_diff(&gray, &opened);
    let binary = binarize(&strokes);

    let (low, high) = config.canny.resolve(width, height);
    let edges = canny(&binary, low, high);
    debug!(low, high, "canny thresholds");

    let flat = rect_mask(config.close_kernel);
    let closed = morphology::grayscale_close(&edges, &flat);
    let opened = morphology::grayscale_open(&closed, &flat);
    let tall = rect_mask(config.tall_kernel);
    let binary = morphology::grayscale_open(&opened, &tall);

    Ok(Regions { binary, resized })
}
