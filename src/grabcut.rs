//! Foreground extraction seeded with a rectangle (GrabCut).
//!
//! Everything outside the rectangle is fixed background, everything inside
//! starts as probable foreground. Each round refits the two color models and
//! relabels the inside pixels with a minimum cut.

use image::{ Rgb, RgbImage };
use tracing::debug;

use crate::candidate::Rectangle;
use crate::error::LprError;
use crate::gmm::{ self, Color, Gmm };
use crate::maxflow::FlowGraph;

const GAMMA: f64 = 50.0;
// keeps -ln(likelihood) finite for colors no component explains
const MIN_LIKELIHOOD: f64 = 1e-300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskLabel {
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl MaskLabel {
    pub fn is_foreground(self) -> bool {
        matches!(self, MaskLabel::Foreground | MaskLabel::ProbableForeground)
    }
}

/// Per pixel labels, row major.
#[derive(Debug, Clone)]
pub struct CutMask {
    width: u32,
    height: u32,
    labels: Vec<MaskLabel>,
}

impl CutMask {
    pub fn label(&self, x: u32, y: u32) -> MaskLabel {
        self.labels[(y * self.width + x) as usize]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 0/1 view, background classes merged to 0 and foreground classes to 1.
    pub fn binary(&self) -> Vec<u8> {
        self.labels.iter().map(|l| l.is_foreground() as u8).collect()
    }

    pub fn foreground_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_foreground()).count()
    }
}

// (dx, dy) pairs of the 8-neighbourhood
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

fn colors(img: &RgbImage) -> Vec<Color> {
    img.pixels().map(|p| Color::new(p.0[0] as f64, p.0[1] as f64, p.0[2] as f64)).collect()
}

/// `1 / (2 * mean squared color difference)` over the 8-neighbour pairs.
fn beta(colors: &[Color], width: usize, height: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for y in 0..height {
        for x in 0..width {
            let c = &colors[y * width + x];
            // left, up-left, up, up-right covers every pair once
            for (dx, dy) in [(-1i64, 0i64), (-1, -1), (0, -1), (1, -1)] {
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if nx < 0 || ny < 0 || nx >= width as i64 {
                    continue;
                }
                sum += (c - colors[ny as usize * width + nx as usize]).norm_squared();
                count += 1;
            }
        }
    }
    if count == 0 || sum <= f64::EPSILON {
        0.0
    } else {
        1.0 / (2.0 * sum / count as f64)
    }
}

fn clip(rect: Rectangle, width: u32, height: u32) -> Option<Rectangle> {
    let x_max = rect.x_max.min(width);
    let y_max = rect.y_max.min(height);
    if rect.x_min >= x_max || rect.y_min >= y_max {
        return None;
    }
    Some(Rectangle::new(rect.x_min, rect.y_min, x_max, y_max))
}

/// Run `iterations` rounds of GrabCut on `img` seeded with `rect`.
///
/// `rect` covers columns `x_min..x_max` and rows `y_min..y_max`.
pub fn grab_cut(img: &RgbImage, rect: Rectangle, iterations: usize) -> Result<CutMask, LprError> {
    let (width, height) = img.dimensions();
    if iterations == 0 {
        return Err(LprError::segmentation("zero iterations"));
    }
    let rect = clip(rect, width, height)
        .ok_or_else(|| LprError::segmentation(format!("{:?} is empty inside a {}x{} image", rect, width, height)))?;
    let inside = |x: u32, y: u32| x >= rect.x_min && x < rect.x_max && y >= rect.y_min && y < rect.y_max;

    let (w, h) = (width as usize, height as usize);
    let colors = colors(img);
    let mut labels: Vec<MaskLabel> = (0..h * w).map(|i| {
        if inside((i % w) as u32, (i / w) as u32) { MaskLabel::ProbableForeground } else { MaskLabel::Background }
    }).collect();

    let split = |labels: &[MaskLabel]| -> (Vec<Color>, Vec<Color>) {
        let mut bg = Vec::new();
        let mut fg = Vec::new();
        for (c, l) in colors.iter().zip(labels) {
            if l.is_foreground() { fg.push(*c) } else { bg.push(*c) }
        }
        (bg, fg)
    };

    let (bg, fg) = split(&labels);
    if bg.len() < gmm::COMPONENTS || fg.len() < gmm::COMPONENTS {
        return Err(LprError::segmentation(format!(
            "{} background / {} foreground samples, {} needed each", bg.len(), fg.len(), gmm::COMPONENTS)));
    }
    let mut bg_gmm = Gmm::learn(&bg, &gmm::kmeans(&bg));
    let mut fg_gmm = Gmm::learn(&fg, &gmm::kmeans(&fg));

    let beta = beta(&colors, w, h);
    let (rx, ry) = (rect.x_min as usize, rect.y_min as usize);
    let (rw, rh) = (rect.width() as usize, rect.height() as usize);
    let node = |x: usize, y: usize| (y - ry) * rw + (x - rx);

    for round in 0..iterations {
        let (bg, fg) = split(&labels);
        if fg.is_empty() || bg.is_empty() {
            debug!(round, "one side of the cut is empty, stopping");
            break;
        }
        let bg_components: Vec<usize> = bg.iter().map(|c| bg_gmm.most_likely(c)).collect();
        let fg_components: Vec<usize> = fg.iter().map(|c| fg_gmm.most_likely(c)).collect();
        bg_gmm = Gmm::learn(&bg, &bg_components);
        fg_gmm = Gmm::learn(&fg, &fg_components);

        let mut graph = FlowGraph::new(rw * rh);
        for y in ry..ry + rh {
            for x in rx..rx + rw {
                let c = &colors[y * w + x];
                let from_source = -bg_gmm.likelihood(c).max(MIN_LIKELIHOOD).ln();
                let mut to_sink = -fg_gmm.likelihood(c).max(MIN_LIKELIHOOD).ln();
                for (dx, dy) in NEIGHBOURS {
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    let distance = if dx != 0 && dy != 0 { std::f64::consts::SQRT_2 } else { 1.0 };
                    let weight = GAMMA / distance * (-beta * (c - colors[ny * w + nx]).norm_squared()).exp();
                    if inside(nx as u32, ny as u32) {
                        // every inner pair once
                        if node(nx, ny) > node(x, y) {
                            graph.add_link(node(x, y), node(nx, ny), weight);
                        }
                    } else {
                        // neighbour is fixed background, labelling this pixel foreground pays the link
                        to_sink += weight;
                    }
                }
                graph.add_terminal_weights(node(x, y), from_source, to_sink);
            }
        }

        let flow = graph.max_flow();
        let source_side = graph.source_side();
        for y in ry..ry + rh {
            for x in rx..rx + rw {
                labels[y * w + x] = if source_side[node(x, y)] {
                    MaskLabel::ProbableForeground
                } else {
                    MaskLabel::ProbableBackground
                };
            }
        }
        debug!(round, flow, "cut refined");
    }

    Ok(CutMask { width, height, labels })
}

/// Zero every pixel the mask puts in the background.
pub fn apply_mask(img: &RgbImage, mask: &CutMask) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        if mask.label(x, y).is_foreground() { *img.get_pixel(x, y) } else { Rgb([0, 0, 0]) }
    })
}

/// Separate the plate inside `rect` from its surroundings.
pub fn cut_license(img: &RgbImage, rect: Rectangle, iterations: usize) -> Result<RgbImage, LprError> {
    let mask = grab_cut(img, rect, iterations)?;
    debug!(foreground = mask.foreground_count(), "plate segmented");
    Ok(apply_mask(img, &mask))
}
