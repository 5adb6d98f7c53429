//! Candidate boxes from the blob image and their color scoring.

use image::{ GrayImage, RgbImage };
use imageproc::contours::{ self, BorderType };
use imageproc::point::Point;
use palette::{ FromColor, Hsv, Srgb };
use tracing::{ debug, info, warn };

use crate::config::{ HsvRange, LocatorConfig };
use crate::error::{ LprError, LprErrorKind };

/// Axis aligned box, corners inclusive of the contour points that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl Rectangle {
    pub fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Self {
        Self {
            x_min: x_min.min(x_max),
            y_min: y_min.min(y_max),
            x_max: x_min.max(x_max),
            y_max: y_min.max(y_max),
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// box here is in a format of x,y,width,height
    pub fn to_xywh(&self) -> [u32; 4] {
        [self.x_min, self.y_min, self.width(), self.height()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rect: Rectangle,
    pub area: u64,
    /// width over height of the box, 0 for a flat box
    pub aspect: f32,
}

impl Candidate {
    pub fn from_rect(rect: Rectangle) -> Self {
        let aspect = if rect.height() == 0 {
            0.0
        } else {
            rect.width() as f32 / rect.height() as f32
        };
        Self { rect, area: rect.area(), aspect }
    }
}

/// Bounding box of a point set.
pub fn find_rectangle(points: &[Point<u32>]) -> Result<Rectangle, LprError> {
    let first = points.first().ok_or_else(|| LprError::degenerate("empty contour"))?;
    let init = Rectangle { x_min: first.x, y_min: first.y, x_max: first.x, y_max: first.y };
    let rect = points.iter().skip(1).fold(init, |r, p| Rectangle {
        x_min: r.x_min.min(p.x),
        y_min: r.y_min.min(p.y),
        x_max: r.x_max.max(p.x),
        y_max: r.y_max.max(p.y),
    });
    Ok(rect)
}

/// One candidate per external contour of `binary`.
pub fn find_candidates(binary: &GrayImage) -> Result<Vec<Candidate>, LprError> {
    contours::find_contours::<u32>(binary)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| find_rectangle(&c.points).map(Candidate::from_rect))
        .collect()
}

/// Keep the `n` largest candidates, still in ascending area order.
pub fn largest(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    candidates.sort_by_key(|c| c.area);
    let skip = candidates.len().saturating_sub(n);
    candidates.split_off(skip)
}

/// Number of pixels of `img` inside `rect` whose color falls in `range`.
pub fn color_score(img: &RgbImage, rect: &Rectangle, range: &HsvRange) -> u64 {
    let x_max = rect.x_max.min(img.width());
    let y_max = rect.y_max.min(img.height());
    let mut score = 0;
    for y in rect.y_min..y_max {
        for x in rect.x_min..x_max {
            let [r, g, b] = img.get_pixel(x, y).0;
            let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
            if range.contains(hsv.hue.into_positive_degrees(), hsv.saturation, hsv.value) {
                score += 1;
            }
        }
    }
    score
}

/// Best scoring candidate, `None` when nothing scores above zero.
///
/// Ties keep the earlier candidate.
pub fn select_best(scored: &[(Candidate, u64)]) -> Option<Candidate> {
    scored.iter()
        .filter(|(_, score)| *score > 0)
        .fold(None, |best: Option<&(Candidate, u64)>, item| match best {
            Some(b) if b.1 >= item.1 => Some(b),
            _ => Some(item),
        })
        .map(|(c, _)| *c)
}

/// Pick the region of `binary` that looks most like a plate in `color`.
pub fn locate_license(binary: &GrayImage, color: &RgbImage, config: &LocatorConfig) -> Result<Rectangle, LprError> {
    let candidates = find_candidates(binary)?;
    if candidates.is_empty() {
        return Err(LprError::degenerate("no candidate regions"));
    }
    debug!(count = candidates.len(), "external contours");

    let scored: Vec<(Candidate, u64)> = largest(candidates, config.top_candidates)
        .into_iter()
        .map(|c| (c, color_score(color, &c.rect, &config.plate_color)))
        .collect();
    for (c, score) in &scored {
        debug!(rect = ?c.rect, area = c.area, aspect = c.aspect, score, "scored candidate");
    }

    match select_best(&scored) {
        Some(best) => {
            info!(rect = ?best.rect, "plate region located");
            Ok(best.rect)
        }
        None => {
            warn!(candidates = scored.len(), "no candidate carries the plate color");
            Err(LprErrorKind::NoCandidateFound.into())
        }
    }
}
