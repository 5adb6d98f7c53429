//! Tunable parameters of the locating pipeline.
//!
//! The defaults reproduce the classic blue-plate setup: a 400 px working
//! width, a radius 16 disk for the top-hat opening, 19x5 / 5x11 flat kernels
//! for shaping blobs and five GrabCut rounds.

/// Width and height of a flat rectangular structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSize {
    pub width: u8,
    pub height: u8,
}

impl KernelSize {
    pub const fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }
}

/// How the Canny hysteresis thresholds are chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CannyThresholds {
    /// use the working image's height and width, smaller one as the low threshold
    ImageDimensions,
    Fixed { low: f32, high: f32 },
}

impl CannyThresholds {
    /// (low, high) for an image of the given size.
    pub fn resolve(&self, width: u32, height: u32) -> (f32, f32) {
        match *self {
            CannyThresholds::ImageDimensions => {
                let (a, b) = (height as f32, width as f32);
                (a.min(b), a.max(b))
            }
            CannyThresholds::Fixed { low, high } => (low.min(high), low.max(high)),
        }
    }
}

/// HSV box a plate pixel has to fall in.
///
/// Hue is in degrees `[0, 360)` and the hue interval is half open
/// `[hue_min, hue_max)`. Saturation and value are in `[0, 1]`, their
/// minimums inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvRange {
    pub hue_min: f32,
    pub hue_max: f32,
    pub min_saturation: f32,
    pub min_value: f32,
}

impl HsvRange {
    /// Blue plates. OpenCV's 8 bit `H 100..=140, S >= 50, V >= 50` stores
    /// `round(h / 2)` and `round(255 * s)`, so its box reaches half a step
    /// past each bound.
    pub const BLUE: HsvRange = HsvRange {
        hue_min: 199.0,
        hue_max: 281.0,
        min_saturation: 49.5 / 255.0,
        min_value: 49.5 / 255.0,
    };

    pub fn contains(&self, hue: f32, saturation: f32, value: f32) -> bool {
        hue >= self.hue_min && hue < self.hue_max
            && saturation >= self.min_saturation
            && value >= self.min_value
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        Self::BLUE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    /// working width every input is resized to
    pub resize_width: u32,
    /// radius of the disk used by the top-hat opening
    pub opening_radius: u8,
    pub canny: CannyThresholds,
    /// closes gaps between character edges, then opens away thin noise
    pub close_kernel: KernelSize,
    /// second opening, drops blobs that are too flat
    pub tall_kernel: KernelSize,
    /// how many of the largest blobs get color scored
    pub top_candidates: usize,
    pub plate_color: HsvRange,
    pub grabcut_iterations: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            resize_width: 400,
            opening_radius: 16,
            canny: CannyThresholds::ImageDimensions,
            close_kernel: KernelSize::new(19, 5),
            tall_kernel: KernelSize::new(5, 11),
            top_candidates: 3,
            plate_color: HsvRange::BLUE,
            grabcut_iterations: 5,
        }
    }
}

impl LocatorConfig {
    pub fn with_resize_width(mut self, resize_width: u32) -> Self {
        self.resize_width = resize_width;
        self
    }

    pub fn with_opening_radius(mut self, opening_radius: u8) -> Self {
        self.opening_radius = opening_radius;
        self
    }

    pub fn with_canny(mut self, canny: CannyThresholds) -> Self {
        self.canny = canny;
        self
    }

    pub fn with_kernels(mut self, close_kernel: KernelSize, tall_kernel: KernelSize) -> Self {
        self.close_kernel = close_kernel;
        self.tall_kernel = tall_kernel;
        self
    }

    pub fn with_top_candidates(mut self, top_candidates: usize) -> Self {
        self.top_candidates = top_candidates;
        self
    }

    pub fn with_plate_color(mut self, plate_color: HsvRange) -> Self {
        self.plate_color = plate_color;
        self
    }

    pub fn with_grabcut_iterations(mut self, iterations: usize) -> Self {
        self.grabcut_iterations = iterations;
        self
    }
}

#[cfg(test)]
mod test {

    use super::{CannyThresholds, HsvRange, KernelSize, LocatorConfig};

    #[test]
    fn canny_thresholds_follow_image_size() {
        let canny = CannyThresholds::ImageDimensions;
        assert_eq!(canny.resolve(400, 300), (300.0, 400.0));
        // portrait input swaps, low stays the smaller one
        assert_eq!(canny.resolve(400, 600), (400.0, 600.0));
        let fixed = CannyThresholds::Fixed { low: 90.0, high: 30.0 };
        assert_eq!(fixed.resolve(1, 1), (30.0, 90.0));
    }

    #[test]
    fn blue_range_matches_rounded_opencv_box() {
        let blue = HsvRange::BLUE;
        // H = round(h / 2) is 100 at 199 degrees and 140 just below 281
        assert!(blue.contains(199.0, 1.0, 1.0));
        assert!(blue.contains(280.9, 1.0, 1.0));
        assert!(!blue.contains(198.9, 1.0, 1.0));
        assert!(!blue.contains(281.0, 1.0, 1.0));
        // S = round(255 * s) reaches 50 from 49.5 / 255
        assert!(blue.contains(240.0, 49.5 / 255.0, 49.5 / 255.0));
        assert!(!blue.contains(240.0, 49.0 / 255.0, 1.0));
        assert!(!blue.contains(240.0, 1.0, 49.0 / 255.0));
        assert!(!blue.contains(120.0, 1.0, 1.0));
        assert!(!blue.contains(240.0, 0.1, 1.0));
        assert!(!blue.contains(240.0, 1.0, 0.1));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = LocatorConfig::default()
            .with_resize_width(640)
            .with_grabcut_iterations(2);
        assert_eq!(config.resize_width, 640);
        assert_eq!(config.grabcut_iterations, 2);
        assert_eq!(config.opening_radius, 16);
        assert_eq!(config.top_candidates, 3);

        let config = LocatorConfig::default()
            .with_opening_radius(8)
            .with_canny(CannyThresholds::Fixed { low: 50.0, high: 150.0 })
            .with_kernels(KernelSize::new(9, 3), KernelSize::new(3, 7))
            .with_top_candidates(5);
        assert_eq!(config.opening_radius, 8);
        assert_eq!(config.canny.resolve(400, 300), (50.0, 150.0));
        assert_eq!(config.close_kernel, KernelSize::new(9, 3));
        assert_eq!(config.tall_kernel, KernelSize::new(3, 7));
        assert_eq!(config.top_candidates, 5);
        assert_eq!(config.resize_width, 400);
        assert_eq!(config.plate_color, HsvRange::BLUE);
    }
}
