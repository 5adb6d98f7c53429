use image::{ DynamicImage, RgbImage };
use tracing::debug;

pub mod candidate;
pub mod config;
pub mod error;
pub mod gmm;
pub mod grabcut;
pub mod image_process;
pub mod maxflow;
pub mod recognition;
pub mod utils;

pub use candidate::Rectangle;
pub use config::{ CannyThresholds, HsvRange, KernelSize, LocatorConfig };
pub use error::{ LprError, LprErrorKind };

/// Where the plate is, in the coordinates of the resized image.
#[derive(Debug, Clone)]
pub struct Located {
    pub region: Rectangle,
    /// the input at working width, `region` indexes into it
    pub resized: RgbImage,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub region: Rectangle,
    pub resized: RgbImage,
    /// `resized` with everything but the plate zeroed
    pub plate: RgbImage,
}

/// Single plate locator: morphology, color scoring and GrabCut.
#[derive(Debug, Clone, Default)]
pub struct PlateLocator {
    config: LocatorConfig,
}

impl PlateLocator {

    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Find the most plate like region of `img`.
    pub fn locate(&self, img: &DynamicImage) -> Result<Located, LprError> {
        let rgb = img.to_rgb8();
        debug!(width = rgb.width(), height = rgb.height(), "locating plate");
        let regions = image_process::extract_regions(&rgb, &self.config)?;
        let region = candidate::locate_license(&regions.binary, &regions.resized, &self.config)?;
        Ok(Located { region, resized: regions.resized })
    }

    /// Locate the plate and cut it out of its background.
    pub fn extract(&self, img: &DynamicImage) -> Result<Extraction, LprError> {
        let Located { region, resized } = self.locate(img)?;
        let plate = grabcut::cut_license(&resized, region, self.config.grabcut_iterations)?;
        Ok(Extraction { region, resized, plate })
    }
}
