use image::{ GrayImage, ImageFormat, Rgb, RgbImage, imageops };
use imageproc::{ drawing, filter, rect::Rect };

use std::io::Cursor;

use crate::candidate::Rectangle;
use crate::error::LprError;

/// Initializes the tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Copy of `img` with `rect` outlined in green, two pixels wide.
pub fn draw_region(img: &RgbImage, rect: &Rectangle) -> RgbImage {
    let mut out = img.clone();
    let color = Rgb([0, 255, 0]);
    for inset in 0..2u32 {
        let width = rect.width().saturating_sub(2 * inset).max(1);
        let height = rect.height().saturating_sub(2 * inset).max(1);
        let outline = Rect::at((rect.x_min + inset) as i32, (rect.y_min + inset) as i32).of_size(width, height);
        drawing::draw_hollow_rect_mut(&mut out, outline, color);
    }
    out
}

/// Black and white version of a segmented plate, ready for character work.
///
/// Grayscale, 3x3 mean filter, then everything brighter than `threshold` is white.
pub fn binarize_plate(plate: &RgbImage, threshold: u8) -> GrayImage {
    let gray = imageops::grayscale(plate);
    let mut smoothed = filter::box_filter(&gray, 1, 1);
    smoothed.pixels_mut().for_each(|p| {
        p.0[0] = if p.0[0] > threshold { 255 } else { 0 };
    });
    smoothed
}

/// PNG bytes of `img`, what the recognition service is fed with.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, LprError> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(feature = "display-window")]
pub fn display_image(title: &str, img: &RgbImage) {
    let (width, height) = img.dimensions();
    imageproc::window::display_image(title, img, width, height);
}

#[cfg(test)]
mod test {

    use image::{ Rgb, RgbImage };

    use std::error::Error;

    use super::{ binarize_plate, draw_region, encode_png };
    use crate::candidate::Rectangle;

    #[test]
    fn region_outline_is_green() {
        let img = RgbImage::new(20, 20);
        let out = draw_region(&img, &Rectangle::new(2, 3, 12, 10));
        assert_eq!(*out.get_pixel(2, 3), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(3, 4), Rgb([0, 255, 0]));
        assert_eq!(*out.get_pixel(7, 6), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn plate_binarization_is_two_level() {
        let mut plate = RgbImage::from_pixel(12, 6, Rgb([20, 40, 200]));
        for y in 0..6 {
            for x in 4..8 {
                plate.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let binary = binarize_plate(&plate, 120);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(binary.get_pixel(5, 3).0[0], 255);
        assert_eq!(binary.get_pixel(0, 3).0[0], 0);
    }

    #[test]
    fn png_round_trip() -> Result<(), Box<dyn Error>> {
        let img = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let bytes = encode_png(&img)?;
        let decoded = image::load_from_memory(&bytes)?.to_rgb8();
        assert_eq!(decoded, img);
        Ok(())
    }
}
