use image::{ DynamicImage, Rgb, RgbImage };
use imageproc::{ drawing, rect::Rect };

use std::error::Error;

use lpr_locate::{ LocatorConfig, LprErrorKind, PlateLocator, Rectangle };

const GREEN: Rgb<u8> = Rgb([30, 150, 40]);
const BLUE: Rgb<u8> = Rgb([20, 40, 200]);
const RED: Rgb<u8> = Rgb([210, 30, 30]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// 400x300 green scene (times `scale`) with a 160x50 plate at (120, 130),
/// white and black vertical stripes standing in for characters.
fn scene(plate: Rgb<u8>, scale: u32) -> RgbImage {
    let s = |v: u32| v * scale;
    let mut img = RgbImage::from_pixel(s(400), s(300), GREEN);
    drawing::draw_filled_rect_mut(&mut img, Rect::at(s(120) as i32, s(130) as i32).of_size(s(160), s(50)), plate);
    for k in 0..=10 {
        let x = 122 + 15 * k;
        drawing::draw_filled_rect_mut(&mut img, Rect::at(s(x) as i32, s(130) as i32).of_size(s(6), s(50)), WHITE);
        if k < 10 {
            drawing::draw_filled_rect_mut(&mut img, Rect::at(s(x + 8) as i32, s(130) as i32).of_size(s(5), s(50)), BLACK);
        }
    }
    img
}

/// Same plate with `stroke` px wide white characters, as thin as real
/// characters get at the 400 px working width. Strokes start at x = 123,
/// 15 px apart, the last one ends at 273 + `stroke`.
fn thin_stroke_scene(stroke: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 300, GREEN);
    drawing::draw_filled_rect_mut(&mut img, Rect::at(120, 130).of_size(160, 50), BLUE);
    for k in 0..=10 {
        drawing::draw_filled_rect_mut(&mut img, Rect::at(123 + 15 * k, 130).of_size(stroke, 50), WHITE);
    }
    img
}

fn assert_close(found: Rectangle, expected: Rectangle, tolerance: u32) {
    let pairs = [
        (found.x_min, expected.x_min),
        (found.y_min, expected.y_min),
        (found.x_max, expected.x_max),
        (found.y_max, expected.y_max),
    ];
    for (a, b) in pairs {
        assert!(a.abs_diff(b) <= tolerance, "found {:?}, expected {:?}", found, expected);
    }
}

#[test]
fn locates_striped_blue_plate() -> Result<(), Box<dyn Error>> {
    let img = DynamicImage::ImageRgb8(scene(BLUE, 1));
    let located = PlateLocator::default().locate(&img)?;
    assert_eq!(located.resized.dimensions(), (400, 300));
    assert_close(located.region, Rectangle::new(120, 130, 280, 180), 4);
    Ok(())
}

#[test]
fn locates_plate_after_resize() -> Result<(), Box<dyn Error>> {
    let img = DynamicImage::ImageRgb8(scene(BLUE, 2));
    let located = PlateLocator::default().locate(&img)?;
    assert_eq!(located.resized.dimensions(), (400, 300));
    assert_close(located.region, Rectangle::new(120, 130, 280, 180), 8);
    Ok(())
}

#[test]
fn locates_plate_with_thin_strokes() -> Result<(), Box<dyn Error>> {
    for stroke in [1, 2] {
        let img = DynamicImage::ImageRgb8(thin_stroke_scene(stroke));
        let located = PlateLocator::default().locate(&img)?;
        // the blob spans the character band, from the first stroke to the last
        assert_close(located.region, Rectangle::new(123, 130, 273 + stroke, 180), 4);
    }
    Ok(())
}

#[test]
fn extraction_keeps_only_the_plate_region() -> Result<(), Box<dyn Error>> {
    let img = DynamicImage::ImageRgb8(scene(BLUE, 1));
    let res = PlateLocator::default().extract(&img)?;
    let region = res.region;
    let mut kept = 0;
    for (x, y, p) in res.plate.enumerate_pixels() {
        let inside = x >= region.x_min && x < region.x_max && y >= region.y_min && y < region.y_max;
        if !inside {
            assert_eq!(*p, BLACK, "pixel ({}, {}) outside the region survived", x, y);
        } else if *p != BLACK {
            assert_eq!(p, res.resized.get_pixel(x, y));
            kept += 1;
        }
    }
    assert!(kept > 0);
    Ok(())
}

#[test]
fn red_plate_has_no_candidate() {
    let img = DynamicImage::ImageRgb8(scene(RED, 1));
    let err = PlateLocator::default().locate(&img).unwrap_err();
    assert!(matches!(err.kind(), LprErrorKind::NoCandidateFound));
}

#[test]
fn red_plate_found_with_red_reference() -> Result<(), Box<dyn Error>> {
    let red = lpr_locate::HsvRange { hue_min: 0.0, hue_max: 20.0, min_saturation: 0.2, min_value: 0.2 };
    let locator = PlateLocator::new(LocatorConfig::default().with_plate_color(red));
    let img = DynamicImage::ImageRgb8(scene(RED, 1));
    let located = locator.locate(&img)?;
    assert_close(located.region, Rectangle::new(120, 130, 280, 180), 4);
    Ok(())
}

#[test]
fn flat_image_is_degenerate() {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, GREEN));
    let err = PlateLocator::default().extract(&img).unwrap_err();
    assert!(err.is_degenerate());
}
