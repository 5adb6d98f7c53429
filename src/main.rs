use clap::{ Arg, ArgAction, Command, value_parser };

use std::error::Error;

use lpr_locate::{ LocatorConfig, PlateLocator, utils };


fn main() -> Result<(), Box<dyn Error>>{
    utils::init_tracing();
    let matches = Command::new("LPR")
                    .version("0.1.0")
                    .author("kingrong")
                    .about("Locate a license plate and cut it out of the photo")
                    .arg(Arg::new("INPUT")
                        .help("image file with license plate")
                        .required(true)
                        .index(1))
                    .arg(Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("where the segmented plate is written")
                        .default_value("result.png"))
                    .arg(Arg::new("annotated")
                        .long("annotated")
                        .help("also write the resized input with the plate outlined"))
                    .arg(Arg::new("binary")
                        .long("binary")
                        .help("also write the black and white plate"))
                    .arg(Arg::new("resize-width")
                        .long("resize-width")
                        .value_parser(value_parser!(u32))
                        .help("working width of the pipeline"))
                    .arg(Arg::new("iterations")
                        .long("iterations")
                        .value_parser(value_parser!(usize))
                        .help("GrabCut refinement rounds"))
                    .arg(Arg::new("display")
                        .long("display")
                        .action(ArgAction::SetTrue)
                        .help("show the results in a window (needs the display-window feature)"))
                    .get_matches();
    let file_name = matches.get_one::<String>("INPUT").ok_or("image is required")?;

    let mut config = LocatorConfig::default();
    if let Some(width) = matches.get_one::<u32>("resize-width") {
        config = config.with_resize_width(*width);
    }
    if let Some(iterations) = matches.get_one::<usize>("iterations") {
        config = config.with_grabcut_iterations(*iterations);
    }

    let img = image::open(file_name)?;
    let lpr = PlateLocator::new(config);
    let res = lpr.extract(&img)?;
    let region = res.region;
    println!("plate: x_min={} y_min={} x_max={} y_max={}", region.x_min, region.y_min, region.x_max, region.y_max);

    let output = matches.get_one::<String>("output").ok_or("output is required")?;
    res.plate.save(output)?;
    if let Some(path) = matches.get_one::<String>("annotated") {
        utils::draw_region(&res.resized, &region).save(path)?;
    }
    if let Some(path) = matches.get_one::<String>("binary") {
        utils::binarize_plate(&res.plate, 120).save(path)?;
    }

    if matches.get_flag("display") {
        show(&utils::draw_region(&res.resized, &region), &res.plate);
    }

    Ok(())
}

#[cfg(feature = "display-window")]
fn show(annotated: &image::RgbImage, plate: &image::RgbImage) {
    utils::display_image("afterimg", annotated);
    utils::display_image("cutimg", plate);
}

#[cfg(not(feature = "display-window"))]
fn show(_annotated: &image::RgbImage, _plate: &image::RgbImage) {
    eprintln!("built without the display-window feature, nothing to show");
}
