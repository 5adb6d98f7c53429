use std::error::Error;
use std::env::args;
use std::process;

use lpr_locate::{ PlateLocator, utils };

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = args();
    args.next();
    let path = args.next();
    let path = match path {
        Some(path) => path,
        None => {
            eprintln!("didn't get a image from args");
            process::exit(1);
        }
    };

    let lpr = PlateLocator::default();
    let img = image::open(path)?;
    let located = lpr.locate(&img)?;
    let rect = located.region;
    println!("region: {:?}, xywh: {:?}", rect, rect.to_xywh());
    let annotated = utils::draw_region(&located.resized, &rect);
    annotated.save("located.png")?;
    Ok(())
}
