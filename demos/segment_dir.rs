use std::error::Error;
use std::env::args;
use std::fs;
use std::process;
use std::time::SystemTime;

use lpr_locate::{ LprErrorKind, PlateLocator };

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = args();
    args.next();
    let path = args.next();
    let path = match path {
        Some(path) => path,
        None => {
            eprintln!("didn't get a image dir from args");
            process::exit(1);
        }
    };
    let lpr = PlateLocator::default();
    let dir = fs::read_dir(path)?;

    let mut speeds = Vec::new();
    let mut total_amount = 0;
    let mut no_candidate = 0;
    for entry in dir.flatten() {
        let path = entry.path();
        let is_image = path.extension()
            .map(|ext| ext == "jpg" || ext == "png")
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        total_amount += 1;
        let before_time = SystemTime::now();
        let img = image::open(&path)?;
        let res = lpr.extract(&img);
        let speed = SystemTime::now().duration_since(before_time)?.as_millis();
        match res {
            Ok(res) => {
                speeds.push(speed);
                println!("file: {:?}, region: {:?}, speed: {}", path, res.region, speed);
            }
            Err(e) => {
                if let LprErrorKind::NoCandidateFound = e.kind() {
                    no_candidate += 1;
                }
                println!("file: {:?}, failed: {}", path, e);
            }
        }
    }
    let average_speed = speeds.iter().sum::<u128>() / speeds.len().max(1) as u128;
    println!("total_amount: {}, success: {}, no_candidate: {}, average_speed: {}",
        total_amount, speeds.len(), no_candidate, average_speed);
    Ok(())
}
