//! Prints per-cloud extents of a recorded archive and optionally exports
//! colour and depth preview images.
use constants::capture::STRIDE;
use constants::sensor::{DEPTH_HEIGHT, DEPTH_WIDTH};
use point_cloud_recorder::archive::read_clouds;
use point_cloud_recorder::bounds::CloudBounds;
use point_cloud_recorder::image_export::export_images;
use point_cloud_recorder::ply_reader::read_ply;
use point_cloud_recorder::progress::progress_bar;
use point_cloud_recorder::projector::sampled_grid;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 && args.len() != 3 {
        eprintln!("Usage: {} <archive.zip> [image-dir]", args[0]);
        std::process::exit(1);
    }

    let archive_path = Path::new(&args[1]);
    let image_dir = args.get(2).map(Path::new);

    let clouds = read_clouds(BufReader::new(File::open(archive_path)?))?;
    println!("{}: {} clouds", archive_path.display(), clouds.len());

    let (width, height) = sampled_grid(DEPTH_WIDTH, DEPTH_HEIGHT, STRIDE);
    let pb = image_dir.map(|_| progress_bar(clouds.len(), "clouds", "Exporting images"));

    let mut overall = CloudBounds::new();
    for (id, (name, text)) in clouds.iter().enumerate() {
        let frame = read_ply(text)?;
        let bounds = CloudBounds::from_frame(&frame);

        if bounds.is_empty() {
            println!("  {}: {} points, none valid", name, frame.vertex_count());
        } else {
            let (dx, dy, dz) = bounds.dimensions();
            println!(
                "  {}: {} points ({} valid), x {:.3}..{:.3}, y {:.3}..{:.3}, z {:.3}..{:.3}, extent {:.3} x {:.3} x {:.3}",
                name,
                frame.vertex_count(),
                bounds.valid_points,
                bounds.min_x,
                bounds.max_x,
                bounds.min_y,
                bounds.max_y,
                bounds.min_z,
                bounds.max_z,
                dx,
                dy,
                dz
            );
        }
        overall = overall.merge(bounds);

        if let (Some(dir), Some(pb)) = (image_dir, &pb) {
            if let Err(err) = export_images(&frame, width, height, dir, id) {
                log::warn!("Skipping images for {name}: {err}");
            }
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Images exported");
    }

    if !overall.is_empty() {
        println!(
            "Archive bounds: x {:.3}..{:.3}, y {:.3}..{:.3}, z {:.3}..{:.3} ({} valid points)",
            overall.min_x,
            overall.max_x,
            overall.min_y,
            overall.max_y,
            overall.min_z,
            overall.max_z,
            overall.valid_points
        );
    }

    Ok(())
}
