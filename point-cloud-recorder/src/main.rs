//! Depth sensor recorder entry point
use point_cloud_recorder::archive::archive_file_name;
use point_cloud_recorder::synthetic::default_sensor;
use point_cloud_recorder::{RecorderConfig, run};
use std::io::BufRead;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut sensor = default_sensor()?;
    let archive_name = archive_file_name(chrono::Local::now().date_naive());

    // Enter on the console stops the recording. EOF counts as Enter.
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
            let _ = stop_tx.send(());
        })?;

    let config = RecorderConfig::default();
    println!(
        "Recording to {} (at most {} frames)",
        archive_name, config.max_frames
    );
    println!("Press Enter to stop recording..");

    let output = run(&mut sensor, config, Path::new("."), &archive_name, &stop_rx)?;

    println!(
        "Done: {} frames recorded, {} clouds written to {}",
        output.frames_recorded,
        output.clouds_written,
        output.archive_path.display()
    );
    Ok(())
}
