use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use photomap_core::{Config, PhotoMap, Progress};

pub fn run(config: Config) -> Result<()> {
    let map = PhotoMap::new(config)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = map.run(Some(&mut |progress| match progress {
        Progress::Indexed { total, located } => {
            pb.println(format!("Found {total} images, {located} with location"));
        }
        Progress::PrepareStart { total } => {
            pb.set_length(total as u64);
            pb.set_position(0);
            pb.set_message("Resizing images...");
        }
        Progress::Prepared { label } => {
            pb.inc(1);
            pb.set_message(label);
        }
        Progress::Complete {
            placemarks,
            skipped,
        } => {
            let mut msg = format!("{placemarks} placemarks");
            if skipped > 0 {
                msg.push_str(&format!(", {skipped} without location skipped"));
            }
            pb.finish_with_message(msg);
        }
    }))?;

    println!("Map written to {}", report.document.display());
    if let Some(archive) = report.archive {
        println!("Archive written to {}", archive.display());
    }
    Ok(())
}
