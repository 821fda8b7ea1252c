use std::fs::File;
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::paths::{create_file, path_to_slash};

/// Zip every file under `folder` into `archive`, with forward-slash paths
/// relative to `folder`. The archive itself is skipped when it lives inside
/// the folder. Files that cannot be read are logged and left out.
///
/// Returns the number of files stored.
pub fn zip_folder_contents(folder: &Path, archive: &Path) -> Result<usize> {
    let file = create_file(archive)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut stored = 0;
    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("{}", Error::WalkDir(e));
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.path() == archive {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(folder) else {
            continue;
        };
        let name = path_to_slash(relative);

        match add_file(&mut zip, entry.path(), &name, options) {
            Ok(()) => stored += 1,
            Err(e) => log::warn!("{}: not archived: {}", entry.path().display(), e),
        }
    }

    zip.finish()?;
    log::debug!("Archived {} files into {}", stored, archive.display());
    Ok(stored)
}

fn add_file(zip: &mut ZipWriter<File>, path: &Path, name: &str, options: SimpleFileOptions) -> Result<()> {
    let mut source = File::open(path)?;
    zip.start_file(name, options)?;
    io::copy(&mut source, zip)?;
    Ok(())
}
