use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::error::Error;

pub const BUNDLE_FILE_NAME: &str = "bus_routes.zip";

/// Bundles `files` into a deflated zip archive at `archive`, each stored
/// under its file name.
pub fn bundle(files: &[PathBuf], archive: &Path) -> Result<PathBuf, Error> {
    let mut zip = zip::ZipWriter::new(File::create(archive)?);
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Error(format!("{} has no file name", file.display())))?;
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        zip.write_all(&std::fs::read(file)?)?;
    }
    zip.finish()?;
    log::debug!("Bundled {} files into {}", files.len(), archive.display());
    Ok(archive.to_path_buf())
}

/// The file handed back to the requester: the only output when there is one,
/// otherwise a bundle of all outputs.
pub fn package(files: &[PathBuf], dir: &Path) -> Result<PathBuf, Error> {
    match files {
        [] => Err(Error::Error("no output files to package".to_string())),
        [single] => Ok(single.clone()),
        _ => bundle(files, &dir.join(BUNDLE_FILE_NAME)),
    }
}
