use std::path::Path;

use tracing::info;

use crate::error::Result;

/// Unpacks a measurement ZIP archive into `destination`, creating it if
/// needed. A corrupt or unreadable archive fails here, before any table
/// construction starts.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<()> {
    info!(
        "extracting {} to {}",
        archive.display(),
        destination.display()
    );
    std::fs::create_dir_all(destination)?;

    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let entries = zip.len();
    zip.extract(destination)?;

    info!("extraction complete ({entries} entries)");
    Ok(())
}
