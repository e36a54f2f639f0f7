use std::path::PathBuf;

use super::frame_file::FrameFile;
use crate::shared::error::ConvertError;

/// Orders frame paths by the numeric index in their names.
///
/// Every name is validated before sorting, so a single badly named file
/// fails the whole batch. Equal indices fall back to path order, which
/// keeps the result independent of directory listing order.
pub fn order(paths: Vec<PathBuf>) -> Result<Vec<FrameFile>, ConvertError> {
    let mut files = paths
        .into_iter()
        .map(FrameFile::from_path)
        .collect::<Result<Vec<_>, _>>()?;

    files.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(files)
}
