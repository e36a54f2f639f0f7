use std::path::{Path, PathBuf};

use crate::shared::constants::SORT_KEY_SEPARATOR;
use crate::shared::error::ConvertError;

/// A collected frame path with the index parsed from its name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameFile {
    pub path: PathBuf,
    pub sort_key: i64,
}

impl FrameFile {
    pub fn from_path(path: PathBuf) -> Result<Self, ConvertError> {
        let sort_key = sort_key(&path)?;
        Ok(Self { path, sort_key })
    }
}

/// Parses the integer after the last `_` of the file stem.
///
/// `clip_12.ppm` -> 12, `a_b_-3.ppm` -> -3. A stem with no separator is
/// parsed whole, so `7.ppm` -> 7. Only the index has to be valid text;
/// the rest of the stem may hold any bytes. Whitespace around the index
/// is ignored.
pub fn sort_key(path: &Path) -> Result<i64, ConvertError> {
    let invalid = || ConvertError::FrameName {
        path: path.to_path_buf(),
    };

    let stem = path.file_stem().ok_or_else(invalid)?.to_string_lossy();
    let tail = stem.rsplit(SORT_KEY_SEPARATOR).next().unwrap_or(&stem);
    tail.trim().parse::<i64>().map_err(|_| invalid())
}
