use std::path::{Path, PathBuf};

/// Immutable inputs of one conversion run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub fps: u32,
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_path: output_path.into(),
            fps,
        }
    }

    /// Anchors the input directory at `cwd`. Absolute input paths are
    /// kept as given.
    pub fn resolve(mut self, cwd: &Path) -> Self {
        self.input_dir = cwd.join(&self.input_dir);
        self
    }
}
