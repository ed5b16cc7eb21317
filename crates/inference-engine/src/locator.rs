//! Model directory discovery

use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the artifact directory
pub const MODELS_DIR_ENV: &str = "MODELS_DIR";
/// Directory name searched for around the executable
pub const MODELS_DIR_NAME: &str = "Models";

/// How many ancestors of the executable directory are probed
const MAX_ANCESTOR_DEPTH: usize = 6;

/// Searches the usual places for the model artifact directory.
///
/// Order, first existing directory wins:
/// 1. explicit override (`MODELS_DIR`)
/// 2. `<anchor>/../../Models`
/// 3. `<ancestor>/Models` for the anchor and up to five of its parents
/// 4. `<working dir>/Models`
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocator {
    override_dir: Option<PathBuf>,
    anchor: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl ArtifactLocator {
    /// Locator anchored at the running executable's directory
    pub fn from_env() -> Self {
        Self {
            override_dir: std::env::var_os(MODELS_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            anchor: std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
            working_dir: std::env::current_dir().ok(),
        }
    }

    pub fn with_override(mut self, dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    pub fn with_anchor(mut self, dir: impl Into<PathBuf>) -> Self {
        self.anchor = Some(dir.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Candidate directories in search order, labelled by source
    pub fn candidates(&self) -> Vec<(&'static str, PathBuf)> {
        let mut candidates = Vec::new();
        if let Some(dir) = &self.override_dir {
            candidates.push(("override", dir.clone()));
        }
        if let Some(anchor) = &self.anchor {
            candidates.push(("relative", anchor.join("..").join("..").join(MODELS_DIR_NAME)));
            for ancestor in anchor.ancestors().take(MAX_ANCESTOR_DEPTH) {
                candidates.push(("ancestor", ancestor.join(MODELS_DIR_NAME)));
            }
        }
        if let Some(cwd) = &self.working_dir {
            candidates.push(("working_dir", cwd.join(MODELS_DIR_NAME)));
        }
        candidates
    }

    /// First candidate that is an existing directory
    pub fn locate(&self) -> Option<PathBuf> {
        self.candidates()
            .into_iter()
            .find(|(_, path)| path.is_dir())
            .map(|(source, path)| {
                let path = std::fs::canonicalize(&path).unwrap_or(path);
                debug!(source, path = %path.display(), "Located models directory");
                path
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_override_wins() {
        let root = tempfile::tempdir().unwrap();
        let custom = root.path().join("custom");
        fs::create_dir_all(&custom).unwrap();
        fs::create_dir_all(root.path().join(MODELS_DIR_NAME)).unwrap();

        let found = ArtifactLocator::default()
            .with_override(&custom)
            .with_working_dir(root.path())
            .locate()
            .unwrap();
        assert_eq!(found, fs::canonicalize(&custom).unwrap());
    }

    #[test]
    fn test_missing_override_falls_through() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join(MODELS_DIR_NAME)).unwrap();

        let found = ArtifactLocator::default()
            .with_override(root.path().join("does-not-exist"))
            .with_working_dir(root.path())
            .locate()
            .unwrap();
        assert_eq!(found, fs::canonicalize(root.path().join(MODELS_DIR_NAME)).unwrap());
    }

    #[test]
    fn test_relative_to_anchor() {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("web").join("backend");
        fs::create_dir_all(&anchor).unwrap();
        fs::create_dir_all(root.path().join(MODELS_DIR_NAME)).unwrap();

        let found = ArtifactLocator::default().with_anchor(&anchor).locate().unwrap();
        assert_eq!(found, fs::canonicalize(root.path().join(MODELS_DIR_NAME)).unwrap());
    }

    #[test]
    fn test_ancestor_walk() {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("a").join("b").join("c").join("d");
        fs::create_dir_all(&anchor).unwrap();
        fs::create_dir_all(root.path().join("a").join(MODELS_DIR_NAME)).unwrap();

        let found = ArtifactLocator::default().with_anchor(&anchor).locate().unwrap();
        assert_eq!(found, fs::canonicalize(root.path().join("a").join(MODELS_DIR_NAME)).unwrap());
    }

    #[test]
    fn test_ancestor_walk_is_bounded() {
        let root = tempfile::tempdir().unwrap();
        let anchor = root.path().join("1/2/3/4/5/6/7/8");
        fs::create_dir_all(&anchor).unwrap();
        fs::create_dir_all(root.path().join(MODELS_DIR_NAME)).unwrap();

        assert_eq!(ArtifactLocator::default().with_anchor(&anchor).locate(), None);
    }

    #[test]
    fn test_not_found() {
        let root = tempfile::tempdir().unwrap();
        let locator = ArtifactLocator::default().with_working_dir(root.path());
        assert_eq!(locator.locate(), None);
    }

    // The only test in this crate that touches MODELS_DIR
    #[test]
    fn test_from_env_reads_models_dir() {
        let root = tempfile::tempdir().unwrap();
        let custom = root.path().join("artifacts");
        fs::create_dir_all(&custom).unwrap();

        std::env::set_var(MODELS_DIR_ENV, &custom);
        let locator = ArtifactLocator::from_env();
        assert_eq!(locator.candidates().first(), Some(&("override", custom.clone())));
        assert_eq!(locator.locate(), Some(fs::canonicalize(&custom).unwrap()));

        std::env::set_var(MODELS_DIR_ENV, "");
        let locator = ArtifactLocator::from_env();
        assert!(locator.candidates().iter().all(|(source, _)| *source != "override"));

        std::env::remove_var(MODELS_DIR_ENV);
        let locator = ArtifactLocator::from_env();
        assert!(locator.candidates().iter().all(|(source, _)| *source != "override"));
        assert!(locator.candidates().iter().any(|(source, _)| *source == "working_dir"));
    }
}
