use std::{
    borrow::Borrow,
    fmt,
    ops::Deref,
    path::{Path, PathBuf},
};

use camino::{Utf8Path, Utf8PathBuf};
use path_clean::PathClean;
use serde::Serialize;

use crate::{AbsoluteSystemPath, PathError};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AbsoluteSystemPathBuf(pub(crate) Utf8PathBuf);

impl Borrow<AbsoluteSystemPath> for AbsoluteSystemPathBuf {
    fn borrow(&self) -> &AbsoluteSystemPath {
        AbsoluteSystemPath::new_unchecked(self.0.as_path())
    }
}

impl AsRef<AbsoluteSystemPath> for AbsoluteSystemPathBuf {
    fn as_ref(&self) -> &AbsoluteSystemPath {
        self
    }
}

impl AsRef<Path> for AbsoluteSystemPathBuf {
    fn as_ref(&self) -> &Path {
        self.0.as_std_path()
    }
}

impl Deref for AbsoluteSystemPathBuf {
    type Target = AbsoluteSystemPath;

    fn deref(&self) -> &Self::Target {
        self.borrow()
    }
}

impl fmt::Display for AbsoluteSystemPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AbsoluteSystemPathBuf {
    /// Create a new AbsoluteSystemPathBuf from `unchecked_path`, failing if it
    /// is relative.
    ///
    /// ```
    /// use jest_builder_paths::AbsoluteSystemPathBuf;
    /// #[cfg(not(windows))]
    /// {
    ///   let root = AbsoluteSystemPathBuf::new("/workspace/apps/web").unwrap();
    ///   assert_eq!(root.as_str(), "/workspace/apps/web");
    ///   assert!(AbsoluteSystemPathBuf::new("apps/web").is_err());
    /// }
    /// ```
    pub fn new(unchecked_path: impl Into<String>) -> Result<Self, PathError> {
        let unchecked_path = unchecked_path.into();
        if !Path::new(&unchecked_path).is_absolute() {
            return Err(PathError::NotAbsolute(unchecked_path));
        }
        Ok(AbsoluteSystemPathBuf(Utf8PathBuf::from(unchecked_path)))
    }

    /// Resolves `unknown` against `base` when it is relative, and cleans the
    /// result lexically.
    pub fn from_unknown(base: &AbsoluteSystemPath, unknown: impl Into<Utf8PathBuf>) -> Self {
        let unknown: Utf8PathBuf = unknown.into();
        let joined = if unknown.is_absolute() {
            unknown
        } else {
            base.as_path().join(unknown)
        };
        // Cleaning only removes components, a valid UTF-8 input stays valid.
        match Utf8PathBuf::try_from(joined.as_std_path().clean()) {
            Ok(cleaned) => Self(cleaned),
            Err(_) => Self(joined),
        }
    }

    pub fn from_cwd(unknown: impl Into<Utf8PathBuf>) -> Result<Self, PathError> {
        let cwd = Self::cwd()?;
        Ok(Self::from_unknown(&cwd, unknown))
    }

    pub fn cwd() -> Result<Self, PathError> {
        Ok(Self(Utf8PathBuf::try_from(std::env::current_dir()?)?))
    }

    pub fn as_path(&self) -> &Utf8Path {
        self.0.as_path()
    }

    pub fn into_std_path_buf(self) -> PathBuf {
        self.0.into_std_path_buf()
    }
}

impl TryFrom<PathBuf> for AbsoluteSystemPathBuf {
    type Error = PathError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        let path = Utf8PathBuf::try_from(path)?;
        Self::new(path.into_string())
    }
}

impl TryFrom<&Path> for AbsoluteSystemPathBuf {
    type Error = PathError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let path_str = path
            .to_str()
            .ok_or_else(|| PathError::InvalidUnicode(path.to_string_lossy().to_string()))?;
        Self::new(path_str)
    }
}
