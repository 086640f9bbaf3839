use std::{fmt, io, path::Path};

use camino::{Utf8Component, Utf8Components, Utf8Path, Utf8PathBuf};
use fs_err as fs;

use crate::{AbsoluteSystemPathBuf, PathError};

#[derive(Debug, PartialEq, Eq)]
pub struct AbsoluteSystemPath(Utf8Path);

impl ToOwned for AbsoluteSystemPath {
    type Owned = AbsoluteSystemPathBuf;

    fn to_owned(&self) -> Self::Owned {
        AbsoluteSystemPathBuf(self.0.to_owned())
    }
}

impl AsRef<AbsoluteSystemPath> for AbsoluteSystemPath {
    fn as_ref(&self) -> &AbsoluteSystemPath {
        self
    }
}

impl fmt::Display for AbsoluteSystemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_str())
    }
}

impl AsRef<Path> for AbsoluteSystemPath {
    fn as_ref(&self) -> &Path {
        self.0.as_std_path()
    }
}

impl AbsoluteSystemPath {
    /// Validates that the path is absolute and creates an `AbsoluteSystemPath`.
    ///
    /// ```
    /// use jest_builder_paths::AbsoluteSystemPath;
    /// #[cfg(unix)]
    /// {
    ///   assert!(AbsoluteSystemPath::new("/workspace/apps").is_ok());
    ///   assert!(AbsoluteSystemPath::new("apps/web").is_err());
    /// }
    /// ```
    pub fn new<P: AsRef<str> + ?Sized>(value: &P) -> Result<&Self, PathError> {
        let path: &Utf8Path = value.as_ref().into();
        Self::from_utf8_path(path)
    }

    fn from_utf8_path(path: &Utf8Path) -> Result<&Self, PathError> {
        if path.is_relative() {
            return Err(PathError::NotAbsolute(path.to_string()));
        }
        Ok(Self::new_unchecked(path))
    }

    pub(crate) fn new_unchecked(path: &Utf8Path) -> &Self {
        unsafe { &*(path as *const Utf8Path as *const Self) }
    }

    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }

    pub fn as_std_path(&self) -> &Path {
        self.0.as_std_path()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn exists(&self) -> bool {
        self.0.exists()
    }

    /// Yields `self` followed by every parent up to and including the
    /// filesystem root.
    pub fn ancestors(&self) -> impl Iterator<Item = &AbsoluteSystemPath> {
        self.0.ancestors().map(Self::new_unchecked)
    }

    pub fn parent(&self) -> Option<&AbsoluteSystemPath> {
        self.0.parent().map(Self::new_unchecked)
    }

    pub fn components(&self) -> Utf8Components<'_> {
        self.0.components()
    }

    pub fn join_component(&self, segment: &str) -> AbsoluteSystemPathBuf {
        debug_assert!(!segment.contains(std::path::MAIN_SEPARATOR));
        AbsoluteSystemPathBuf(self.0.join(segment))
    }

    pub fn join_components(&self, segments: &[&str]) -> AbsoluteSystemPathBuf {
        debug_assert!(!segments
            .iter()
            .any(|segment| segment.contains(std::path::MAIN_SEPARATOR)));
        let mut path = self.0.to_owned();
        path.extend(segments);
        AbsoluteSystemPathBuf(path)
    }

    /// Joins a path of unknown kind onto `self`. Absolute paths replace
    /// `self`, relative ones are appended. The result is lexically cleaned
    /// but symlinks are not resolved.
    pub fn join_unknown(&self, unknown: impl AsRef<Utf8Path>) -> AbsoluteSystemPathBuf {
        AbsoluteSystemPathBuf::from_unknown(self, unknown.as_ref())
    }

    /// Canonicalizes a path. Uses `dunce` to avoid UNC paths when possible.
    pub fn to_realpath(&self) -> Result<AbsoluteSystemPathBuf, PathError> {
        let realpath = dunce::canonicalize(&self.0)?;
        Ok(AbsoluteSystemPathBuf(Utf8PathBuf::try_from(realpath)?))
    }

    pub fn read_to_string(&self) -> Result<String, io::Error> {
        fs::read_to_string(&self.0)
    }

    /// Returns the path that leads from `base` to `self`.
    ///
    /// Both sides are cleaned first so `..` segments in either input do not
    /// leak into the result. Equal paths produce an empty path. When no
    /// relative path exists (different volumes) `self` is returned as is.
    pub fn relative_to(&self, base: &AbsoluteSystemPath) -> Utf8PathBuf {
        let this = self.collapse();
        let base = base.collapse();
        pathdiff::diff_utf8_paths(this.as_path(), base.as_path())
            .unwrap_or_else(|| this.as_path().to_owned())
    }

    /// Whether `other` is a proper descendant of `self`.
    ///
    /// The relative path from `self` to `other` must be non-empty, must not
    /// begin with a `..` component and must not be absolute. A path does not
    /// strictly contain itself.
    pub fn strictly_contains(&self, other: &AbsoluteSystemPath) -> bool {
        // Paths on different volumes never contain each other.
        #[cfg(windows)]
        if self.components().next() != other.components().next() {
            return false;
        }
        let relative = other.relative_to(self);
        match relative.components().next() {
            None => false,
            Some(Utf8Component::ParentDir) => false,
            Some(_) => !relative.is_absolute(),
        }
    }

    /// Resolves `.` and `..` components lexically. Never fails and never
    /// touches the filesystem.
    pub fn collapse(&self) -> AbsoluteSystemPathBuf {
        let mut stack = vec![];
        for segment in self.0.components() {
            match segment {
                Utf8Component::CurDir => {
                    continue;
                }
                Utf8Component::ParentDir => {
                    // `/..` is `/`, never pop the root or prefix
                    if matches!(stack.last(), Some(Utf8Component::Normal(_))) {
                        stack.pop();
                    }
                }
                c => stack.push(c),
            }
        }

        AbsoluteSystemPathBuf(stack.into_iter().collect::<Utf8PathBuf>())
    }
}
