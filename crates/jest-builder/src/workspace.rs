//! Workspace manifest lookup.
//!
//! A workspace manifest (`angular.json`, `workspace.json`, ...) lists the
//! projects of a multi-project workspace and their root directories. Given a
//! file, we find the nearest manifest above it and report which project, if
//! any, the file lives in.

use std::io;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use jest_builder_paths::{AbsoluteSystemPath, AbsoluteSystemPathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::Error;

/// Manifest file names, in lookup order within a single directory.
pub const WORKSPACE_MANIFEST_NAMES: [&str; 4] = [
    "angular.json",
    ".angular.json",
    "workspace.json",
    ".workspace.json",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkspaceManifest {
    #[serde(default)]
    pub projects: IndexMap<String, ProjectEntry>,
}

/// A project declaration. Newer manifests may give the project root as a
/// bare string instead of a configuration object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProjectEntry {
    Config(ProjectConfig),
    Root(Utf8PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    pub root: Utf8PathBuf,
}

impl ProjectEntry {
    pub fn root(&self) -> &Utf8PathBuf {
        match self {
            ProjectEntry::Config(config) => &config.root,
            ProjectEntry::Root(root) => root,
        }
    }
}

/// A project resolved against the directory of its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceProject {
    pub name: String,
    /// The root as written in the manifest.
    pub root: Utf8PathBuf,
    pub resolved_root: AbsoluteSystemPathBuf,
}

impl WorkspaceManifest {
    pub fn load(path: &AbsoluteSystemPath) -> Result<Self, Error> {
        let contents = path.read_to_string().map_err(|source| Error::ManifestRead {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| Error::ManifestParse {
            path: path.to_owned(),
            source,
        })
    }

    /// Projects in declaration order, with roots resolved against
    /// `manifest_dir`.
    pub fn resolved_projects<'a>(
        &'a self,
        manifest_dir: &'a AbsoluteSystemPath,
    ) -> impl Iterator<Item = WorkspaceProject> + 'a {
        self.projects.iter().map(|(name, entry)| WorkspaceProject {
            name: name.clone(),
            root: entry.root().clone(),
            resolved_root: manifest_dir.join_unknown(entry.root()),
        })
    }
}

/// Looks for any of `names` in the directory containing `from` and then in
/// each of its ancestors, up to and including the filesystem root.
pub fn find_up(names: &[&str], from: &AbsoluteSystemPath) -> Option<AbsoluteSystemPathBuf> {
    let start = from.parent().unwrap_or(from);
    start.ancestors().find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join_component(name))
            .find(|candidate| candidate.exists())
    })
}

/// Finds the project that contains `file` according to the nearest
/// workspace manifest.
///
/// Returns `Ok(None)` when no manifest exists above `file` or when no
/// declared project contains it. A manifest that exists but cannot be read
/// or parsed is an error.
pub fn project_for_file(file: &AbsoluteSystemPath) -> Result<Option<WorkspaceProject>, Error> {
    let Some(manifest_path) = find_up(&WORKSPACE_MANIFEST_NAMES, file) else {
        debug!("no workspace manifest found above {file}");
        return Ok(None);
    };
    let manifest = match WorkspaceManifest::load(&manifest_path) {
        Ok(manifest) => manifest,
        // removed between the lookup and the read
        Err(Error::ManifestRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            return Ok(None)
        }
        Err(err) => return Err(err),
    };
    let manifest_dir = manifest_path.parent().unwrap_or(&manifest_path);

    let project = manifest
        .resolved_projects(manifest_dir)
        .find(|project| project.resolved_root.strictly_contains(file));
    debug!(
        "{file} belongs to {:?} according to {manifest_path}",
        project.as_ref().map(|project| project.name.as_str())
    );
    Ok(project)
}
