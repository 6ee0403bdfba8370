//! Workspace file-system context
//!
//! Opaque to the session: it is handed to document create/update calls,
//! which use it to resolve workspace-relative paths.

use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{InitializeParams, Url, WorkspaceFolder, WorkspaceFoldersChangeEvent};

#[derive(Debug, Clone, Default)]
pub struct WorkspaceFileSystem {
    root: Option<PathBuf>,
    folders: Vec<PathBuf>,
}

impl WorkspaceFileSystem {
    pub fn new(root: Option<PathBuf>, folders: Vec<PathBuf>) -> Self {
        Self { root, folders }
    }

    #[allow(deprecated)]
    pub fn from_params(params: &InitializeParams) -> Self {
        let root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| params.root_path.as_ref().map(PathBuf::from));

        let folders = params
            .workspace_folders
            .iter()
            .flatten()
            .filter_map(folder_path)
            .collect();

        Self::new(root, folders)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn apply_folder_change(&mut self, event: &WorkspaceFoldersChangeEvent) {
        let removed: Vec<PathBuf> = event.removed.iter().filter_map(folder_path).collect();
        self.folders.retain(|f| !removed.contains(f));

        for added in event.added.iter().filter_map(folder_path) {
            if !self.folders.contains(&added) {
                self.folders.push(added);
            }
        }
    }

    /// Path of `uri` relative to the innermost workspace folder (or root)
    /// containing it
    pub fn relative_path(&self, uri: &Url) -> Option<PathBuf> {
        let path = uri.to_file_path().ok()?;

        self.folders
            .iter()
            .chain(self.root.iter())
            .filter_map(|base| path.strip_prefix(base).ok())
            .min_by_key(|relative| relative.components().count())
            .map(Path::to_path_buf)
    }
}

fn folder_path(folder: &WorkspaceFolder) -> Option<PathBuf> {
    folder.uri.to_file_path().ok()
}
