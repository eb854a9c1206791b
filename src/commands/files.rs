use std::path::PathBuf;

use crate::commands::AppState;
use crate::errors::ReviewerError;
use crate::models::{Notification, SelectedFile};

/// Files picked through a dialog or dropped onto the form, by path.
pub fn add_file_paths(state: &mut AppState, paths: &[PathBuf]) -> Result<Vec<SelectedFile>, Notification> {
    let batch = paths
        .iter()
        .map(|path| SelectedFile::from_path(path))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ReviewerError::from)?;
    add_files(state, batch)
}

pub fn add_files(state: &mut AppState, batch: Vec<SelectedFile>) -> Result<Vec<SelectedFile>, Notification> {
    state.collector.add_files(batch)?;
    Ok(state.selected_files())
}

pub fn remove_file(state: &mut AppState, index: usize) -> Vec<SelectedFile> {
    state.collector.remove_file(index);
    state.selected_files()
}
