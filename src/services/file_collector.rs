use crate::errors::{Result, ReviewerError};
use crate::models::SelectedFile;

type SelectionCallback = Box<dyn Fn(&[SelectedFile]) + Send + Sync>;

/// Accumulates the files picked or dropped onto the upload form and pushes
/// the full selection back to the form after every change.
pub struct FileCollector {
    files: Vec<SelectedFile>,
    max_file_size: u64,
    on_change: SelectionCallback,
}

impl FileCollector {
    pub fn new<F>(max_file_size: u64, on_change: F) -> Self
    where
        F: Fn(&[SelectedFile]) + Send + Sync + 'static,
    {
        Self {
            files: Vec::new(),
            max_file_size,
            on_change: Box::new(on_change),
        }
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Appends a batch. A single oversized file rejects the whole batch.
    pub fn add_files(&mut self, batch: Vec<SelectedFile>) -> Result<()> {
        if let Some(too_big) = batch.iter().find(|f| f.size > self.max_file_size) {
            log::warn!("Rejecting batch of {} files: {} is {} bytes", batch.len(), too_big.name, too_big.size);
            return Err(ReviewerError::FileTooLarge {
                name: too_big.name.clone(),
                size: too_big.size,
                limit: self.max_file_size,
            });
        }
        if batch.is_empty() {
            return Ok(());
        }

        self.files.extend(batch);
        self.notify();
        Ok(())
    }

    /// Out-of-range indices are ignored.
    pub fn remove_file(&mut self, index: usize) {
        if index >= self.files.len() {
            return;
        }
        let removed = self.files.remove(index);
        log::debug!("Removed {} from selection", removed.name);
        self.notify();
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.notify();
    }

    fn notify(&self) {
        (self.on_change)(&self.files);
    }
}
