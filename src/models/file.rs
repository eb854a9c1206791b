use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a selected file live until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileHandle {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl FileHandle {
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            FileHandle::Path(path) => tokio::fs::read(path).await,
            FileHandle::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub handle: FileHandle,
}

impl SelectedFile {
    /// Builds a selection entry from a path on disk. Only metadata is read;
    /// the content is loaded when the file is uploaded.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Ok(Self {
            mime_type: guess_mime_type(&name),
            name,
            size: metadata.len(),
            handle: FileHandle::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: &str, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            size: bytes.len() as u64,
            mime_type: mime_type
                .map(str::to_string)
                .unwrap_or_else(|| guess_mime_type(name)),
            handle: FileHandle::Memory(bytes.into()),
        }
    }

    /// Extension used for the storage key: whatever follows the last dot, or
    /// the whole name when there is none.
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mime_type_is_guessed_from_the_name() {
        let file = SelectedFile::from_bytes("README.txt", None, b"read me first".to_vec());
        assert_eq!(file.size, 13);
        assert_eq!(file.mime_type, "text/plain");

        let zip = SelectedFile::from_bytes("repo.zip", None, vec![0; 4]);
        assert_eq!(zip.mime_type, "application/zip");
    }

    #[test]
    fn explicit_mime_type_wins() {
        let file = SelectedFile::from_bytes("notes", Some("text/plain"), vec![]);
        assert_eq!(file.mime_type, "text/plain");
    }

    #[test]
    fn extension_falls_back_to_whole_name() {
        assert_eq!(SelectedFile::from_bytes("archive.tar.gz", None, vec![]).extension(), "gz");
        assert_eq!(SelectedFile::from_bytes("Makefile", None, vec![]).extension(), "Makefile");
    }

    #[tokio::test]
    async fn path_handle_reads_lazily() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello").unwrap();

        let file = SelectedFile::from_path(tmp.path()).unwrap();
        assert_eq!(file.size, 5);
        assert_eq!(file.handle.read().await.unwrap(), b"hello");
    }

    #[test]
    fn directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SelectedFile::from_path(dir.path()).is_err());
    }
}
