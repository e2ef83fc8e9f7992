//! Artifact files on disk: atomic publish and mmap-backed reads.

use crate::decoder::{decode, DecodedView};
use crate::errors::Result;
use memmap2::Mmap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(unix)]
fn fsync_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let f = std::fs::OpenOptions::new().read(true).custom_flags(libc::O_DIRECTORY).open(dir)?;
    f.sync_all()
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> std::io::Result<()> { Ok(()) }

/// Write `bytes` to a temp file next to `path`, sync, then rename over `path`.
/// Readers never see a half-written artifact.
pub fn write_artifact(path: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf> {
    let path_final = path.as_ref().to_path_buf();
    let dir = match path_final.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::Builder::new().prefix(".cjdict_").tempfile_in(&dir)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&path_final)?;
    // best effort; the rename already happened
    let _ = fsync_dir(&path_final);
    info!(path = %path_final.display(), bytes = bytes.len(), "artifact written");
    Ok(path_final)
}

/// Read-only mapping of an artifact. Decoding is repeated per [`view`](Self::view)
/// call and borrows the mapping.
pub struct ArtifactFile {
    _f: File,
    mmap: Mmap,
    path: PathBuf,
}

impl ArtifactFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let f = File::open(&path)?;
        // SAFETY: the file is only replaced by rename, never truncated in place.
        let mmap = unsafe { Mmap::map(&f)? };
        Ok(Self { _f: f, mmap, path })
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn bytes(&self) -> &[u8] { &self.mmap }

    pub fn view(&self) -> Result<DecodedView<'_>> {
        decode(&self.mmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncodeOptions};
    use crate::errors::DictError;
    use crate::lookup::lookup;
    use crate::normalize::{Entry, EntrySet};
    use tempfile::tempdir;

    fn bytes() -> Vec<u8> {
        let set = EntrySet::from_entries(vec![Entry::new('日', "A", "A"), Entry::new('明', "AB", "AB")]);
        encode(&set, &EncodeOptions::new(1)).unwrap()
    }

    #[test]
    fn write_then_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cj-dict.bin");
        let data = bytes();
        write_artifact(&path, &data).unwrap();

        let file = ArtifactFile::open(&path).unwrap();
        assert_eq!(file.bytes(), &data[..]);
        let view = file.view().unwrap();
        assert_eq!(view.entry_count(), 2);
        assert_eq!(lookup(&view, "明").unwrap().unwrap().primary, "AB");

        // no temp files left behind
        let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cj-dict.bin");
        write_artifact(&path, b"old").unwrap();
        write_artifact(&path, &bytes()).unwrap();
        assert!(ArtifactFile::open(&path).unwrap().view().is_ok());
    }

    #[test]
    fn corrupt_file_rejected_on_view() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        let mut data = bytes();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        write_artifact(&path, &data).unwrap();
        let file = ArtifactFile::open(&path).unwrap();
        assert!(matches!(file.view(), Err(DictError::Integrity { .. })));
    }

    #[test]
    fn missing_file_is_io() {
        let dir = tempdir().unwrap();
        assert!(matches!(ArtifactFile::open(dir.path().join("nope.bin")), Err(DictError::Io(_))));
    }
}
