//! Filesystem-backed tree store
//!
//! Maps a directory hierarchy onto the node model:
//!
//! - a directory is a node
//! - its sub-directories are the children, ordered by name
//! - its regular files are the properties, ordered by name
//!
//! A property file holding valid UTF-8 is a string property with one value
//! per line (more than one line makes it multi-valued, an empty file is a
//! single empty value). Anything else is a binary property. Symlinks are
//! never followed, which keeps the walk free of cycles.

use super::{ChildEntry, PropertyInfo, PropertyType, TreeNode};
use crate::error::{StoreError, StoreResult};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

/// An opened filesystem tree
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    /// Open the tree rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| StoreError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !metadata.is_dir() {
            return Err(StoreError::Unreadable {
                path: path.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        // Fail early on permission problems rather than mid-walk
        fs::read_dir(path).map_err(|e| StoreError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Root node of the tree
    pub fn root(&self) -> FsNode {
        FsNode {
            path: self.root.clone(),
        }
    }
}

/// A directory acting as a node
#[derive(Debug, Clone)]
pub struct FsNode {
    path: PathBuf,
}

impl FsNode {
    /// Directory entries split into (sub-directories, regular files), each
    /// sorted by name
    fn entries(&self) -> io::Result<(Vec<(String, PathBuf)>, Vec<(String, PathBuf)>)> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                dirs.push((name, entry.path()));
            } else if file_type.is_file() {
                files.push((name, entry.path()));
            }
        }

        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok((dirs, files))
    }
}

impl TreeNode for FsNode {
    fn children(&self) -> StoreResult<Vec<ChildEntry<Self>>> {
        let (dirs, _) = self.entries().map_err(|e| StoreError::ListChildren {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(dirs
            .into_iter()
            .map(|(name, path)| ChildEntry::new(name, FsNode { path }))
            .collect())
    }

    fn properties(&self) -> StoreResult<Vec<PropertyInfo>> {
        let list_err = |e: io::Error| StoreError::ListProperties {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        let (_, files) = self.entries().map_err(list_err)?;

        files
            .into_iter()
            .map(|(name, path)| {
                File::open(&path)
                    .and_then(|file| read_property(name, BufReader::new(file)))
                    .map_err(|e| StoreError::io(&path, e))
            })
            .collect()
    }

    fn child(&self, name: &str) -> StoreResult<Option<Self>> {
        if !is_entry_name(name) {
            return Ok(None);
        }

        let path = self.path.join(name);
        match fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => Ok(Some(FsNode { path })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ListChildren {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// True when `name` can only address an entry directly inside a directory
fn is_entry_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('/')
}

/// Read a property file chunk by chunk
///
/// Only line lengths are kept, so the size of a value never depends on how
/// much of the file fits in memory.
fn read_property<R: BufRead>(name: String, mut reader: R) -> io::Result<PropertyInfo> {
    let mut utf8 = Utf8Validator::new();
    let mut sizes = Vec::new();
    let mut line = 0u64;
    let mut total = 0u64;

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }

        let consumed = chunk.len();
        total += consumed as u64;
        utf8.feed(chunk);

        if utf8.is_valid() {
            for &byte in chunk {
                if byte == b'\n' {
                    sizes.push(line);
                    line = 0;
                } else {
                    line += 1;
                }
            }
        }

        reader.consume(consumed);
    }

    if !utf8.finish() {
        return Ok(PropertyInfo::single(name, PropertyType::Binary, total));
    }

    // A trailing newline ends the last value rather than starting a new one
    if line > 0 || sizes.is_empty() {
        sizes.push(line);
    }

    if sizes.len() > 1 {
        Ok(PropertyInfo::array(name, PropertyType::String, sizes))
    } else {
        Ok(PropertyInfo::single(name, PropertyType::String, sizes[0]))
    }
}

/// UTF-8 check over a byte stream delivered in arbitrary chunks
struct Utf8Validator {
    /// Trailing bytes of a sequence split across chunks
    pending: Vec<u8>,
    valid: bool,
}

impl Utf8Validator {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            valid: true,
        }
    }

    fn feed(&mut self, chunk: &[u8]) {
        if !self.valid {
            return;
        }

        self.pending.extend_from_slice(chunk);
        match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.clear(),
            Err(e) if e.error_len().is_none() => {
                let complete = e.valid_up_to();
                self.pending.drain(..complete);
            }
            Err(_) => {
                self.valid = false;
                self.pending.clear();
            }
        }
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    /// True if the whole stream was valid UTF-8
    fn finish(&self) -> bool {
        self.valid && self.pending.is_empty()
    }
}
