//! Packing project directories into gzip tarballs and unpacking pulled ones.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, EntryType, HeaderMode};
use thiserror::Error;
use walkdir::WalkDir;

/// Upper bound for a single extracted file, guards against decompression bombs
const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("corrupt archive: {0}")]
    Corrupt(std::io::Error),

    #[error("refusing to extract '{0}': it would land outside the target directory")]
    PathTraversal(PathBuf),

    #[error("refusing to pack '{0}': entries must be relative to the project directory")]
    OutsideTree(PathBuf),

    #[error("archive entry '{path}' is too large ({size} bytes, limit is 100 MiB)")]
    EntryTooLarge { path: PathBuf, size: u64 },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Progress event emitted once a file has been written into the archive
#[derive(Debug, Clone, Copy)]
pub struct PackEntry<'a> {
    /// Path inside the archive
    pub path: &'a Path,
    /// Size of the file on disk
    pub size: u64,
}

/// A packed project, ready to be hashed and uploaded
#[derive(Debug, Clone)]
pub struct PackedArchive {
    /// gzip-compressed tar stream
    pub bytes: Vec<u8>,
    /// Sum of the sizes of all packed files
    pub unpacked_size: u64,
    pub file_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    pub files: usize,
    pub bytes: u64,
}

/// Top-level entries of `directory`, sorted by name
pub fn list_entries(directory: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut entries = fs::read_dir(directory)
        .map_err(io_err(directory))?
        .map(|e| e.map(|e| PathBuf::from(e.file_name())))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err(directory))?;
    entries.sort();
    Ok(entries)
}

/// Pack `entries` (relative to `directory`) into a gzip tarball
///
/// Directories are walked recursively in file-name order and headers are written in
/// deterministic mode (fixed mtime, owner and permission bits) so that packing the same
/// tree twice yields the same bytes. Symbolic links and special files are skipped.
/// `on_entry` is called after each file is appended.
pub fn pack<F>(directory: &Path, entries: &[PathBuf], mut on_entry: F) -> Result<PackedArchive, ArchiveError>
where
    F: FnMut(PackEntry<'_>),
{
    let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    builder.mode(HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    let mut unpacked_size = 0;
    let mut file_count = 0;

    for entry in entries {
        if relative_inside(entry).is_none() {
            return Err(ArchiveError::OutsideTree(entry.clone()));
        }
        let root = directory.join(entry);
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name();
        for item in walker {
            let item = item.map_err(|source| ArchiveError::Walk {
                path: root.clone(),
                source,
            })?;
            let rel = item
                .path()
                .strip_prefix(directory)
                .map_err(|_| ArchiveError::OutsideTree(item.path().to_path_buf()))?;
            let file_type = item.file_type();

            if file_type.is_dir() {
                builder
                    .append_dir(rel, item.path())
                    .map_err(io_err(item.path()))?;
            } else if file_type.is_file() {
                let mut file = File::open(item.path()).map_err(io_err(item.path()))?;
                let size = file.metadata().map_err(io_err(item.path()))?.len();
                builder
                    .append_file(rel, &mut file)
                    .map_err(io_err(item.path()))?;
                tracing::trace!("packed {} ({} bytes)", rel.display(), size);
                on_entry(PackEntry { path: rel, size });
                unpacked_size += size;
                file_count += 1;
            } else {
                tracing::warn!("skipping {}: not a regular file or directory", rel.display());
            }
        }
    }

    let encoder = builder.into_inner().map_err(io_err(directory))?;
    let bytes = encoder.finish().map_err(io_err(directory))?;
    Ok(PackedArchive {
        bytes,
        unpacked_size,
        file_count,
    })
}

/// Extract a tar stream (gzip-compressed or plain) into `target`
///
/// Entries that are absolute, climb out with `..` or would be written through a
/// symbolic link already present under `target` abort the extraction with
/// [`ArchiveError::PathTraversal`]. Links and special files are skipped.
pub fn unpack(bytes: &[u8], target: &Path) -> Result<UnpackSummary, ArchiveError> {
    let reader: Box<dyn Read + '_> = if is_gzip(bytes) {
        Box::new(GzDecoder::new(bytes))
    } else {
        Box::new(bytes)
    };
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(false);
    #[cfg(unix)]
    archive.set_unpack_xattrs(false);

    fs::create_dir_all(target).map_err(io_err(target))?;

    let mut summary = UnpackSummary::default();
    for entry in archive.entries().map_err(ArchiveError::Corrupt)? {
        let mut entry = entry.map_err(ArchiveError::Corrupt)?;
        let path = entry.path().map_err(ArchiveError::Corrupt)?.into_owned();
        let rel = relative_inside(&path).ok_or_else(|| ArchiveError::PathTraversal(path.clone()))?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        ensure_no_links(target, &rel)?;
        let dest = target.join(&rel);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&dest).map_err(io_err(&dest))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                let size = entry.size();
                if size > MAX_ENTRY_SIZE {
                    return Err(ArchiveError::EntryTooLarge { path: rel, size });
                }
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(io_err(parent))?;
                }
                entry.unpack(&dest).map_err(io_err(&dest))?;
                tracing::trace!("extracted {} ({} bytes)", rel.display(), size);
                summary.files += 1;
                summary.bytes += size;
            }
            other => {
                tracing::warn!("skipping {} ({:?} entries are not extracted)", rel.display(), other);
            }
        }
    }
    Ok(summary)
}

/// Normalized relative form of `path`, or `None` if it is absolute or escapes upwards
fn relative_inside(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Refuse `rel` when any existing component below `target` is a symbolic link
fn ensure_no_links(target: &Path, rel: &Path) -> Result<(), ArchiveError> {
    let mut current = target.to_path_buf();
    for component in rel.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(ArchiveError::PathTraversal(rel.to_path_buf()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_err(&current)(e)),
        }
    }
    Ok(())
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}
