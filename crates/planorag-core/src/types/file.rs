//! Uploaded file handles.
//!
//! Files arrive as streams with a read cursor. Readers that consume a file more
//! than once (validation then manifest upload, embedding then image upload)
//! must call [`UploadedFile::seek_to_start`] before each read.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// A named, sized, rewindable byte stream handed over by the caller.
pub trait UploadedFile: Send {
    /// File name as uploaded, including extension.
    fn name(&self) -> &str;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Move the read cursor back to the first byte.
    fn seek_to_start(&mut self) -> io::Result<()>;

    /// Read from the current cursor position to the end.
    fn read_to_end(&mut self) -> io::Result<Vec<u8>>;

    /// Lower-cased extension after the last dot, if any.
    fn extension(&self) -> Option<String> {
        file_extension(self.name())
    }
}

/// Image handles are owned trait objects so callers can mix sources.
pub type ImageBlob = Box<dyn UploadedFile>;

/// Lower-cased extension after the last dot of `name`.
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// `name` with its last extension removed.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem,
        _ => name,
    }
}

/// File held entirely in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    cursor: Cursor<Vec<u8>>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            cursor: Cursor::new(data.into()),
        }
    }

    /// Box as an [`ImageBlob`].
    pub fn boxed(name: impl Into<String>, data: impl Into<Vec<u8>>) -> ImageBlob {
        Box::new(Self::new(name, data))
    }
}

impl UploadedFile for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    fn seek_to_start(&mut self) -> io::Result<()> {
        self.cursor.set_position(0);
        Ok(())
    }

    fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.cursor.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// File on the local filesystem.
#[derive(Debug)]
pub struct LocalFile {
    name: String,
    size: u64,
    file: File,
}

impl LocalFile {
    /// Open `path`; the handle is named after the path's final component.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?
            .to_string();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { name, size, file })
    }
}

impl UploadedFile for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn seek_to_start(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).map(|_| ())
    }

    fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size as usize);
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}
