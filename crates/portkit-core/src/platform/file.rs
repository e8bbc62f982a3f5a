//! Buffered file I/O with 64-bit offsets.
//!
//! Files are opened with `fopen`-style mode strings. Positions are always
//! [`FileOffset`] (`i64`), whatever the width of the host's native
//! buffered-I/O offset; a position that does not fit is an error, never a
//! truncation.

use crate::config::IoConfig;
use crate::error::{PortkitError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Signed 64-bit file position.
pub type FileOffset = i64;

/// Origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// Parsed `fopen`-style open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    /// Fail if the file exists (`x`).
    pub exclusive: bool,
    /// `b` was given. Has no effect on the bytes read or written.
    pub binary: bool,
}

impl OpenMode {
    /// Parse a mode string such as `"r"`, `"wb"`, `"a+"` or `"w+x"`.
    ///
    /// The first character selects read (`r`), write (`w`) or append (`a`);
    /// it may be followed by `+` (update), `b`/`t` and `x`, each at most
    /// once. `x` is only valid with `w`.
    pub fn parse(mode: &str) -> Result<Self> {
        let invalid = || PortkitError::InvalidMode {
            mode: mode.to_string(),
        };

        let mut chars = mode.chars();
        let mut parsed = match chars.next() {
            Some('r') => OpenMode {
                read: true,
                ..Default::default()
            },
            Some('w') => OpenMode {
                write: true,
                truncate: true,
                create: true,
                ..Default::default()
            },
            Some('a') => OpenMode {
                write: true,
                append: true,
                create: true,
                ..Default::default()
            },
            _ => return Err(invalid()),
        };

        let mut seen_update = false;
        let mut seen_text = false;
        for c in chars {
            match c {
                '+' if !seen_update => {
                    seen_update = true;
                    parsed.read = true;
                    parsed.write = true;
                }
                'b' | 't' if !seen_text => {
                    seen_text = true;
                    parsed.binary = c == 'b';
                }
                'x' if !parsed.exclusive && parsed.truncate => parsed.exclusive = true,
                _ => return Err(invalid()),
            }
        }

        Ok(parsed)
    }

    /// Read-and-write modes (`r+`, `w+`, `a+`).
    pub fn is_update(&self) -> bool {
        self.read && self.write
    }

    fn to_options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.read);
        if self.append {
            options.append(true);
        } else {
            options.write(self.write);
        }
        if self.exclusive {
            options.create_new(true);
        } else {
            options.create(self.create).truncate(self.truncate);
        }
        options
    }
}

enum Stream {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
    Update(File),
}

/// An open file with 64-bit `seek`/`tell`.
///
/// Read-only modes are buffered for reading, write-only modes for writing,
/// and update modes go straight to the OS so that interleaved reads and
/// writes never observe stale buffers.
pub struct PortableFile {
    path: PathBuf,
    mode: OpenMode,
    stream: Stream,
}

impl PortableFile {
    /// Open `path` with an `fopen`-style `mode`.
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self> {
        let path = path.as_ref();
        let mode = OpenMode::parse(mode)?;
        let file = mode
            .to_options()
            .open(path)
            .map_err(|e| PortkitError::io_with_path(e, path))?;

        let capacity = IoConfig::STREAM_BUFFER_CAPACITY;
        let stream = if mode.is_update() {
            Stream::Update(file)
        } else if mode.read {
            Stream::Reader(BufReader::with_capacity(capacity, file))
        } else {
            Stream::Writer(BufWriter::with_capacity(capacity, file))
        };

        debug!("Opened {} ({:?})", path.display(), mode);
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            stream,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Move the file position and return the new absolute position.
    ///
    /// A negative offset from [`Whence::Start`] is rejected before the OS is
    /// asked; other out-of-range targets are reported by the OS.
    pub fn seek(&mut self, offset: FileOffset, whence: Whence) -> Result<FileOffset> {
        let target = match whence {
            Whence::Start => {
                let start =
                    u64::try_from(offset).map_err(|_| PortkitError::InvalidOffset { offset })?;
                SeekFrom::Start(start)
            }
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };

        let position = Seek::seek(self, target).map_err(|e| self.io_error(e))?;
        to_offset(position)
    }

    /// Current absolute position, including buffered but unflushed data.
    pub fn tell(&mut self) -> Result<FileOffset> {
        let position = self.stream_position().map_err(|e| self.io_error(e))?;
        to_offset(position)
    }

    /// Flush buffered writes to the OS.
    pub fn flush_buffers(&mut self) -> Result<()> {
        self.flush().map_err(|e| self.io_error(e))
    }

    /// Flush and close the file, reporting any error a late flush hits.
    ///
    /// Dropping a `PortableFile` also flushes, but discards that error.
    pub fn close(self) -> Result<()> {
        let PortableFile { path, stream, .. } = self;
        match stream {
            Stream::Writer(writer) => {
                writer
                    .into_inner()
                    .map_err(|e| PortkitError::io_with_path(e.into_error(), &path))?;
            }
            Stream::Update(mut file) => {
                file.flush()
                    .map_err(|e| PortkitError::io_with_path(e, &path))?;
            }
            Stream::Reader(_) => {}
        }
        debug!("Closed {}", path.display());
        Ok(())
    }

    fn io_error(&self, err: io::Error) -> PortkitError {
        PortkitError::io_with_path(err, &self.path)
    }
}

fn to_offset(position: u64) -> Result<FileOffset> {
    FileOffset::try_from(position).map_err(|_| PortkitError::OffsetOverflow(position))
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("file is not open for {what}"),
    )
}

impl Read for PortableFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.stream {
            Stream::Reader(reader) => reader.read(buf),
            Stream::Update(file) => file.read(buf),
            Stream::Writer(_) => Err(unsupported("reading")),
        }
    }
}

impl Write for PortableFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.stream {
            Stream::Writer(writer) => writer.write(buf),
            Stream::Update(file) => file.write(buf),
            Stream::Reader(_) => Err(unsupported("writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.stream {
            Stream::Writer(writer) => writer.flush(),
            Stream::Update(file) => file.flush(),
            Stream::Reader(_) => Ok(()),
        }
    }
}

impl Seek for PortableFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.stream {
            Stream::Reader(reader) => reader.seek(pos),
            Stream::Writer(writer) => writer.seek(pos),
            Stream::Update(file) => file.seek(pos),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        match &mut self.stream {
            Stream::Reader(reader) => reader.stream_position(),
            Stream::Writer(writer) => writer.stream_position(),
            Stream::Update(file) => file.stream_position(),
        }
    }
}

impl std::fmt::Debug for PortableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortableFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Delete a file.
///
/// A missing file counts as success. Any other failure is returned with the
/// OS error attached (see [`PortkitError::raw_os_error`]).
pub fn remove(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PortkitError::io_with_path(e, path)),
    }
}
