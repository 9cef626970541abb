// error.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
use std::fmt;
use std::io;

/// Errors encountered while loading a GIF
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// Header does not begin with `GIF`.
    MalformedHeader,
    /// GIF version not supported (87a or 89a only).
    UnsupportedVersion([u8; 3]),
    /// Invalid block code (signature).
    InvalidBlockCode,
    /// LZW minimum code size out of range.
    InvalidCodeSize,
    /// Compressed LZW data invalid or corrupt.
    InvalidLzwData,
    /// Frame location / size larger than screen size.
    InvalidFrameDimensions,
    /// Interlaced frames are not supported.
    UnsupportedInterlace,
    /// File ends with incomplete block.
    UnexpectedEndOfFile,
    /// Image data ends before the LZW end code.
    IncompleteImageData,
    /// Image larger than specified by
    /// [max_image_sz](struct.Decoder.html#method.max_image_sz).
    TooLargeImage,
}

/// Broad category of an [Error](enum.Error.html)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Data is not a well-formed GIF
    Format,
    /// Valid GIF using a feature which is not supported
    Unsupported,
    /// Data ends before a complete read
    Truncated,
    /// Underlying reader failed
    Io,
    /// Configured limit exceeded
    Limit,
}

/// Loader result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the error category
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Io(_) => ErrorKind::Io,
            MalformedHeader
            | UnsupportedVersion(_)
            | InvalidBlockCode
            | InvalidCodeSize
            | InvalidLzwData
            | InvalidFrameDimensions => ErrorKind::Format,
            UnsupportedInterlace => ErrorKind::Unsupported,
            UnexpectedEndOfFile | IncompleteImageData => ErrorKind::Truncated,
            TooLargeImage => ErrorKind::Limit,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::UnsupportedInterlace => {
                write!(fmt, "interlaced frames not supported")
            }
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEndOfFile,
            _ => Error::Io(err),
        }
    }
}
