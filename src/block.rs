// block.rs
//
// Copyright (c) 2019  Douglas Lau
//
//! GIF blocks and sub-block streams
use crate::error::{Error, Result};
use std::io::Read;

/// Number of channels in a color table entry
pub const CHANNELS: usize = 3;

/// Maximum size of one sub-block
const SUB_BLOCK_SZ: usize = 255;

/// Block code (signature byte)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockCode {
    /// Image descriptor, followed by frame data
    ImageDesc_,
    /// Extension, with sub-blocks
    Extension_,
    /// GIF trailer
    Trailer_,
}

impl BlockCode {
    /// Get a block code from its signature
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }
}

/// Color table flags, shared by screen and image descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    /// Table present?
    present: bool,
    /// Number of entries (2...256)
    table_len: usize,
}

impl ColorTableConfig {
    /// Get color table config from descriptor flags
    fn from_flags(flags: u8) -> Self {
        ColorTableConfig {
            present: (flags & 0x80) != 0,
            table_len: 1 << ((flags & 0x07) + 1),
        }
    }

    /// Get the number of entries (0 if absent)
    pub fn len(&self) -> usize {
        if self.present {
            self.table_len
        } else {
            0
        }
    }

    /// Check whether the table is absent
    pub fn is_empty(&self) -> bool {
        !self.present
    }

    /// Get the table size in bytes
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Read a little-endian u16
fn le_u16(buf: &[u8]) -> u16 {
    u16::from(buf[1]) << 8 | u16::from(buf[0])
}

/// Header block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Header {
    /// Size in bytes
    pub const SIZE: usize = 6;

    /// Decode a Header block from a buffer
    pub fn from_buf(buf: &[u8; Header::SIZE]) -> Result<Self> {
        if &buf[..3] == b"GIF" {
            let version = [buf[3], buf[4], buf[5]];
            match &version {
                b"87a" | b"89a" => Ok(Header { version }),
                _ => Err(Error::UnsupportedVersion(version)),
            }
        } else {
            Err(Error::MalformedHeader)
        }
    }

    /// Get the version (`87a` or `89a`)
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical Screen Descriptor block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
}

impl LogicalScreenDesc {
    /// Size in bytes
    pub const SIZE: usize = 7;

    /// Decode a Logical Screen Descriptor block from a buffer
    ///
    /// Background color index and pixel aspect ratio are ignored.
    pub fn from_buf(buf: &[u8; LogicalScreenDesc::SIZE]) -> Self {
        LogicalScreenDesc {
            screen_width: le_u16(&buf[0..2]),
            screen_height: le_u16(&buf[2..4]),
            flags: buf[4],
        }
    }

    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    /// Get the color resolution (bits per primary color)
    pub fn color_bits(&self) -> u8 {
        ((self.flags >> 4) & 0x07) + 1
    }

    /// Get the largest index the bitmap must hold
    pub fn max_index(&self) -> u8 {
        ((1u16 << self.color_bits()) - 1) as u8
    }

    /// Get the global color table config
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(self.flags)
    }
}

/// Image Descriptor block (without the `,` signature)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    /// Size in bytes
    pub const SIZE: usize = 9;

    /// Decode an Image Descriptor block from a buffer
    pub fn from_buf(buf: &[u8; ImageDesc::SIZE]) -> Self {
        ImageDesc {
            left: le_u16(&buf[0..2]),
            top: le_u16(&buf[2..4]),
            width: le_u16(&buf[4..6]),
            height: le_u16(&buf[6..8]),
            flags: buf[8],
        }
    }

    /// Get the left position
    pub fn left(&self) -> u16 {
        self.left
    }

    /// Get the top position
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Get the frame width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get the frame height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Check whether rows are interlaced
    pub fn interlaced(&self) -> bool {
        (self.flags & 0x40) != 0
    }

    /// Get the local color table config
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::from_flags(self.flags)
    }

    /// Check whether the frame fits within a screen
    pub fn fits(&self, screen: &LogicalScreenDesc) -> bool {
        u32::from(self.left) + u32::from(self.width)
            <= u32::from(screen.screen_width())
            && u32::from(self.top) + u32::from(self.height)
                <= u32::from(screen.screen_height())
    }
}

/// Sub-block stream reader
///
/// Iterates over the data bytes of a sequence of length-prefixed sub-blocks,
/// ending at the first zero-length sub-block.
pub struct SubBlocks<'a, R: Read> {
    /// Reader for input data
    reader: &'a mut R,
    /// Current sub-block data
    buffer: [u8; SUB_BLOCK_SZ],
    /// Length of current sub-block
    len: usize,
    /// Position within current sub-block
    pos: usize,
    /// Terminator reached (or error)
    done: bool,
}

impl<'a, R: Read> SubBlocks<'a, R> {
    /// Create a new sub-block stream reader
    pub fn new(reader: &'a mut R) -> Self {
        SubBlocks {
            reader,
            buffer: [0; SUB_BLOCK_SZ],
            len: 0,
            pos: 0,
            done: false,
        }
    }

    /// Read the next sub-block, returning `false` at the terminator
    fn next_sub_block(&mut self) -> Result<bool> {
        let mut sz = [0; 1];
        self.reader.read_exact(&mut sz)?;
        let sz = usize::from(sz[0]);
        if sz > 0 {
            trace!("sub-block: {:?}", sz);
            self.reader.read_exact(&mut self.buffer[..sz])?;
        }
        self.len = sz;
        self.pos = 0;
        Ok(sz > 0)
    }

    /// Get the next byte, or `None` at the terminator
    fn next_byte(&mut self) -> Result<Option<u8>> {
        while self.pos >= self.len {
            if !self.next_sub_block()? {
                return Ok(None);
            }
        }
        let byte = self.buffer[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    /// Discard the rest of the stream, including the terminator
    pub fn drain(&mut self) -> Result<()> {
        while !self.done {
            self.pos = self.len;
            match self.next_sub_block() {
                Ok(true) => (),
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl<'a, R: Read> Iterator for SubBlocks<'a, R> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_byte() {
            Ok(Some(byte)) => Some(Ok(byte)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn block_code() {
        assert_eq!(BlockCode::from_u8(b','), Some(BlockCode::ImageDesc_));
        assert_eq!(BlockCode::from_u8(b'!'), Some(BlockCode::Extension_));
        assert_eq!(BlockCode::from_u8(b';'), Some(BlockCode::Trailer_));
        assert_eq!(BlockCode::from_u8(0x00), None);
    }

    #[test]
    fn header() {
        assert_eq!(Header::from_buf(b"GIF87a").unwrap().version(), *b"87a");
        assert_eq!(Header::from_buf(b"GIF89a").unwrap().version(), *b"89a");
        match Header::from_buf(b"GIF90a") {
            Err(Error::UnsupportedVersion(v)) => assert_eq!(&v, b"90a"),
            r => panic!("unexpected {:?}", r),
        }
        let err = Header::from_buf(b"\x89PNG\r\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn color_table_len() {
        let t = ColorTableConfig::from_flags(0x00);
        assert!(t.is_empty());
        assert_eq!(t.size_bytes(), 0);
        assert_eq!(ColorTableConfig::from_flags(0x80).len(), 2);
        assert_eq!(ColorTableConfig::from_flags(0x81).len(), 4);
        assert_eq!(ColorTableConfig::from_flags(0x84).len(), 32);
        assert_eq!(ColorTableConfig::from_flags(0x87).len(), 256);
        assert_eq!(ColorTableConfig::from_flags(0x87).size_bytes(), 768);
    }

    #[test]
    fn screen_desc() {
        let buf = [0x0A, 0x01, 0x02, 0x00, 0x91, 0, 0];
        let b = LogicalScreenDesc::from_buf(&buf);
        assert_eq!(b.screen_width(), 266);
        assert_eq!(b.screen_height(), 2);
        assert_eq!(b.color_bits(), 2);
        assert_eq!(b.max_index(), 3);
        assert_eq!(b.color_table_config().len(), 4);
        let b = LogicalScreenDesc::from_buf(&[1, 0, 1, 0, 0x70, 0, 0]);
        assert_eq!(b.max_index(), 255);
        assert!(b.color_table_config().is_empty());
    }

    #[test]
    fn image_desc() {
        let screen = LogicalScreenDesc::from_buf(&[4, 0, 4, 0, 0, 0, 0]);
        let b = ImageDesc::from_buf(&[1, 0, 2, 0, 3, 0, 2, 0, 0x40]);
        assert_eq!((b.left(), b.top(), b.width(), b.height()), (1, 2, 3, 2));
        assert!(b.interlaced());
        assert!(b.color_table_config().is_empty());
        assert!(b.fits(&screen));
        let b = ImageDesc::from_buf(&[2, 0, 0, 0, 3, 0, 1, 0, 0x82]);
        assert!(!b.interlaced());
        assert_eq!(b.color_table_config().len(), 8);
        assert!(!b.fits(&screen));
    }

    #[test]
    fn sub_blocks() {
        let data = [2, 1, 2, 3, 3, 4, 5, 0, 0xAA];
        let mut reader = &data[..];
        let bytes: Result<Vec<u8>> = SubBlocks::new(&mut reader).collect();
        assert_eq!(bytes.unwrap(), [1, 2, 3, 4, 5]);
        assert_eq!(reader, [0xAA]);
    }

    #[test]
    fn sub_blocks_drain() {
        let data = [3, 1, 2, 3, 1, 4, 0, 0x3B];
        let mut reader = &data[..];
        let mut blocks = SubBlocks::new(&mut reader);
        assert_eq!(blocks.next().unwrap().unwrap(), 1);
        blocks.drain().unwrap();
        assert!(blocks.next().is_none());
        blocks.drain().unwrap();
        assert_eq!(reader, [0x3B]);
    }

    #[test]
    fn sub_blocks_truncated() {
        let data = [4, 1, 2];
        let mut reader = &data[..];
        let mut blocks = SubBlocks::new(&mut reader);
        match blocks.next() {
            Some(Err(Error::UnexpectedEndOfFile)) => (),
            r => panic!("unexpected {:?}", r),
        }
        assert!(blocks.next().is_none());
    }
}
