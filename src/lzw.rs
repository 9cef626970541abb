// lzw.rs
//
// Copyright (c) 2020-2023  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF
use crate::error::{Error, Result};
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    pub const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> usize {
        1 << self.0
    }

    /// Get the bit mask
    fn mask(self) -> u32 {
        (1 << u32::from(self.0)) - 1
    }
}

/// Code type
pub type Code = u16;

/// Node for code dictionary
#[derive(Clone, Copy, Debug)]
struct Node {
    /// Prefix code (`None` for literal roots)
    prefix: Option<Code>,
    /// Trailing byte value
    byte: u8,
    /// First byte of the whole value
    first: u8,
    /// Length of the whole value
    len: u16,
}

impl Node {
    /// Create a root node
    fn root(byte: u8) -> Self {
        Node {
            prefix: None,
            byte,
            first: byte,
            len: 1,
        }
    }
}

/// LZW code table
///
/// Entries are stored in an append-only arena; every entry past the roots
/// is the value of a previous entry with one byte appended.
#[derive(Debug)]
pub struct CodeTable {
    /// Table of codes, including roots, clear and end
    table: Vec<Node>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Last decoded code
    last: Option<Code>,
    /// Most recently decoded value
    run: Vec<u8>,
}

impl CodeTable {
    /// Create a new code table
    pub fn new(min_code_bits: u8) -> Result<Self> {
        if min_code_bits < 1 || min_code_bits > 8 {
            return Err(Error::InvalidCodeSize);
        }
        let mut table = CodeTable {
            table: Vec::with_capacity(Bits::MAX.entries()),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
            run: Vec::with_capacity(Bits::MAX.entries()),
        };
        table.reset();
        Ok(table)
    }

    /// Get the clear code
    pub fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    pub fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the current code bits
    pub fn code_bits(&self) -> Bits {
        self.code_bits
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.table.push(Node::root(byte as u8));
        }
        self.table.push(Node::root(0)); // clear code
        self.table.push(Node::root(0)); // end code
        self.code_bits = Bits::from(self.min_code_bits + 1);
        self.last = None;
        self.run.clear();
    }

    /// Push a node extending `prefix` by one byte
    fn push_node(&mut self, prefix: Code, byte: u8) {
        // codes past 12 bits can never be read
        if self.table.len() < Bits::MAX.entries() {
            let node = self.table[usize::from(prefix)];
            self.table.push(Node {
                prefix: Some(prefix),
                byte,
                first: node.first,
                len: node.len + 1,
            });
        }
    }

    /// Expand a code into the run buffer
    fn expand(&mut self, code: Code) {
        let mut node = self.table[usize::from(code)];
        self.run.clear();
        self.run.resize(usize::from(node.len), 0);
        for i in (0..self.run.len()).rev() {
            self.run[i] = node.byte;
            match node.prefix {
                Some(prefix) => node = self.table[usize::from(prefix)],
                None => break,
            }
        }
    }

    /// Decode one code.
    ///
    /// Returns the decoded run (empty for a clear code), or `None` for the
    /// end code.
    pub fn decode(&mut self, code: Code) -> Result<Option<&[u8]>> {
        if code == self.clear_code() {
            self.reset();
            return Ok(Some(&self.run[..]));
        }
        if code == self.end_code() {
            return Ok(None);
        }
        let next_code = self.next_code();
        match self.last {
            Some(last) if code < next_code => {
                let first = self.table[usize::from(code)].first;
                self.push_node(last, first);
            }
            Some(last) if code == next_code => {
                let first = self.table[usize::from(last)].first;
                self.push_node(last, first);
            }
            None if code < self.clear_code() => (),
            _ => return Err(Error::InvalidLzwData),
        }
        if self.table.len() >= self.code_bits.entries()
            && self.code_bits < Bits::MAX
        {
            self.code_bits += 1;
        }
        self.expand(code);
        self.last = Some(code);
        Ok(Some(&self.run[..]))
    }
}

/// LZW data decompressor
///
/// Pulls bytes from an iterator (normally a
/// [SubBlocks](../block/struct.SubBlocks.html) stream) and produces one
/// decoded run per code.
pub struct Decompressor<I> {
    /// Compressed bytes
    bytes: I,
    /// Code dictionary
    table: CodeTable,
    /// Bit buffer
    code: u32,
    /// Number of bits in bit buffer
    n_bits: u8,
    /// End code reached
    done: bool,
}

impl<I> Decompressor<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Create a new decompressor
    pub fn new(bytes: I, min_code_bits: u8) -> Result<Self> {
        Ok(Decompressor {
            bytes,
            table: CodeTable::new(min_code_bits)?,
            code: 0,
            n_bits: 0,
            done: false,
        })
    }

    /// Unpack one code, least-significant bit first
    fn unpack(&mut self) -> Result<Code> {
        let bits = self.table.code_bits();
        while self.n_bits < u8::from(bits) {
            match self.bytes.next() {
                Some(byte) => {
                    self.code |= u32::from(byte?) << self.n_bits;
                    self.n_bits += 8;
                }
                // end code may be packed before the final width increase;
                // this also accepts a truncated stream whose leftover bits
                // happen to match the end code
                None if self.n_bits > 0
                    && self.code == u32::from(self.table.end_code()) =>
                {
                    self.n_bits = bits.into();
                }
                None => return Err(Error::IncompleteImageData),
            }
        }
        let code = (self.code & bits.mask()) as Code;
        self.code >>= u8::from(bits);
        self.n_bits -= u8::from(bits);
        Ok(code)
    }

    /// Decompress the next run.
    ///
    /// Returns `None` once the end code has been read; any bytes remaining
    /// after it are consumed and ignored.
    pub fn next_run(&mut self) -> Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }
        let code = self.unpack()?;
        match self.table.decode(code)? {
            Some(run) => Ok(Some(run)),
            None => {
                self.done = true;
                let remaining = self
                    .bytes
                    .by_ref()
                    .try_fold(0usize, |n, b| b.map(|_| n + 1))?;
                if remaining > 0 {
                    debug!("ignored {} bytes after end code", remaining);
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Pack codes with explicit bit widths
    fn pack(codes: &[(Code, u8)]) -> Vec<u8> {
        let mut buf = vec![];
        let mut acc = 0u32;
        let mut n_bits = 0;
        for (code, bits) in codes {
            acc |= u32::from(*code) << n_bits;
            n_bits += bits;
            while n_bits >= 8 {
                buf.push(acc as u8);
                acc >>= 8;
                n_bits -= 8;
            }
        }
        if n_bits > 0 {
            buf.push(acc as u8);
        }
        buf
    }

    fn decompress(bytes: &[u8], min_code_bits: u8) -> Result<Vec<u8>> {
        let mut dec =
            Decompressor::new(bytes.iter().map(|b| Ok(*b)), min_code_bits)?;
        let mut out = vec![];
        while let Some(run) = dec.next_run()? {
            out.extend_from_slice(run);
        }
        Ok(out)
    }

    #[test]
    fn literals() {
        let mut table = CodeTable::new(2).unwrap();
        assert_eq!(table.decode(4).unwrap(), Some(&[][..]));
        assert_eq!(table.decode(1).unwrap(), Some(&[1][..]));
        assert_eq!(table.decode(2).unwrap(), Some(&[2][..]));
        // entry 6 is [1, 2]
        assert_eq!(table.decode(6).unwrap(), Some(&[1, 2][..]));
        assert_eq!(table.decode(5).unwrap(), None);
    }

    #[test]
    fn self_reference() {
        let mut table = CodeTable::new(2).unwrap();
        assert_eq!(table.decode(3).unwrap(), Some(&[3][..]));
        // code 6 is not defined yet: last + first byte of last
        assert_eq!(table.decode(6).unwrap(), Some(&[3, 3][..]));
        assert_eq!(table.decode(7).unwrap(), Some(&[3, 3, 3][..]));
    }

    #[test]
    fn invalid_codes() {
        let mut table = CodeTable::new(2).unwrap();
        assert!(matches!(table.decode(6), Err(Error::InvalidLzwData)));
        let mut table = CodeTable::new(2).unwrap();
        table.decode(0).unwrap();
        assert!(matches!(table.decode(7), Err(Error::InvalidLzwData)));
        assert!(matches!(CodeTable::new(0), Err(Error::InvalidCodeSize)));
        assert!(matches!(CodeTable::new(9), Err(Error::InvalidCodeSize)));
    }

    #[test]
    fn code_bits_grow() {
        let mut table = CodeTable::new(2).unwrap();
        assert_eq!(u8::from(table.code_bits()), 3);
        table.decode(0).unwrap();
        table.decode(1).unwrap();
        assert_eq!(u8::from(table.code_bits()), 3);
        // third code fills entry 7: 2^3 - 1
        table.decode(2).unwrap();
        assert_eq!(u8::from(table.code_bits()), 4);
        for _ in 0..7 {
            table.decode(3).unwrap();
        }
        assert_eq!(u8::from(table.code_bits()), 4);
        table.decode(3).unwrap();
        assert_eq!(u8::from(table.code_bits()), 5);
    }

    #[test]
    fn code_bits_max() {
        let mut table = CodeTable::new(8).unwrap();
        for i in 0..10_000 {
            table.decode((i % 256) as Code).unwrap();
            assert!(table.code_bits() <= Bits::MAX);
        }
        assert_eq!(table.code_bits(), Bits::MAX);
        assert_eq!(table.table.len(), Bits::MAX.entries());
        // clear resets width
        table.decode(256).unwrap();
        assert_eq!(u8::from(table.code_bits()), 9);
    }

    #[test]
    fn clear_mid_stream() {
        // width grows to 4 before the clear, next code is read with 3 bits
        let codes = [
            (4, 3),
            (0, 3),
            (1, 3),
            (1, 3),
            (0, 4),
            (4, 4),
            (1, 3),
            (2, 3),
            (5, 3),
        ];
        let data = decompress(&pack(&codes), 2).unwrap();
        assert_eq!(data, [0, 1, 1, 0, 1, 2]);
    }

    #[test]
    fn truncated() {
        let data = pack(&[(4, 3), (0, 3), (1, 3)]);
        assert!(matches!(
            decompress(&data, 2),
            Err(Error::IncompleteImageData)
        ));
    }

    #[test]
    fn end_code_narrow() {
        // width grows to 5 after the last data code, end code has 4 bits
        let mut codes = vec![(4, 3), (0, 3), (1, 3), (2, 3)];
        codes.extend(std::iter::repeat((3, 4)).take(8));
        codes.push((5, 4));
        let data = pack(&codes);
        assert_eq!(data.len(), 6);
        let data = decompress(&data, 2).unwrap();
        assert_eq!(data, [0, 1, 2, 3, 3, 3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn done_is_sticky() {
        let data = pack(&[(4, 3), (3, 3), (5, 3), (7, 3), (7, 3)]);
        let mut dec =
            Decompressor::new(data.iter().map(|b| Ok(*b)), 2).unwrap();
        assert_eq!(dec.next_run().unwrap(), Some(&[][..]));
        assert_eq!(dec.next_run().unwrap(), Some(&[3][..]));
        assert_eq!(dec.next_run().unwrap(), None);
        assert_eq!(dec.next_run().unwrap(), None);
    }

    #[test]
    fn bytes_after_end_code() {
        let data = [0x44, 0x02, 0x05, 0xAB, 0xCD, 0xEE];
        let mut bytes = data.iter().map(|b| Ok::<u8, Error>(*b));
        let mut out = vec![];
        {
            let mut dec = Decompressor::new(bytes.by_ref(), 2).unwrap();
            while let Some(run) = dec.next_run().unwrap() {
                out.extend_from_slice(run);
            }
            assert_eq!(dec.next_run().unwrap(), None);
        }
        assert_eq!(out, [0, 1, 1, 0]);
        assert!(bytes.next().is_none());
    }

    #[test]
    fn sample_2x2() {
        let data = decompress(&[0x0C, 0x10, 0x05], 2).unwrap();
        assert_eq!(data, [1, 0, 0, 1]);
    }
}
