// private.rs
//
// Copyright (c) 2019-2020  Douglas Lau
//
//! Private module for top-level items
use crate::decode::Loader;
use crate::sink::{self, Bitmap, Palette};
use crate::Result;
use pix::gray::Gray8;
use pix::rgb::SRgb8;
use pix::Raster;
use std::io::{BufReader, Read};

/// GIF file decoder
///
/// Loads every frame of a GIF into one indexed bitmap, along with the global
/// color table.  Interlaced frames are not supported.
///
/// ## Example: Load a `Raster` from a GIF
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// // ... open a `File` as "gif"
/// let (raster, palette) = gifload::Decoder::new(gif).load_raster()?;
/// assert_eq!(raster.width(), 2);
/// assert_eq!(palette.map(|p| p.len()), Some(2));
/// # Ok(())
/// # }
/// ```
///
/// ## Example: Load into custom sinks
/// ```
/// use gifload::{Bitmap, Decoder, Palette};
///
/// struct Indices(Vec<u8>);
///
/// impl Bitmap for Indices {
///     fn set_index(&mut self, x: u16, y: u16, index: u8) {
///         self.0[usize::from(y) * 2 + usize::from(x)] = index;
///     }
/// }
///
/// struct Colors(Vec<[u8; 3]>);
///
/// impl Palette for Colors {
///     fn set_color(&mut self, i: usize, rgb: [u8; 3]) {
///         self.0[i] = rgb;
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// let (bitmap, palette) = Decoder::new(gif).load(
///     |w, h, _max| Indices(vec![0; usize::from(w) * usize::from(h)]),
///     |n| Colors(vec![[0; 3]; n]),
/// )?;
/// assert_eq!(bitmap.0, [1, 0, 0, 1]);
/// assert_eq!(palette.unwrap().0[1], [0xFF; 3]);
/// # Ok(())
/// # }
/// ```
pub struct Decoder<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
}

impl<R: Read> Decoder<BufReader<R>> {
    /// Create a new buffered GIF decoder.
    pub fn new(reader: R) -> Self {
        Self::new_unbuffered(BufReader::new(reader))
    }
}

impl<R: Read> Decoder<R> {
    /// Create a new unbuffered GIF decoder.
    pub fn new_unbuffered(reader: R) -> Self {
        Decoder {
            reader,
            max_image_sz: Some(1 << 25),
        }
    }

    /// Set the maximum image size (in bytes) to allow for decoding.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Load the GIF into caller-supplied sinks.
    ///
    /// * `new_bitmap` is called with `(width, height, max_index)`.
    /// * `new_palette` is called with the number of entries, only if a
    ///   global color table is present.
    pub fn load<B, P, FB, FP>(
        self,
        new_bitmap: FB,
        new_palette: FP,
    ) -> Result<(B, Option<P>)>
    where
        B: Bitmap,
        P: Palette,
        FB: FnOnce(u16, u16, u8) -> B,
        FP: FnOnce(usize) -> P,
    {
        Loader::new(self.reader, self.max_image_sz)
            .load(new_bitmap, new_palette)
    }

    /// Load the GIF into a `Raster` of indices and a color table.
    pub fn load_raster(self) -> Result<(Raster<Gray8>, Option<Vec<SRgb8>>)> {
        self.load(sink::raster, sink::color_table)
    }
}
