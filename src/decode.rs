// decode.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
//! GIF container parsing
use crate::block::{
    BlockCode, Header, ImageDesc, LogicalScreenDesc, SubBlocks, CHANNELS,
};
use crate::error::{Error, Result};
use crate::lzw::Decompressor;
use crate::sink::{Bitmap, Palette};
use std::io::{self, Read};

/// Pixel placement within one frame
struct Placement {
    /// Frame descriptor
    desc: ImageDesc,
    /// Column within frame
    x: u32,
    /// Row within frame
    y: u32,
    /// Count of pixels outside of frame
    discarded: usize,
}

impl Placement {
    /// Create a new placement at top-left of frame
    fn new(desc: ImageDesc) -> Self {
        Placement {
            desc,
            x: 0,
            y: 0,
            discarded: 0,
        }
    }

    /// Write a run of indices, wrapping rows at the frame width
    fn write<B: Bitmap>(&mut self, bitmap: &mut B, run: &[u8]) {
        let width = u32::from(self.desc.width());
        let height = u32::from(self.desc.height());
        for index in run {
            if self.x < width && self.y < height {
                let x = self.desc.left() + self.x as u16;
                let y = self.desc.top() + self.y as u16;
                bitmap.set_index(x, y, *index);
            } else {
                self.discarded += 1;
            }
            self.x += 1;
            if self.x >= width {
                self.x = 0;
                self.y += 1;
            }
        }
    }
}

/// Loader for one GIF stream
pub(crate) struct Loader<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
}

impl<R: Read> Loader<R> {
    /// Create a new loader
    pub fn new(reader: R, max_image_sz: Option<usize>) -> Self {
        Loader {
            reader,
            max_image_sz,
        }
    }

    /// Load all frames into a bitmap, with the global palette
    pub fn load<B, P, FB, FP>(
        mut self,
        new_bitmap: FB,
        new_palette: FP,
    ) -> Result<(B, Option<P>)>
    where
        B: Bitmap,
        P: Palette,
        FB: FnOnce(u16, u16, u8) -> B,
        FP: FnOnce(usize) -> P,
    {
        let header = self.read_header()?;
        debug!("  block  : {:?}", header);
        let screen = self.read_screen_desc()?;
        debug!("  block  : {:?}", screen);
        self.check_image_sz(&screen)?;
        let palette = self.read_global_color_table(&screen, new_palette)?;
        let mut bitmap = new_bitmap(
            screen.screen_width(),
            screen.screen_height(),
            screen.max_index(),
        );
        loop {
            match self.read_block_code()? {
                BlockCode::ImageDesc_ => {
                    self.read_frame(&screen, &mut bitmap)?
                }
                BlockCode::Extension_ => self.skip_extension()?,
                BlockCode::Trailer_ => break,
            }
        }
        Ok((bitmap, palette))
    }

    /// Read the header block
    fn read_header(&mut self) -> Result<Header> {
        let mut buf = [0; Header::SIZE];
        self.reader.read_exact(&mut buf)?;
        Header::from_buf(&buf)
    }

    /// Read the logical screen descriptor block
    fn read_screen_desc(&mut self) -> Result<LogicalScreenDesc> {
        let mut buf = [0; LogicalScreenDesc::SIZE];
        self.reader.read_exact(&mut buf)?;
        Ok(LogicalScreenDesc::from_buf(&buf))
    }

    /// Check screen size against the maximum image size
    fn check_image_sz(&self, screen: &LogicalScreenDesc) -> Result<()> {
        let sz = usize::from(screen.screen_width())
            * usize::from(screen.screen_height());
        match self.max_image_sz {
            Some(max) if sz > max => Err(Error::TooLargeImage),
            _ => Ok(()),
        }
    }

    /// Read the global color table into a new palette
    fn read_global_color_table<P, FP>(
        &mut self,
        screen: &LogicalScreenDesc,
        new_palette: FP,
    ) -> Result<Option<P>>
    where
        P: Palette,
        FP: FnOnce(usize) -> P,
    {
        let tbl = screen.color_table_config();
        if tbl.is_empty() {
            return Ok(None);
        }
        debug!("  block  : GlobalColorTable {:?}", tbl.len());
        let mut buf = vec![0; tbl.size_bytes()];
        self.reader.read_exact(&mut buf)?;
        let mut palette = new_palette(tbl.len());
        for (i, rgb) in buf.chunks_exact(CHANNELS).enumerate() {
            palette.set_color(i, [rgb[0], rgb[1], rgb[2]]);
        }
        Ok(Some(palette))
    }

    /// Read a block code (signature)
    fn read_block_code(&mut self) -> Result<BlockCode> {
        let mut buf = [0; 1];
        self.reader.read_exact(&mut buf)?;
        BlockCode::from_u8(buf[0]).ok_or(Error::InvalidBlockCode)
    }

    /// Skip an extension block and its sub-blocks
    fn skip_extension(&mut self) -> Result<()> {
        let mut label = [0; 1];
        self.reader.read_exact(&mut label)?;
        debug!("  block  : Extension {:#04X}", label[0]);
        SubBlocks::new(&mut self.reader).drain()
    }

    /// Skip bytes which are not needed
    fn skip(&mut self, sz: usize) -> Result<()> {
        let sz = sz as u64;
        let mut bytes = (&mut self.reader).take(sz);
        if io::copy(&mut bytes, &mut io::sink())? < sz {
            return Err(Error::UnexpectedEndOfFile);
        }
        Ok(())
    }

    /// Read a frame, writing its pixels into the bitmap
    fn read_frame<B: Bitmap>(
        &mut self,
        screen: &LogicalScreenDesc,
        bitmap: &mut B,
    ) -> Result<()> {
        let mut buf = [0; ImageDesc::SIZE];
        self.reader.read_exact(&mut buf)?;
        let desc = ImageDesc::from_buf(&buf);
        debug!("  block  : {:?}", desc);
        if desc.interlaced() {
            return Err(Error::UnsupportedInterlace);
        }
        if !desc.fits(screen) {
            return Err(Error::InvalidFrameDimensions);
        }
        let tbl = desc.color_table_config();
        if !tbl.is_empty() {
            // only the global palette is loaded
            debug!("  block  : LocalColorTable {:?} (skipped)", tbl.len());
            self.skip(tbl.size_bytes())?;
        }
        let mut min_code_size = [0; 1];
        self.reader.read_exact(&mut min_code_size)?;
        let sub_blocks = SubBlocks::new(&mut self.reader);
        let mut runs = Decompressor::new(sub_blocks, min_code_size[0])?;
        let mut placement = Placement::new(desc);
        while let Some(run) = runs.next_run()? {
            placement.write(bitmap, run);
        }
        if placement.discarded > 0 {
            warn!("{} pixels outside of frame", placement.discarded);
        }
        Ok(())
    }
}
