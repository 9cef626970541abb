// sink.rs
//
// Copyright (c) 2019-2020  Douglas Lau
//
//! Destinations for decoded pixels and colors
use pix::gray::Gray8;
use pix::rgb::SRgb8;
use pix::Raster;

/// Indexed-color surface written by the decoder.
///
/// Created by a factory taking `(width, height, max_index)`.  The decoder
/// only addresses pixels within `width` x `height`.
pub trait Bitmap {
    /// Set the palette index of one pixel
    fn set_index(&mut self, x: u16, y: u16, index: u8);
}

/// Color palette written by the decoder.
///
/// Created by a factory taking the number of entries.
pub trait Palette {
    /// Set one RGB entry
    fn set_color(&mut self, i: usize, rgb: [u8; 3]);
}

impl Bitmap for Raster<Gray8> {
    fn set_index(&mut self, x: u16, y: u16, index: u8) {
        *self.pixel_mut(i32::from(x), i32::from(y)) = Gray8::new(index);
    }
}

impl Palette for Vec<SRgb8> {
    fn set_color(&mut self, i: usize, rgb: [u8; 3]) {
        self[i] = SRgb8::new(rgb[0], rgb[1], rgb[2]);
    }
}

impl<B: Bitmap + ?Sized> Bitmap for &mut B {
    fn set_index(&mut self, x: u16, y: u16, index: u8) {
        (**self).set_index(x, y, index)
    }
}

impl<P: Palette + ?Sized> Palette for &mut P {
    fn set_color(&mut self, i: usize, rgb: [u8; 3]) {
        (**self).set_color(i, rgb)
    }
}

/// Create a raster for a screen size
pub(crate) fn raster(width: u16, height: u16, _max_index: u8) -> Raster<Gray8> {
    Raster::with_clear(u32::from(width), u32::from(height))
}

/// Create a color table with black entries
pub(crate) fn color_table(len: usize) -> Vec<SRgb8> {
    vec![SRgb8::default(); len]
}
