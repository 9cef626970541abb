// lib.rs      gifload crate.
//
// Copyright (c) 2019  Douglas Lau
//
//! A GIF loader which writes an indexed bitmap and palette into
//! caller-supplied sinks.
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod decode;
mod error;
pub mod lzw;
mod private;
mod sink;

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::private::Decoder;
pub use crate::sink::{Bitmap, Palette};
