// main.rs      gifload command
//
// Copyright (c) 2019-2023  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifload::{Decoder, ErrorKind};
use pix::gray::{Gray, Gray8};
use pix::rgb::{Rgb, SRgb8};
use pix::Raster;
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Characters for pixel indices
const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let matches = create_app().get_matches();
    let res = match matches.subcommand() {
        ("show", Some(matches)) => show(&mut out, matches),
        ("peek", Some(matches)) => peek(&mut out, matches),
        _ => Ok(()),
    };
    out.reset()?;
    res
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifload")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("GIF loading utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("max")
                .long("max-image-sz")
                .global(true)
                .takes_value(true)
                .help("maximum image size (bytes)"),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF screen and palette")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("peek")
                .about("Peek at GIF pixel indices")
                .arg(Arg::with_name("file").required(true).help("input file")),
        )
}

/// Get maximum image size option
fn max_image_sz(
    matches: &ArgMatches,
) -> Result<Option<usize>, Box<dyn Error>> {
    match matches.value_of("max") {
        Some(max) => Ok(Some(max.parse()?)),
        None => Ok(Some(1 << 25)),
    }
}

/// Load one GIF file
fn load(
    path: &OsStr,
    max: Option<usize>,
) -> gifload::Result<(Raster<Gray8>, Option<Vec<SRgb8>>)> {
    let f = File::open(path)?;
    Decoder::new(f).max_image_sz(max).load_raster()
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let max = max_image_sz(matches)?;
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            show_file(out, path, max)?;
        }
    }
    Ok(())
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
    max: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    out.set_color(&magenta)?;
    writeln!(out, "{}", path.to_string_lossy())?;
    match load(path, max) {
        Ok((raster, palette)) => {
            out.set_color(&bold)?;
            write!(out, "  {}x{}", raster.width(), raster.height())?;
            match palette {
                Some(p) => writeln!(out, ", colors: {}", p.len())?,
                None => writeln!(out, ", no global color table")?,
            }
        }
        Err(e) => {
            out.set_color(&red)?;
            let kind = match e.kind() {
                ErrorKind::Format => "invalid",
                ErrorKind::Unsupported => "unsupported",
                ErrorKind::Truncated => "truncated",
                ErrorKind::Io => "I/O error",
                ErrorKind::Limit => "too large",
            };
            writeln!(out, "  {}: {}", kind, e)?;
        }
    }
    Ok(())
}

/// Handle peek subcommand
fn peek(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let max = max_image_sz(matches)?;
    let path = match matches.value_of_os("file") {
        Some(path) => path,
        None => return Ok(()),
    };
    let (raster, palette) = load(path, max)?;
    let mut spec = ColorSpec::new();
    for y in 0..raster.height() as i32 {
        for x in 0..raster.width() as i32 {
            let i = usize::from(u8::from(Gray::value(raster.pixel(x, y))));
            let clr = palette.as_ref().and_then(|p| p.get(i)).map(|c| {
                Color::Rgb(
                    u8::from(Rgb::red(*c)),
                    u8::from(Rgb::green(*c)),
                    u8::from(Rgb::blue(*c)),
                )
            });
            out.set_color(spec.set_fg(clr))?;
            write!(out, "{}", char::from(DIGITS[i % DIGITS.len()]))?;
        }
        out.reset()?;
        writeln!(out)?;
    }
    Ok(())
}
