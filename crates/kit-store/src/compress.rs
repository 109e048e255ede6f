//! zlib framing for loose object files.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Default zlib level, matching what other tools write for loose objects.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress `data` into a complete zlib stream.
pub fn compress(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflate a complete zlib stream.
pub fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}
