//! zlib container (RFC 1950) wrapping a raw DEFLATE stream: a two-byte header, the
//! compressed payload, and an Adler-32 trailer over the decompressed bytes.
//!
//! Grounded on `Zlib.decompress_zlib`/`_read_zlib_header`/`_interpret_zlib_header`.

use log::debug;

use crate::adler32;
use crate::bitstream::{BitStream, Endian};
use crate::deflate;
use crate::error::{PngError, Result};

/// Validates the two-byte zlib header and returns the informational `FLEVEL` value.
fn read_header(bits: &mut BitStream) -> Result<u8> {
    let cmf = bits.read_byte(false)?;
    let flg = bits.read_byte(false)?;

    if (cmf as u32 * 256 + flg as u32) % 31 != 0 {
        return Err(PngError::BadZlibHeader("CMF/FLG checksum is not a multiple of 31"));
    }
    if cmf & 0x0F != 8 {
        return Err(PngError::BadZlibHeader("compression method is not DEFLATE (CM != 8)"));
    }
    if (cmf >> 4) > 7 {
        return Err(PngError::BadZlibHeader("window size exceeds 32 KiB (CINFO > 7)"));
    }
    if flg & 0b0010_0000 != 0 {
        return Err(PngError::BadZlibHeader("preset dictionary is not supported (FDICT set)"));
    }

    let flevel = flg >> 6;
    debug!(
        "zlib header: cm=deflate, cinfo={}, flevel={}",
        cmf >> 4,
        match flevel {
            0 => "fastest",
            1 => "fast",
            2 => "default",
            _ => "maximum",
        }
    );
    Ok(flevel)
}

/// Decompresses a zlib stream, returning the raw decompressed bytes.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut bits = BitStream::new(data);
    read_header(&mut bits)?;

    let mut out = Vec::new();
    deflate::decompress(&mut bits, &mut out)?;

    let expected = bits.read_bytes(4, false, Endian::Big)?;
    let actual = adler32::calculate(&out);
    if expected != actual {
        return Err(PngError::BadChecksum { expected, actual });
    }

    Ok(out)
}
