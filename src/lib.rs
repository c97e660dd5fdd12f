//! A from-scratch PNG decoder: chunk framing and CRC, zlib/DEFLATE decompression,
//! scanline filter reversal, and pixel materialization, with an optional gamma LUT pass.
//!
//! The public surface is a single entry point, [`decode`], taking a complete PNG byte
//! buffer and returning an owned [`DecodedImage`]. There is no streaming or partial-input
//! mode; the caller is expected to have the whole file in memory.

pub mod adler32;
pub mod bitstream;
pub mod buffer;
pub mod chunks;
pub mod crc32;
pub mod deflate;
pub mod error;
pub mod filter;
pub mod gamma;
pub mod huffman;
pub mod pixels;
pub mod zlib;

use log::debug;

pub use chunks::{IhdrInfo, TimeInfo};
pub use error::PngError;
pub use pixels::PixelBuffer;

/// The decoded image: its header fields plus the materialized, gamma-corrected pixels.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub header: IhdrInfo,
    pub pixels: PixelBuffer,
}

fn validate_header(header: &IhdrInfo) -> error::Result<()> {
    if header.compression_method != 0 {
        return Err(PngError::UnsupportedParameter(format!(
            "compression method {} is not DEFLATE",
            header.compression_method
        )));
    }
    if header.filter_method != 0 {
        return Err(PngError::UnsupportedParameter(format!(
            "filter method {} is not the standard adaptive filter set",
            header.filter_method
        )));
    }
    if header.interlace_method == 1 {
        return Err(PngError::UnsupportedParameter(
            "Adam-7 interlacing is not implemented".into(),
        ));
    }
    if header.interlace_method != 0 {
        return Err(PngError::UnsupportedParameter(format!(
            "unknown interlace method {}",
            header.interlace_method
        )));
    }
    Ok(())
}

/// Decodes a complete PNG file into an in-memory pixel buffer (C11, §4.1).
///
/// Drives the stages in order: chunk framing and CRC verification, zlib/DEFLATE
/// decompression of the concatenated `IDAT` payload, per-scanline filter reversal,
/// pixel materialization, and (if a `gAMA` chunk was present) gamma correction.
pub fn decode(data: &[u8]) -> error::Result<DecodedImage> {
    debug!("reading chunks");
    let parsed = chunks::read(data)?;
    let header = parsed
        .header
        .ok_or(PngError::UnsupportedParameter("missing IHDR chunk".into()))?;
    validate_header(&header)?;

    if header.color_type == 3 && parsed.palette.is_none() {
        return Err(PngError::UnsupportedParameter(
            "color_type 3 requires a PLTE chunk".into(),
        ));
    }

    debug!("inflating {} bytes of IDAT payload", parsed.idat.len());
    let decompressed = zlib::decompress(&parsed.idat)?;

    debug!("reversing scanline filters");
    let unfiltered = filter::unfilter(&header, &decompressed)?;

    debug!("materializing pixels for color_type={} bit_depth={}", header.color_type, header.bit_depth);
    let mut pixels = pixels::materialize(&header, &unfiltered, parsed.palette.as_deref())?;

    if parsed.gamma.is_some() && matches!(header.color_type, 2 | 3 | 6) {
        debug!("applying gamma correction");
        gamma::correct(&mut pixels, &header, parsed.gamma)?;
    }

    Ok(DecodedImage { header, pixels })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(data);
        out.extend_from_slice(&crc32::calculate_concat(chunk_type, data).to_be_bytes());
        out
    }

    fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
        let mut data = width.to_be_bytes().to_vec();
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
        data
    }

    fn zlib_stored(raw: &[u8]) -> Vec<u8> {
        let mut out = vec![0x78, 0x01]; // CMF/FLG, fastest level, valid mod-31
        let mut body = vec![0b0000_0001u8];
        body.extend_from_slice(&(raw.len() as u16).to_le_bytes());
        body.extend_from_slice(&(!(raw.len() as u16)).to_le_bytes());
        body.extend_from_slice(raw);
        out.extend_from_slice(&body);
        out.extend_from_slice(&adler32::calculate(raw).to_be_bytes());
        out
    }

    #[test]
    fn decodes_a_one_by_one_red_rgb_image() {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend(chunk(b"IHDR", &ihdr(1, 1, 8, 2)));
        // one scanline: filter byte 0 (None) + raw RGB
        let raw_scanline = [0u8, 0xFF, 0x00, 0x00];
        png.extend(chunk(b"IDAT", &zlib_stored(&raw_scanline)));
        png.extend(chunk(b"IEND", b""));

        let image = decode(&png).unwrap();
        assert_eq!(image.header.width, 1);
        match image.pixels {
            PixelBuffer::Rgb8(arr) => {
                assert_eq!(
                    (*arr.get(0, 0, 0), *arr.get(0, 0, 1), *arr.get(0, 0, 2)),
                    (255, 0, 0)
                );
            }
            other => panic!("expected Rgb8, got {other:?}"),
        }
    }

    #[test]
    fn corrupted_idat_crc_fails_closed() {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend(chunk(b"IHDR", &ihdr(1, 1, 8, 2)));
        let mut idat_chunk = chunk(b"IDAT", &zlib_stored(&[0u8, 1, 2, 3]));
        let last = idat_chunk.len() - 1;
        idat_chunk[last] ^= 0xFF;
        png.extend(idat_chunk);
        png.extend(chunk(b"IEND", b""));

        assert!(matches!(decode(&png), Err(PngError::BadChunkCrc { .. })));
    }

    #[test]
    fn grayscale_alpha_shapes_to_four_channels() {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend(chunk(b"IHDR", &ihdr(1, 1, 8, 4)));
        let raw_scanline = [0u8, 0x80, 0x40]; // filter None, gray=0x80, alpha=0x40
        png.extend(chunk(b"IDAT", &zlib_stored(&raw_scanline)));
        png.extend(chunk(b"IEND", b""));

        let image = decode(&png).unwrap();
        match image.pixels {
            PixelBuffer::GrayAlpha8(arr) => {
                assert_eq!(arr.shape(), (1, 1, 4));
                assert_eq!(*arr.get(0, 0, 0), 0x80);
                assert_eq!(*arr.get(0, 0, 1), 0x80);
                assert_eq!(*arr.get(0, 0, 2), 0x80);
                assert_eq!(*arr.get(0, 0, 3), 0x40);
            }
            other => panic!("expected GrayAlpha8, got {other:?}"),
        }
    }

    #[test]
    fn interlaced_images_are_unsupported() {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        let mut header_data = ihdr(1, 1, 8, 2);
        *header_data.last_mut().unwrap() = 1; // interlace_method = Adam-7
        png.extend(chunk(b"IHDR", &header_data));
        png.extend(chunk(b"IDAT", &zlib_stored(&[0u8, 1, 2, 3])));
        png.extend(chunk(b"IEND", b""));

        assert!(matches!(decode(&png), Err(PngError::UnsupportedParameter(_))));
    }
}
