//! Pixel materialization (§4.9): shapes unfiltered scanline bytes into typed pixel
//! buffers according to `(color_type, bit_depth)`.
//!
//! Grounded on `decoder.py`'s `_generate_color_data`, which contains the exact
//! bit-unpacking and 16-bit byte-pairing formulas this module reproduces.

use crate::buffer::{Array2, Array3};
use crate::chunks::IhdrInfo;
use crate::error::{PngError, Result};

/// The decoded image's pixel data, shaped and typed per `(color_type, bit_depth)`.
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    Gray8(Array2<u8>),
    Gray16(Array2<u16>),
    Rgb8(Array3<u8>),
    Rgb16(Array3<u16>),
    GrayAlpha8(Array3<u8>),
    GrayAlpha16(Array3<u16>),
    Rgba8(Array3<u8>),
    Rgba16(Array3<u16>),
}

/// Scales a sub-8-bit grayscale sample up to the full 0..=255 range.
fn expand_sample(value: u8, bit_depth: u8) -> u8 {
    let max = (1u16 << bit_depth) - 1;
    ((value as u16 * 0xFF) / max) as u8
}

/// Unpacks a bit-depth-1/2/4 scanline into one sample per pixel (still raw indices,
/// not yet scaled), MSB-first within each byte as the PNG spec requires.
fn unpack_subbyte_samples(row: &[u8], width: usize, bit_depth: u8) -> Vec<u8> {
    let mask = (1u16 << bit_depth) - 1;
    let mut samples = Vec::with_capacity(width);
    let mut bit_offset = 0usize;
    for _ in 0..width {
        let byte = row[bit_offset / 8];
        let shift = 8 - bit_depth as usize - (bit_offset % 8);
        let value = ((byte as u16 >> shift) & mask) as u8;
        samples.push(value);
        bit_offset += bit_depth as usize;
    }
    samples
}

fn pair_be16(hi: u8, lo: u8) -> u16 {
    u16::from_be_bytes([hi, lo])
}

/// Shapes `unfiltered` bytes into a `PixelBuffer` per §4.9; `palette` is required (and
/// used) only for `color_type == 3`.
pub fn materialize(
    header: &IhdrInfo,
    unfiltered: &[u8],
    palette: Option<&[[u8; 3]]>,
) -> Result<PixelBuffer> {
    let width = header.width as usize;
    let height = header.height as usize;
    let bit_depth = header.bit_depth;
    let row_bytes = unfiltered.len() / height.max(1);

    match (header.color_type, bit_depth) {
        (0, 1 | 2 | 4) => {
            let mut data = Vec::with_capacity(width * height);
            for row in unfiltered.chunks(row_bytes) {
                for sample in unpack_subbyte_samples(row, width, bit_depth) {
                    data.push(expand_sample(sample, bit_depth));
                }
            }
            Ok(PixelBuffer::Gray8(Array2::from_vec(height, width, data)))
        }
        (0, 8) => Ok(PixelBuffer::Gray8(Array2::from_vec(
            height,
            width,
            unfiltered.to_vec(),
        ))),
        (0, 16) => {
            let data = unfiltered
                .chunks_exact(2)
                .map(|c| pair_be16(c[0], c[1]))
                .collect();
            Ok(PixelBuffer::Gray16(Array2::from_vec(height, width, data)))
        }
        (2, 8) => Ok(PixelBuffer::Rgb8(Array3::from_vec(
            height,
            width,
            3,
            unfiltered.to_vec(),
        ))),
        (2, 16) => {
            let data = unfiltered
                .chunks_exact(2)
                .map(|c| pair_be16(c[0], c[1]))
                .collect();
            Ok(PixelBuffer::Rgb16(Array3::from_vec(height, width, 3, data)))
        }
        (3, 1 | 2 | 4 | 8) => {
            let palette = palette.ok_or(PngError::UnsupportedParameter(
                "color_type 3 requires a PLTE chunk".into(),
            ))?;
            let mut data = Vec::with_capacity(width * height * 3);
            for row in unfiltered.chunks(row_bytes) {
                let indices = if bit_depth == 8 {
                    row[..width].to_vec()
                } else {
                    unpack_subbyte_samples(row, width, bit_depth)
                };
                for index in indices {
                    let rgb = palette.get(index as usize).ok_or(
                        PngError::UnsupportedParameter(format!(
                            "palette index {index} out of range"
                        )),
                    )?;
                    data.extend_from_slice(rgb);
                }
            }
            Ok(PixelBuffer::Rgb8(Array3::from_vec(height, width, 3, data)))
        }
        (4, 8) => {
            let mut data = Vec::with_capacity(width * height * 4);
            for pair in unfiltered.chunks_exact(2) {
                let (gray, alpha) = (pair[0], pair[1]);
                data.extend_from_slice(&[gray, gray, gray, alpha]);
            }
            Ok(PixelBuffer::GrayAlpha8(Array3::from_vec(height, width, 4, data)))
        }
        (4, 16) => {
            let mut data = Vec::with_capacity(width * height * 4);
            for pair in unfiltered.chunks_exact(4) {
                let gray = pair_be16(pair[0], pair[1]);
                let alpha = pair_be16(pair[2], pair[3]);
                data.extend_from_slice(&[gray, gray, gray, alpha]);
            }
            Ok(PixelBuffer::GrayAlpha16(Array3::from_vec(height, width, 4, data)))
        }
        (6, 8) => Ok(PixelBuffer::Rgba8(Array3::from_vec(
            height,
            width,
            4,
            unfiltered.to_vec(),
        ))),
        (6, 16) => {
            let data = unfiltered
                .chunks_exact(2)
                .map(|c| pair_be16(c[0], c[1]))
                .collect();
            Ok(PixelBuffer::Rgba16(Array3::from_vec(height, width, 4, data)))
        }
        (color_type, bit_depth) => Err(PngError::UnsupportedParameter(format!(
            "color_type {color_type} with bit_depth {bit_depth} is not a valid PNG combination"
        ))),
    }
}
