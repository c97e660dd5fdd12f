//! Optional gamma-correction LUT application (§4.10).
//!
//! Grounded on `decoder.py`'s `_gamma_correct`: build a lookup table once per bit depth,
//! skip entirely when the file already encodes the conventional `0.45455` gamma, and
//! never touch the alpha channel.

use crate::chunks::IhdrInfo;
use crate::error::{PngError, Result};
use crate::pixels::PixelBuffer;

const CONVENTIONAL_GAMMA: f64 = 0.45455;

fn build_lut(gamma: f64, bit_depth: u32) -> Vec<f64> {
    let max = ((1u32 << bit_depth) - 1) as f64;
    let decoding_exp = 1.0 / (gamma * 1.0 * 2.2);
    (0..=max as u32)
        .map(|i| ((i as f64 / max).powf(decoding_exp) * max).round())
        .collect()
}

/// Applies the LUT to every channel except the last of each `channels`-wide pixel.
/// Called only with `channels` 3 (RGB, no alpha to skip) or 4 (RGBA, alpha skipped).
fn apply_u8(values: &mut [u8], channels: usize, lut: &[f64]) {
    let color_channels = if channels == 4 { 3 } else { channels };
    for pixel in values.chunks_mut(channels) {
        for channel in pixel.iter_mut().take(color_channels) {
            *channel = lut[*channel as usize] as u8;
        }
    }
}

fn apply_u16(values: &mut [u16], channels: usize, lut: &[f64]) {
    let color_channels = if channels == 4 { 3 } else { channels };
    for pixel in values.chunks_mut(channels) {
        for channel in pixel.iter_mut().take(color_channels) {
            *channel = lut[*channel as usize] as u16;
        }
    }
}

/// Applies gamma correction to `buffer` in place if `gamma` is present and not the
/// conventional default; color_types 0, 4 (no chromatic color data) and the
/// bit_depth/color_type combinations outside {2,3,6}×{8,16} are rejected per §4.10.
///
/// `header` carries the *original* IHDR `bit_depth`, not the materialized buffer's
/// element width: a palette (`color_type` 3) image always materializes to `Rgb8`
/// regardless of its index bit_depth, so checking the buffer variant alone would miss
/// a 1/2/4-bit palette image, which §4.10 requires to be fatal when gAMA is present.
pub fn correct(buffer: &mut PixelBuffer, header: &IhdrInfo, gamma: Option<f64>) -> Result<()> {
    let Some(gamma) = gamma else { return Ok(()) };
    if header.color_type == 3 && !matches!(header.bit_depth, 8 | 16) {
        return Err(PngError::UnsupportedParameter(format!(
            "gamma correction on a palette image requires bit_depth 8 or 16, got {}",
            header.bit_depth
        )));
    }
    if (gamma - CONVENTIONAL_GAMMA).abs() < 1e-9 {
        return Ok(());
    }

    match buffer {
        PixelBuffer::Rgb8(arr) => {
            let lut = build_lut(gamma, 8);
            apply_u8(arr.as_mut_slice(), 3, &lut);
        }
        PixelBuffer::Rgb16(arr) => {
            let lut = build_lut(gamma, 16);
            apply_u16(arr.as_mut_slice(), 3, &lut);
        }
        PixelBuffer::Rgba8(arr) => {
            let lut = build_lut(gamma, 8);
            apply_u8(arr.as_mut_slice(), 4, &lut);
        }
        PixelBuffer::Rgba16(arr) => {
            let lut = build_lut(gamma, 16);
            apply_u16(arr.as_mut_slice(), 4, &lut);
        }
        PixelBuffer::Gray8(_)
        | PixelBuffer::Gray16(_)
        | PixelBuffer::GrayAlpha8(_)
        | PixelBuffer::GrayAlpha16(_) => {
            return Err(PngError::UnsupportedParameter(
                "gamma correction only applies to color_types 2, 3, and 6".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Array3;

    fn header(color_type: u8, bit_depth: u8) -> IhdrInfo {
        IhdrInfo {
            width: 1,
            height: 1,
            bit_depth,
            color_type,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        }
    }

    #[test]
    fn conventional_gamma_is_a_no_op() {
        let mut buffer = PixelBuffer::Rgb8(Array3::from_vec(1, 1, 3, vec![100, 150, 200]));
        correct(&mut buffer, &header(2, 8), Some(0.45455)).unwrap();
        match buffer {
            PixelBuffer::Rgb8(arr) => assert_eq!(arr.as_slice(), &[100, 150, 200]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn absent_gamma_is_a_no_op() {
        let mut buffer = PixelBuffer::Rgb8(Array3::from_vec(1, 1, 3, vec![100, 150, 200]));
        correct(&mut buffer, &header(2, 8), None).unwrap();
        match buffer {
            PixelBuffer::Rgb8(arr) => assert_eq!(arr.as_slice(), &[100, 150, 200]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn rgba_leaves_alpha_untouched() {
        let mut buffer = PixelBuffer::Rgba8(Array3::from_vec(1, 1, 4, vec![128, 128, 128, 77]));
        correct(&mut buffer, &header(6, 8), Some(1.0)).unwrap();
        match buffer {
            PixelBuffer::Rgba8(arr) => assert_eq!(*arr.get(0, 0, 3), 77),
            _ => unreachable!(),
        }
    }

    #[test]
    fn gray_is_rejected() {
        let mut buffer = PixelBuffer::Gray8(crate::buffer::Array2::from_vec(1, 1, vec![100]));
        assert!(matches!(
            correct(&mut buffer, &header(0, 8), Some(1.0)),
            Err(PngError::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn palette_with_subbyte_bit_depth_is_rejected() {
        // materialize() always produces Rgb8 for color_type 3, regardless of the
        // original index bit_depth, so the check must come from the header, not buffer.
        let mut buffer = PixelBuffer::Rgb8(Array3::from_vec(1, 1, 3, vec![10, 20, 30]));
        assert!(matches!(
            correct(&mut buffer, &header(3, 4), Some(1.0)),
            Err(PngError::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn palette_with_8bit_depth_is_corrected_normally() {
        let mut buffer = PixelBuffer::Rgb8(Array3::from_vec(1, 1, 3, vec![128, 128, 128]));
        correct(&mut buffer, &header(3, 8), Some(1.0)).unwrap();
        match buffer {
            PixelBuffer::Rgb8(arr) => assert!(*arr.get(0, 0, 0) != 128),
            _ => unreachable!(),
        }
    }
}
