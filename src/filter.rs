//! Per-scanline PNG filter reversal (§4.8).
//!
//! Grounded on `decoder.py`'s `_remove_filter`, which walks scanlines left to right using
//! already-recovered bytes (never the raw filtered bytes) as the left/above/upper-left
//! references.

use log::debug;

use crate::chunks::IhdrInfo;
use crate::error::{PngError, Result};

const FILTER_NONE: u8 = 0;
const FILTER_SUB: u8 = 1;
const FILTER_UP: u8 = 2;
const FILTER_AVERAGE: u8 = 3;
const FILTER_PAETH: u8 = 4;

/// Byte stride between a pixel and its left neighbor, for filter purposes.
fn bytes_per_pixel(header: &IhdrInfo) -> usize {
    if header.bit_depth < 8 {
        1
    } else {
        (header.channels() as usize * header.bit_depth as usize).div_ceil(8)
    }
}

/// Number of filtered bytes per scanline (excluding the filter-type byte).
fn scanline_len(header: &IhdrInfo) -> usize {
    (header.width as usize * header.channels() as usize * header.bit_depth as usize)
        .div_ceil(8)
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i32 + b as i32 - c as i32;
    let pa = (p - a as i32).abs();
    let pb = (p - b as i32).abs();
    let pc = (p - c as i32).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverses the scanline filters, returning the unfiltered byte stream (one
/// `scanline_len` row per image row, filter-type bytes stripped).
pub fn unfilter(header: &IhdrInfo, filtered: &[u8]) -> Result<Vec<u8>> {
    let bpp = bytes_per_pixel(header);
    let row_len = scanline_len(header);
    let height = header.height as usize;

    let mut out = vec![0u8; row_len * height];
    let mut cursor = 0usize;

    for row in 0..height {
        let filter_type = *filtered
            .get(cursor)
            .ok_or(PngError::TruncatedInput { offset: cursor, needed: 1 })?;
        cursor += 1;
        let raw_row = filtered
            .get(cursor..cursor + row_len)
            .ok_or(PngError::TruncatedInput {
                offset: cursor,
                needed: row_len,
            })?;
        cursor += row_len;

        let row_start = row * row_len;
        let prev_row_start = row_start.checked_sub(row_len);

        for j in 0..row_len {
            let left = if j >= bpp { out[row_start + j - bpp] } else { 0 };
            let above = prev_row_start.map_or(0, |start| out[start + j]);
            let upper_left = prev_row_start.map_or(0, |start| {
                if j >= bpp {
                    out[start + j - bpp]
                } else {
                    0
                }
            });

            let predictor = match filter_type {
                FILTER_NONE => 0,
                FILTER_SUB => left,
                FILTER_UP => above,
                FILTER_AVERAGE => ((left as u16 + above as u16) / 2) as u8,
                FILTER_PAETH => paeth_predictor(left, above, upper_left),
                other => return Err(PngError::BadFilter(other)),
            };

            out[row_start + j] = raw_row[j].wrapping_add(predictor);
        }
    }

    debug!("unfiltered {height} scanlines of {row_len} bytes each");
    Ok(out)
}
