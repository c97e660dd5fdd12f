//! PNG container framing: signature check, chunk-by-chunk CRC verification, and
//! dispatch of the chunk types this decoder understands.
//!
//! Grounded on `decoder.py`'s top-level chunk loop (signature check, length/type/data/crc
//! framing, per-type handling) and §4.1.

use log::{debug, info, warn};

use crate::crc32;
use crate::error::{ChunkType, PngError, Result};
use crate::zlib;

const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// The parsed `IHDR` record (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IhdrInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl IhdrInfo {
    /// Number of color/alpha channels implied by `color_type`.
    pub fn channels(&self) -> u8 {
        match self.color_type {
            0 => 1,
            2 => 3,
            3 => 1,
            4 => 2,
            6 => 4,
            _ => 0,
        }
    }
}

/// A `tIME` record: last-modification timestamp (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInfo {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Everything the chunk reader extracts from the container, handed to the
/// orchestrator (C11) for the remaining decode stages.
#[derive(Debug, Default)]
pub struct ParsedChunks {
    pub header: Option<IhdrInfo>,
    pub palette: Option<Vec<[u8; 3]>>,
    pub idat: Vec<u8>,
    pub gamma: Option<f64>,
    pub time: Option<TimeInfo>,
}

fn read_u32_be(data: &[u8], offset: usize) -> Result<u32> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .ok_or(PngError::TruncatedInput { offset, needed: 4 })?
        .try_into()
        .unwrap();
    Ok(u32::from_be_bytes(bytes))
}

fn is_critical(chunk_type: &ChunkType) -> bool {
    chunk_type[0].is_ascii_uppercase()
}

fn parse_ihdr(data: &[u8]) -> Result<IhdrInfo> {
    if data.len() != 13 {
        return Err(PngError::BadChunkLength {
            chunk_type: *b"IHDR",
            length: data.len() as u32,
        });
    }
    Ok(IhdrInfo {
        width: u32::from_be_bytes(data[0..4].try_into().unwrap()),
        height: u32::from_be_bytes(data[4..8].try_into().unwrap()),
        bit_depth: data[8],
        color_type: data[9],
        compression_method: data[10],
        filter_method: data[11],
        interlace_method: data[12],
    })
}

fn parse_plte(data: &[u8]) -> Result<Vec<[u8; 3]>> {
    if data.is_empty() || data.len() % 3 != 0 || data.len() > 768 {
        return Err(PngError::BadChunkLength {
            chunk_type: *b"PLTE",
            length: data.len() as u32,
        });
    }
    Ok(data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn parse_time(data: &[u8]) -> Result<TimeInfo> {
    if data.len() != 7 {
        return Err(PngError::BadChunkLength {
            chunk_type: *b"tIME",
            length: data.len() as u32,
        });
    }
    Ok(TimeInfo {
        year: u16::from_be_bytes([data[0], data[1]]),
        month: data[2],
        day: data[3],
        hour: data[4],
        minute: data[5],
        second: data[6],
    })
}

fn parse_gamma(data: &[u8]) -> Result<f64> {
    if data.len() != 4 {
        return Err(PngError::BadChunkLength {
            chunk_type: *b"gAMA",
            length: data.len() as u32,
        });
    }
    let raw = u32::from_be_bytes(data.try_into().unwrap());
    Ok(raw as f64 / 100_000.0)
}

/// Splits `keyword\0rest` on the first NUL, as used by `tEXt`/`zTXt`/`iTXt`.
fn split_nul(data: &[u8], chunk_type: ChunkType) -> Result<(&[u8], &[u8])> {
    let pos = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(PngError::BadChunkLength {
            chunk_type,
            length: data.len() as u32,
        })?;
    Ok((&data[..pos], &data[pos + 1..]))
}

fn handle_text(data: &[u8]) {
    match split_nul(data, *b"tEXt") {
        Ok((keyword, text)) => {
            let keyword = String::from_utf8_lossy(keyword);
            let text = text.iter().map(|&b| b as char).collect::<String>();
            info!("tEXt {keyword}: {text}");
        }
        Err(_) => warn!("malformed tEXt chunk ignored"),
    }
}

fn handle_ztxt(data: &[u8]) -> Result<()> {
    let (keyword, rest) = split_nul(data, *b"zTXt")?;
    let (&method, compressed) = rest
        .split_first()
        .ok_or(PngError::BadChunkLength {
            chunk_type: *b"zTXt",
            length: data.len() as u32,
        })?;
    if method != 0 {
        return Err(PngError::UnsupportedParameter(format!(
            "zTXt compression method {method}"
        )));
    }
    let decompressed = zlib::decompress(compressed)?;
    let keyword = String::from_utf8_lossy(keyword);
    let text = String::from_utf8_lossy(&decompressed);
    info!("zTXt {keyword}: {text}");
    Ok(())
}

fn handle_itxt(data: &[u8]) -> Result<()> {
    let chunk_type = *b"iTXt";
    let (keyword, rest) = split_nul(data, chunk_type)?;
    let (&compression_flag, rest) = rest.split_first().ok_or(PngError::BadChunkLength {
        chunk_type,
        length: data.len() as u32,
    })?;
    let (&compression_method, rest) = rest.split_first().ok_or(PngError::BadChunkLength {
        chunk_type,
        length: data.len() as u32,
    })?;
    let (_language_tag, rest) = split_nul(rest, chunk_type)?;
    let (_translated_keyword, text) = split_nul(rest, chunk_type)?;

    let text = if compression_flag == 1 {
        if compression_method != 0 {
            return Err(PngError::UnsupportedParameter(format!(
                "iTXt compression method {compression_method}"
            )));
        }
        String::from_utf8_lossy(&zlib::decompress(text)?).into_owned()
    } else {
        String::from_utf8_lossy(text).into_owned()
    };
    let keyword = String::from_utf8_lossy(keyword);
    info!("iTXt {keyword}: {text}");
    Ok(())
}

/// Checks the signature, walks every chunk verifying its CRC, and dispatches each
/// chunk type per §4.1, returning everything the later decode stages need.
pub fn read(data: &[u8]) -> Result<ParsedChunks> {
    if data.len() < 8 || data[..8] != SIGNATURE {
        return Err(PngError::BadSignature);
    }

    let mut parsed = ParsedChunks::default();
    let mut offset = 8usize;
    let mut seen_ihdr = false;

    loop {
        let length = read_u32_be(data, offset)?;
        offset += 4;
        let chunk_type: ChunkType = data
            .get(offset..offset + 4)
            .ok_or(PngError::TruncatedInput { offset, needed: 4 })?
            .try_into()
            .unwrap();
        offset += 4;
        let length = length as usize;
        let chunk_data = data
            .get(offset..offset + length)
            .ok_or(PngError::TruncatedInput {
                offset,
                needed: length,
            })?;
        offset += length;
        let stored_crc = read_u32_be(data, offset)?;
        offset += 4;

        let actual_crc = crc32::calculate_concat(&chunk_type, chunk_data);
        if actual_crc != stored_crc {
            return Err(PngError::BadChunkCrc {
                chunk_type,
                expected: stored_crc,
                actual: actual_crc,
            });
        }

        debug!(
            "chunk {} len={length}",
            String::from_utf8_lossy(&chunk_type)
        );

        if !seen_ihdr && chunk_type != *b"IHDR" {
            return Err(PngError::UnsupportedParameter(
                "IHDR must be the first chunk".into(),
            ));
        }

        match &chunk_type {
            b"IHDR" => {
                if seen_ihdr {
                    return Err(PngError::UnsupportedParameter(
                        "duplicate IHDR chunk".into(),
                    ));
                }
                parsed.header = Some(parse_ihdr(chunk_data)?);
                seen_ihdr = true;
            }
            b"PLTE" => parsed.palette = Some(parse_plte(chunk_data)?),
            b"IDAT" => parsed.idat.extend_from_slice(chunk_data),
            b"IEND" => break,
            b"tEXt" => handle_text(chunk_data),
            b"zTXt" => handle_ztxt(chunk_data)?,
            b"iTXt" => handle_itxt(chunk_data)?,
            b"tIME" => parsed.time = Some(parse_time(chunk_data)?),
            b"gAMA" => parsed.gamma = Some(parse_gamma(chunk_data)?),
            _ => {
                if is_critical(&chunk_type) {
                    return Err(PngError::UnknownCriticalChunk { chunk_type });
                }
                warn!(
                    "ignoring unknown ancillary chunk {}",
                    String::from_utf8_lossy(&chunk_type)
                );
            }
        }
    }

    Ok(parsed)
}
