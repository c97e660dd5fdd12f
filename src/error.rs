use thiserror::Error;

/// A chunk type tag, stored as its four raw ASCII bytes rather than a `String`
/// so that error values stay cheap to construct and compare.
pub type ChunkType = [u8; 4];

fn chunk_type_str(chunk_type: &ChunkType) -> String {
    String::from_utf8_lossy(chunk_type).into_owned()
}

/// Every way core decoding can fail, per the error kinds the decoder distinguishes.
///
/// No variant here is recoverable internally: decode is all-or-nothing, and every
/// fallible step in the crate returns one of these through `?` rather than panicking
/// or exiting the process.
#[derive(Debug, Error)]
pub enum PngError {
    #[error("not a PNG file: signature mismatch")]
    BadSignature,

    #[error("truncated input at byte offset {offset}: needed {needed} more byte(s)")]
    TruncatedInput { offset: usize, needed: usize },

    #[error("chunk \"{}\" failed CRC check (expected {expected:#010x}, got {actual:#010x})", chunk_type_str(.chunk_type))]
    BadChunkCrc {
        chunk_type: ChunkType,
        expected: u32,
        actual: u32,
    },

    #[error("chunk \"{}\" has invalid length {length}", chunk_type_str(.chunk_type))]
    BadChunkLength { chunk_type: ChunkType, length: u32 },

    #[error("unknown critical chunk \"{}\"", chunk_type_str(.chunk_type))]
    UnknownCriticalChunk { chunk_type: ChunkType },

    #[error("unsupported parameter: {0}")]
    UnsupportedParameter(String),

    #[error("invalid zlib header: {0}")]
    BadZlibHeader(&'static str),

    #[error("invalid DEFLATE stream: {0}")]
    BadDeflateStream(&'static str),

    #[error("checksum mismatch (expected {expected:#010x}, got {actual:#010x})")]
    BadChecksum { expected: u32, actual: u32 },

    #[error("unrecognized filter type {0}")]
    BadFilter(u8),
}

pub type Result<T> = std::result::Result<T, PngError>;
