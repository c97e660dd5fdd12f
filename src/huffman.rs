//! Canonical prefix-code (Huffman) trees used by the code-length, literal/length, and
//! distance codes of a DEFLATE stream.
//!
//! Grounded on `original_source`'s `HuffmanTree` (a pointer-walked binary tree keyed by
//! bit-string), generalized here into a length-indexed lookup keyed by `(length, code)`
//! — the "flat array" alternative the design notes call out as the stronger
//! implementation of the same `insert`/`search`/`canonical` contract.

use std::collections::{HashMap, HashSet};

use crate::error::{PngError, Result};

/// A symbol→length mapping used to build a canonical code; a length of 0 means the
/// symbol is unused.
pub type LengthTable = [u8];

#[derive(Default)]
pub struct HuffmanTree {
    /// (code_length, code_bits) -> symbol.
    codes: HashMap<(u8, u32), u16>,
    /// Every occupied (length, code) pair, used to reject a shorter existing prefix.
    occupied: HashSet<(u8, u32)>,
    /// Tallest code length inserted so far; `search` gives up past this many bits.
    height: u8,
}

impl HuffmanTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Records a leaf at the path defined by the `length` most significant bits of
    /// `code`. Fails if a shorter prefix already occupies part of this path, or if
    /// this exact (length, code) already has a leaf.
    pub fn insert(&mut self, symbol: u16, code: u32, length: u8) -> Result<()> {
        if length == 0 {
            return Err(PngError::BadDeflateStream("zero-length Huffman code"));
        }
        for shorter in 1..length {
            let prefix = code >> (length - shorter);
            if self.occupied.contains(&(shorter, prefix)) {
                return Err(PngError::BadDeflateStream(
                    "Huffman code collides with a shorter existing prefix",
                ));
            }
        }
        if self.codes.insert((length, code), symbol).is_some() {
            return Err(PngError::BadDeflateStream(
                "duplicate Huffman code during construction",
            ));
        }
        self.occupied.insert((length, code));
        self.height = self.height.max(length);
        Ok(())
    }

    /// Returns the symbol iff some leaf's code equals `code` padded to `length` bits;
    /// `None` means "no match yet", i.e. the caller should extend the code by one more
    /// bit and call again, up to `height()` bits.
    pub fn search(&self, code: u32, length: u8) -> Option<u16> {
        self.codes.get(&(length, code)).copied()
    }

    /// Builds the canonical prefix code from a symbol→length mapping (§4.5): drop
    /// zero-length symbols, sort ascending by (length, symbol), assign the all-zeros
    /// code of the smallest length to the first symbol, increment between symbols of
    /// equal length, and left-shift when moving to a longer code.
    pub fn canonical(lengths: &LengthTable) -> Result<Self> {
        let mut present: Vec<(u16, u8)> = lengths
            .iter()
            .enumerate()
            .filter(|&(_, &len)| len != 0)
            .map(|(symbol, &len)| (symbol as u16, len))
            .collect();
        present.sort_by_key(|&(symbol, len)| (len, symbol));

        let mut tree = HuffmanTree::new();
        let mut code = 0u32;
        let mut code_len = 0u8;
        for (symbol, len) in present {
            if len > code_len {
                code <<= len - code_len;
                code_len = len;
            }
            tree.insert(symbol, code, code_len)?;
            code += 1;
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_matches_rfc1951_example() {
        // A, B, C, D with lengths 3, 3, 3, 3 -> codes 000, 001, 010, 011
        let lengths = [3u8, 3, 3, 3];
        let tree = HuffmanTree::canonical(&lengths).unwrap();
        assert_eq!(tree.search(0b000, 3), Some(0));
        assert_eq!(tree.search(0b001, 3), Some(1));
        assert_eq!(tree.search(0b010, 3), Some(2));
        assert_eq!(tree.search(0b011, 3), Some(3));
    }

    #[test]
    fn canonical_variable_lengths() {
        // symbols: 0->2 bits, 1->1 bit, 2->3 bits, 3->3 bits
        // sorted by (len, symbol): 1(1), 0(2), 2(3), 3(3)
        let lengths = [2u8, 1, 3, 3];
        let tree = HuffmanTree::canonical(&lengths).unwrap();
        assert_eq!(tree.search(0b0, 1), Some(1));
        assert_eq!(tree.search(0b10, 2), Some(0));
        assert_eq!(tree.search(0b110, 3), Some(2));
        assert_eq!(tree.search(0b111, 3), Some(3));
    }

    #[test]
    fn search_returns_none_for_unknown_prefix() {
        let lengths = [2u8, 1, 3, 3];
        let tree = HuffmanTree::canonical(&lengths).unwrap();
        assert_eq!(tree.search(0b1, 1), None);
    }

    #[test]
    fn insert_rejects_shorter_prefix_collision() {
        let mut tree = HuffmanTree::new();
        tree.insert(0, 0b1, 1).unwrap();
        assert!(tree.insert(1, 0b10, 2).is_err());
    }

    #[test]
    fn height_tracks_tallest_inserted_code() {
        let lengths = [2u8, 1, 3, 3];
        let tree = HuffmanTree::canonical(&lengths).unwrap();
        assert_eq!(tree.height(), 3);
    }
}
