// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::cpc::pair_table::PairTable;
use crate::error::Error;

/// Min log2 of K.
pub const MIN_LG_K: u8 = 4;
/// Max log2 of K.
pub const MAX_LG_K: u8 = 26;

/// Which of the five CPC representations a sketch is currently in.
///
/// The codec never derives this from sketch contents; the caller computes it
/// from `(numCoupons, windowOffset, k)` and stores it out-of-band alongside
/// the compressed output (see the raw-wire counterpart, [`FlavorCode`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Empty,
    Sparse,
    Hybrid,
    Pinned,
    Sliding,
}

/// The raw, out-of-band discriminator byte a caller persists for a
/// compressed sketch. Unlike [`Flavor`], this is not a closed enum: it is
/// whatever byte came back from storage, and may be corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorCode(pub u8);

impl From<Flavor> for FlavorCode {
    fn from(flavor: Flavor) -> Self {
        FlavorCode(match flavor {
            Flavor::Empty => 0,
            Flavor::Sparse => 1,
            Flavor::Hybrid => 2,
            Flavor::Pinned => 3,
            Flavor::Sliding => 4,
        })
    }
}

impl TryFrom<FlavorCode> for Flavor {
    type Error = Error;

    fn try_from(code: FlavorCode) -> Result<Self, Self::Error> {
        match code.0 {
            0 => Ok(Flavor::Empty),
            1 => Ok(Flavor::Sparse),
            2 => Ok(Flavor::Hybrid),
            3 => Ok(Flavor::Pinned),
            4 => Ok(Flavor::Sliding),
            other => Err(Error::unknown_flavor(other)),
        }
    }
}

/// An uncompressed CPC sketch, as handed to [`compress`](crate::cpc::compress)
/// or returned by [`decompress`](crate::cpc::decompress).
///
/// This is a plain data carrier for the collaborator contract the codec
/// requires; it performs no hashing, no coupon collection, and no cardinality
/// estimation.
#[derive(Debug, Clone)]
pub struct UncompressedSketch {
    pub(crate) lg_k: u8,
    pub(crate) num_coupons: u32,
    pub(crate) window_offset: u8,
    pub(crate) flavor: Flavor,
    pub(crate) sliding_window: Option<Vec<u8>>,
    pub(crate) table: PairTable,
}

impl UncompressedSketch {
    /// Creates an empty sketch (`numCoupons == 0`, no window, no table entries).
    pub fn empty(lg_k: u8) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k out of range; got {lg_k}"
        );
        Self {
            lg_k,
            num_coupons: 0,
            window_offset: 0,
            flavor: Flavor::Empty,
            sliding_window: None,
            table: PairTable::new(lg_k),
        }
    }

    /// Builds a sparse sketch: no window, pairs only.
    pub fn sparse(lg_k: u8, table: PairTable) -> Self {
        assert!(
            (MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k out of range; got {lg_k}"
        );
        let num_coupons = table.len() as u32;
        assert!(num_coupons > 0, "sparse sketch must have at least one pair");
        Self {
            lg_k,
            num_coupons,
            window_offset: 0,
            flavor: Flavor::Sparse,
            sliding_window: None,
            table,
        }
    }

    /// Builds a hybrid sketch: a window at offset 0 plus a table of pairs
    /// with column >= 8.
    pub fn hybrid(lg_k: u8, window: Vec<u8>, table: PairTable) -> Self {
        let k = 1usize << lg_k;
        assert_eq!(window.len(), k, "window must have exactly k bytes");
        let num_coupons = window.iter().map(|b| b.count_ones()).sum::<u32>() + table.len() as u32;
        Self {
            lg_k,
            num_coupons,
            window_offset: 0,
            flavor: Flavor::Hybrid,
            sliding_window: Some(window),
            table,
        }
    }

    /// Builds a pinned sketch: a window at `offset` plus a table of pairs
    /// with column >= 8 (`offset` itself is not encoded in the pairs).
    pub fn pinned(lg_k: u8, window: Vec<u8>, window_offset: u8, table: PairTable) -> Self {
        let k = 1usize << lg_k;
        assert_eq!(window.len(), k, "window must have exactly k bytes");
        assert!(window_offset <= 56);
        let num_coupons = window.iter().map(|b| b.count_ones()).sum::<u32>() + table.len() as u32;
        Self {
            lg_k,
            num_coupons,
            window_offset,
            flavor: Flavor::Pinned,
            sliding_window: Some(window),
            table,
        }
    }

    /// Builds a sliding sketch: a window at `offset` (1..=56) plus a table of pairs.
    pub fn sliding(lg_k: u8, window: Vec<u8>, window_offset: u8, table: PairTable) -> Self {
        let k = 1usize << lg_k;
        assert_eq!(window.len(), k, "window must have exactly k bytes");
        assert!((1..=56).contains(&window_offset));
        let num_coupons = window.iter().map(|b| b.count_ones()).sum::<u32>() + table.len() as u32;
        Self {
            lg_k,
            num_coupons,
            window_offset,
            flavor: Flavor::Sliding,
            sliding_window: Some(window),
            table,
        }
    }

    pub fn lg_k(&self) -> u8 {
        self.lg_k
    }

    pub fn num_coupons(&self) -> u32 {
        self.num_coupons
    }

    pub fn window_offset(&self) -> u8 {
        self.window_offset
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn sliding_window(&self) -> Option<&[u8]> {
        self.sliding_window.as_deref()
    }

    pub fn table(&self) -> &PairTable {
        &self.table
    }
}

/// A compressed CPC sketch: the same scalar fields as [`UncompressedSketch`],
/// plus the two word buffers and their used lengths.
#[derive(Debug, Clone)]
pub struct CompressedSketch {
    pub lg_k: u8,
    pub num_coupons: u32,
    pub window_offset: u8,
    pub flavor: Flavor,
    pub compressed_window: Option<Vec<u32>>,
    pub cw_length: usize,
    pub compressed_surprising_values: Option<Vec<u32>>,
    pub csv_length: usize,
    pub num_compressed_surprising_values: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_round_trips_through_its_code() {
        for flavor in [
            Flavor::Empty,
            Flavor::Sparse,
            Flavor::Hybrid,
            Flavor::Pinned,
            Flavor::Sliding,
        ] {
            let code = FlavorCode::from(flavor);
            assert_eq!(Flavor::try_from(code).unwrap(), flavor);
        }
    }

    #[test]
    fn unrecognized_flavor_code_is_an_error() {
        let err = Flavor::try_from(FlavorCode(9)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnknownFlavor);
    }
}
