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

//! The five flavor drivers: per-flavor canonicalization of the pair stream
//! (column rotation, permutation, sort, 8-shift) wrapping the byte Huffman
//! and pair codecs.

use crate::cpc::byte_huffman::{decode_bytes, encode_bytes, safe_length_for_compressed_window_buf};
use crate::cpc::compression_data::{COLUMN_PERMUTATIONS_FOR_DECODING, COLUMN_PERMUTATIONS_FOR_ENCODING};
use crate::cpc::pair_codec::{
    decode_pairs, encode_pairs, golomb_choose_number_of_base_bits, safe_length_for_compressed_pair_buf,
};
use crate::cpc::pair_table::{introspective_insertion_sort, PairTable};
use crate::cpc::phase::determine_pseudo_phase;
use crate::cpc::sketch::{CompressedSketch, Flavor, UncompressedSketch};
use crate::error::Error;

/// Compresses `sketch` according to its flavor.
pub fn compress(sketch: &UncompressedSketch) -> CompressedSketch {
    match sketch.flavor {
        Flavor::Empty => compress_empty(sketch),
        Flavor::Sparse => compress_sparse(sketch),
        Flavor::Hybrid => compress_hybrid(sketch),
        Flavor::Pinned => compress_pinned(sketch),
        Flavor::Sliding => compress_sliding(sketch),
    }
}

/// Decompresses `compressed` back into an [`UncompressedSketch`].
///
/// Fails only if the bitstream is shorter than the decoder's fixed read plan
/// requires (`ErrorKind::CorruptCompressedData`); everything else is a
/// precondition enforced by `debug_assert!`.
pub fn decompress(compressed: &CompressedSketch) -> Result<UncompressedSketch, Error> {
    match compressed.flavor {
        Flavor::Empty => Ok(decompress_empty(compressed)),
        Flavor::Sparse => decompress_sparse(compressed),
        Flavor::Hybrid => decompress_hybrid(compressed),
        Flavor::Pinned => decompress_pinned(compressed),
        Flavor::Sliding => decompress_sliding(compressed),
    }
}

// ---------------------------------------------------------------- EMPTY ---

fn compress_empty(sketch: &UncompressedSketch) -> CompressedSketch {
    debug_assert_eq!(sketch.num_coupons, 0);
    CompressedSketch {
        lg_k: sketch.lg_k,
        num_coupons: 0,
        window_offset: sketch.window_offset,
        flavor: Flavor::Empty,
        compressed_window: None,
        cw_length: 0,
        compressed_surprising_values: None,
        csv_length: 0,
        num_compressed_surprising_values: 0,
    }
}

fn decompress_empty(compressed: &CompressedSketch) -> UncompressedSketch {
    debug_assert_eq!(compressed.num_coupons, 0);
    UncompressedSketch::empty(compressed.lg_k)
}

// --------------------------------------------------------------- SPARSE ---

fn compress_sparse(sketch: &UncompressedSketch) -> CompressedSketch {
    debug_assert!(sketch.sliding_window.is_none());
    let mut pairs = sketch.table.items();
    introspective_insertion_sort(&mut pairs);

    let k = 1u32 << sketch.lg_k;
    let (words, used, num_pairs) = compress_surprising_values(&pairs, k);

    CompressedSketch {
        lg_k: sketch.lg_k,
        num_coupons: sketch.num_coupons,
        window_offset: sketch.window_offset,
        flavor: Flavor::Sparse,
        compressed_window: None,
        cw_length: 0,
        compressed_surprising_values: Some(words),
        csv_length: used,
        num_compressed_surprising_values: num_pairs,
    }
}

fn decompress_sparse(compressed: &CompressedSketch) -> Result<UncompressedSketch, Error> {
    let k = 1u32 << compressed.lg_k;
    let words = compressed
        .compressed_surprising_values
        .as_deref()
        .unwrap_or(&[]);
    let pairs = decompress_surprising_values(
        &words[..compressed.csv_length],
        k,
        compressed.num_compressed_surprising_values,
    )?;

    let mut table = PairTable::new(compressed.lg_k);
    for code in pairs {
        table.insert_code(code);
    }

    Ok(UncompressedSketch {
        lg_k: compressed.lg_k,
        num_coupons: compressed.num_coupons,
        window_offset: compressed.window_offset,
        flavor: Flavor::Sparse,
        sliding_window: None,
        table,
    })
}

// --------------------------------------------------------------- HYBRID ---

fn compress_hybrid(sketch: &UncompressedSketch) -> CompressedSketch {
    let window = sketch
        .sliding_window
        .as_deref()
        .expect("hybrid sketch must have a window");
    debug_assert_eq!(sketch.window_offset, 0);

    let mut table_pairs = sketch.table.items();
    introspective_insertion_sort(&mut table_pairs);

    let window_pairs = extract_pairs_from_window_low_bits(window);
    let merged = merge_ascending(&window_pairs, &table_pairs);
    debug_assert_eq!(merged.len() as u32, sketch.num_coupons);

    let k = 1u32 << sketch.lg_k;
    let (words, used, num_pairs) = compress_surprising_values(&merged, k);

    CompressedSketch {
        lg_k: sketch.lg_k,
        num_coupons: sketch.num_coupons,
        window_offset: 0,
        flavor: Flavor::Hybrid,
        compressed_window: None,
        cw_length: 0,
        compressed_surprising_values: Some(words),
        csv_length: used,
        num_compressed_surprising_values: num_pairs,
    }
}

fn decompress_hybrid(compressed: &CompressedSketch) -> Result<UncompressedSketch, Error> {
    let k = 1u32 << compressed.lg_k;
    let words = compressed
        .compressed_surprising_values
        .as_deref()
        .unwrap_or(&[]);
    let pairs = decompress_surprising_values(
        &words[..compressed.csv_length],
        k,
        compressed.num_compressed_surprising_values,
    )?;

    let mut window = vec![0u8; k as usize];
    let mut table = PairTable::new(compressed.lg_k);
    for code in pairs {
        let row = code >> 6;
        let col = code & 63;
        if col < 8 {
            window[row as usize] |= 1u8 << col;
        } else {
            table.insert_code(code);
        }
    }

    Ok(UncompressedSketch {
        lg_k: compressed.lg_k,
        num_coupons: compressed.num_coupons,
        window_offset: 0,
        flavor: Flavor::Hybrid,
        sliding_window: Some(window),
        table,
    })
}

// --------------------------------------------------------------- PINNED ---

fn compress_pinned(sketch: &UncompressedSketch) -> CompressedSketch {
    let window = sketch
        .sliding_window
        .as_deref()
        .expect("pinned sketch must have a window");

    let phase = determine_pseudo_phase(sketch.lg_k, sketch.num_coupons);
    let (window_words, window_used) = encode_bytes(window, phase);

    let mut table_pairs = sketch.table.items();
    let (csv_words, csv_used, num_pairs) = if table_pairs.is_empty() {
        (Vec::new(), 0, 0)
    } else {
        introspective_insertion_sort(&mut table_pairs);
        for pair in table_pairs.iter_mut() {
            debug_assert!(*pair & 63 >= 8);
            *pair -= 8;
        }
        let k = 1u32 << sketch.lg_k;
        compress_surprising_values(&table_pairs, k)
    };

    CompressedSketch {
        lg_k: sketch.lg_k,
        num_coupons: sketch.num_coupons,
        window_offset: sketch.window_offset,
        flavor: Flavor::Pinned,
        compressed_window: Some(window_words),
        cw_length: window_used,
        compressed_surprising_values: if num_pairs > 0 { Some(csv_words) } else { None },
        csv_length: csv_used,
        num_compressed_surprising_values: num_pairs,
    }
}

fn decompress_pinned(compressed: &CompressedSketch) -> Result<UncompressedSketch, Error> {
    let k = 1usize << compressed.lg_k;
    let phase = determine_pseudo_phase(compressed.lg_k, compressed.num_coupons);
    let window_words = compressed.compressed_window.as_deref().unwrap_or(&[]);
    let window = decode_bytes(&window_words[..compressed.cw_length], k, phase)?;

    let mut table = PairTable::new(compressed.lg_k);
    if compressed.num_compressed_surprising_values > 0 {
        let csv_words = compressed
            .compressed_surprising_values
            .as_deref()
            .unwrap_or(&[]);
        let pairs = decompress_surprising_values(
            &csv_words[..compressed.csv_length],
            k as u32,
            compressed.num_compressed_surprising_values,
        )?;
        for code in pairs {
            table.insert_code(code + 8);
        }
    }

    Ok(UncompressedSketch {
        lg_k: compressed.lg_k,
        num_coupons: compressed.num_coupons,
        window_offset: compressed.window_offset,
        flavor: Flavor::Pinned,
        sliding_window: Some(window),
        table,
    })
}

// -------------------------------------------------------------- SLIDING ---

fn compress_sliding(sketch: &UncompressedSketch) -> CompressedSketch {
    let window = sketch
        .sliding_window
        .as_deref()
        .expect("sliding sketch must have a window");
    debug_assert!((1..=56).contains(&sketch.window_offset));

    let phase = determine_pseudo_phase(sketch.lg_k, sketch.num_coupons);
    let (window_words, window_used) = encode_bytes(window, phase);

    let mut table_pairs = sketch.table.items();
    let (csv_words, csv_used, num_pairs) = if table_pairs.is_empty() {
        (Vec::new(), 0, 0)
    } else {
        let permutation = &COLUMN_PERMUTATIONS_FOR_ENCODING[phase as usize];
        for pair in table_pairs.iter_mut() {
            let row = *pair >> 6;
            let col = *pair & 63;
            let rotated = ((col + 56).wrapping_sub(sketch.window_offset as u32)) & 63;
            debug_assert!(rotated < 56);
            let permuted = permutation[rotated as usize] as u32;
            *pair = (row << 6) | permuted;
        }
        introspective_insertion_sort(&mut table_pairs);
        let k = 1u32 << sketch.lg_k;
        compress_surprising_values(&table_pairs, k)
    };

    CompressedSketch {
        lg_k: sketch.lg_k,
        num_coupons: sketch.num_coupons,
        window_offset: sketch.window_offset,
        flavor: Flavor::Sliding,
        compressed_window: Some(window_words),
        cw_length: window_used,
        compressed_surprising_values: if num_pairs > 0 { Some(csv_words) } else { None },
        csv_length: csv_used,
        num_compressed_surprising_values: num_pairs,
    }
}

fn decompress_sliding(compressed: &CompressedSketch) -> Result<UncompressedSketch, Error> {
    let k = 1usize << compressed.lg_k;
    let phase = determine_pseudo_phase(compressed.lg_k, compressed.num_coupons);
    let window_words = compressed.compressed_window.as_deref().unwrap_or(&[]);
    let window = decode_bytes(&window_words[..compressed.cw_length], k, phase)?;

    let mut table = PairTable::new(compressed.lg_k);
    if compressed.num_compressed_surprising_values > 0 {
        let csv_words = compressed
            .compressed_surprising_values
            .as_deref()
            .unwrap_or(&[]);
        let pairs = decompress_surprising_values(
            &csv_words[..compressed.csv_length],
            k as u32,
            compressed.num_compressed_surprising_values,
        )?;
        let inverse_permutation = &COLUMN_PERMUTATIONS_FOR_DECODING[phase as usize];
        for code in pairs {
            let row = code >> 6;
            let permuted = code & 63;
            let rotated = inverse_permutation[permuted as usize] as u32;
            let col = (rotated + compressed.window_offset as u32 + 8) & 63;
            table.insert_code((row << 6) | col);
        }
    }

    Ok(UncompressedSketch {
        lg_k: compressed.lg_k,
        num_coupons: compressed.num_coupons,
        window_offset: compressed.window_offset,
        flavor: Flavor::Sliding,
        sliding_window: Some(window),
        table,
    })
}

// ----------------------------------------------------------- shared bits ---

/// Golomb-Rice-codes `pairs` (already sorted ascending), returning the word
/// buffer, the used length, and the pair count.
fn compress_surprising_values(pairs: &[u32], k: u32) -> (Vec<u32>, usize, u32) {
    let num_pairs = pairs.len() as u32;
    let num_base_bits = golomb_choose_number_of_base_bits(k + num_pairs, num_pairs as u64);
    let (words, used) = encode_pairs(pairs, k, num_base_bits);
    debug_assert!(used <= safe_length_for_compressed_pair_buf(k, num_pairs, num_base_bits));
    (words, used, num_pairs)
}

fn decompress_surprising_values(words: &[u32], k: u32, num_pairs: u32) -> Result<Vec<u32>, Error> {
    let num_base_bits = golomb_choose_number_of_base_bits(k + num_pairs, num_pairs as u64);
    decode_pairs(words, num_pairs, num_base_bits)
}

/// Extracts `(row << 6) | col` pairs for the set bits in columns `[0, 8)` of
/// `window`, ascending by row then column (the natural iteration order).
fn extract_pairs_from_window_low_bits(window: &[u8]) -> Vec<u32> {
    let mut pairs = Vec::new();
    for (row, &byte) in window.iter().enumerate() {
        let mut remaining = byte;
        while remaining != 0 {
            let col = remaining.trailing_zeros();
            remaining &= remaining - 1;
            pairs.push(((row as u32) << 6) | col);
        }
    }
    pairs
}

/// Merges two ascending pair streams whose column ranges don't overlap
/// (`low` has columns `< 8`, `high` has columns `>= 8`), preserving the
/// overall `(row, col)` ascending order.
fn merge_ascending(low: &[u32], high: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(low.len() + high.len());
    let mut i = 0;
    let mut j = 0;
    while i < low.len() && j < high.len() {
        if low[i] <= high[j] {
            out.push(low[i]);
            i += 1;
        } else {
            out.push(high[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&low[i..]);
    out.extend_from_slice(&high[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_window(seed: u64, k: usize, density_shift: u32) -> Vec<u8> {
        let mut state = seed;
        (0..k)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                let bits = (state >> 40) as u8;
                bits & (0xFFu8 >> density_shift)
            })
            .collect()
    }

    fn pseudo_random_table(seed: u64, k: u32, count: usize, min_col: u8) -> PairTable {
        let mut table = PairTable::new((32 - k.leading_zeros() - 1) as u8);
        let mut state = seed;
        while table.len() < count {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let row = (state >> 33) as u32 % k;
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let col = min_col + ((state >> 40) as u8 % (64 - min_col));
            table.insert(row, col);
        }
        table
    }

    fn assert_round_trips(sketch: UncompressedSketch) {
        let compressed = compress(&sketch);
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed.lg_k, sketch.lg_k);
        assert_eq!(decompressed.num_coupons, sketch.num_coupons);
        assert_eq!(decompressed.window_offset, sketch.window_offset);
        assert_eq!(decompressed.sliding_window, sketch.sliding_window);

        let mut expected = sketch.table.items();
        let mut actual = decompressed.table.items();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(actual, expected);
    }

    #[test]
    fn scenario_empty() {
        let sketch = UncompressedSketch::empty(10);
        let compressed = compress(&sketch);
        assert!(compressed.compressed_window.is_none());
        assert!(compressed.compressed_surprising_values.is_none());
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed.num_coupons, 0);
        assert!(decompressed.table.is_empty());
    }

    #[test]
    fn scenario_sparse_single_pair() {
        let mut table = PairTable::new(10);
        table.insert(5, 3);
        let sketch = UncompressedSketch::sparse(10, table);
        let compressed = compress(&sketch);
        let decompressed = decompress(&compressed).unwrap();
        let items = decompressed.table.items();
        assert_eq!(items, vec![(5u32 << 6) | 3]);
    }

    #[test]
    fn scenario_hybrid_all_column_zero() {
        let k = 1usize << 8;
        let mut window = vec![0u8; k];
        for byte in window.iter_mut() {
            *byte = 0x01;
        }
        let sketch = UncompressedSketch::hybrid(8, window, PairTable::new(8));
        assert_eq!(sketch.num_coupons(), 64);
        assert_round_trips(sketch);
    }

    #[test]
    fn scenario_pinned_dense_window_with_table() {
        let lg_k = 12u8;
        let k = 1usize << lg_k;
        let window = pseudo_random_window(123, k, 2);
        let table = pseudo_random_table(456, k as u32, 30, 8);
        let sketch = UncompressedSketch::pinned(lg_k, window, 0, table);
        assert_round_trips(sketch);
    }

    #[test]
    fn scenario_sliding_random_window_and_table() {
        let lg_k = 12u8;
        let k = 1usize << lg_k;
        let window = pseudo_random_window(789, k, 0);
        let table = pseudo_random_table(1011, k as u32, 500, 15);
        let offset = 7u8;
        let sketch = UncompressedSketch::sliding(lg_k, window, offset, table);

        let expected_phase = determine_pseudo_phase(lg_k, sketch.num_coupons());
        assert!(expected_phase < 16, "numCoupons should land in steady state for this scenario");

        assert_round_trips(sketch);
    }

    #[test]
    fn sliding_with_empty_table_round_trips() {
        let lg_k = 9u8;
        let k = 1usize << lg_k;
        let window = pseudo_random_window(222, k, 1);
        let sketch = UncompressedSketch::sliding(lg_k, window, 3, PairTable::new(lg_k));
        assert_round_trips(sketch);
    }

    #[test]
    fn pinned_with_empty_table_round_trips() {
        let lg_k = 9u8;
        let k = 1usize << lg_k;
        let window = pseudo_random_window(333, k, 1);
        let sketch = UncompressedSketch::pinned(lg_k, window, 0, PairTable::new(lg_k));
        assert_round_trips(sketch);
    }

    #[test]
    fn sliding_column_transform_is_its_own_inverse_modulo_64() {
        let offset = 7u32;
        let phase = 3usize;
        let enc = &COLUMN_PERMUTATIONS_FOR_ENCODING[phase];
        let dec = &COLUMN_PERMUTATIONS_FOR_DECODING[phase];
        for col in 15u32..64 {
            let rotated = ((col + 56).wrapping_sub(offset)) & 63;
            assert!(rotated < 56);
            let permuted = enc[rotated as usize] as u32;
            let back_rotated = dec[permuted as usize] as u32;
            let restored = (back_rotated + offset + 8) & 63;
            assert_eq!(restored, col);
        }
    }

    #[test]
    fn pinned_column_shift_is_its_own_inverse() {
        for col in 8u32..64 {
            let shifted = col - 8;
            assert!(shifted < 56);
            assert_eq!(shifted + 8, col);
        }
    }
}
