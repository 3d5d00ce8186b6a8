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

use std::cmp::Ordering;

use crate::cpc::bit_buffer::{BitReader, BitWriter};
use crate::cpc::compression_data::{
    LENGTH_LIMITED_UNARY_DECODING_TABLE65, LENGTH_LIMITED_UNARY_ENCODING_TABLE65,
};
use crate::error::Error;

/// Encodes a sorted-ascending sequence of `(row << 6) | col` pairs, returning
/// the word buffer and the number of words actually used.
///
/// `num_base_bits` is the Golomb-Rice parameter `B`; see
/// [`golomb_choose_number_of_base_bits`].
pub(super) fn encode_pairs(pairs: &[u32], k: u32, num_base_bits: u8) -> (Vec<u32>, usize) {
    let capacity = safe_length_for_compressed_pair_buf(k, pairs.len() as u32, num_base_bits);
    let mut writer = BitWriter::with_capacity(capacity);

    let golomb_lo_mask: u32 = (1u32 << num_base_bits) - 1;
    let mut predicted_row = 0u32;
    let mut predicted_col = 0u32;

    for &pair in pairs {
        let row = pair >> 6;
        let col = pair & 63;

        if row != predicted_row {
            predicted_col = 0;
        }
        debug_assert!(row >= predicted_row);
        debug_assert!(col >= predicted_col);

        let y_delta = row - predicted_row;
        let x_delta = col - predicted_col;
        predicted_row = row;
        predicted_col = col + 1;

        let info = LENGTH_LIMITED_UNARY_ENCODING_TABLE65[x_delta as usize];
        writer.write_bits((info & 0x0FFF) as u32, (info >> 12) as u8);

        let golomb_lo = y_delta & golomb_lo_mask;
        let golomb_hi = y_delta >> num_base_bits;
        writer.write_unary(golomb_hi);
        writer.write_bits(golomb_lo, num_base_bits);
    }

    let padding = 10u8.saturating_sub(num_base_bits);
    writer.pad_zero_bits(padding);
    writer.finish()
}

/// Decodes exactly `num_pairs` pairs from `words`.
pub(super) fn decode_pairs(
    words: &[u32],
    num_pairs: u32,
    num_base_bits: u8,
) -> Result<Vec<u32>, Error> {
    let mut reader = BitReader::new(words);
    let mut predicted_row = 0u32;
    let mut predicted_col = 0u32;
    let mut out = Vec::with_capacity(num_pairs as usize);

    for _ in 0..num_pairs {
        let peek = reader.peek(12)?;
        let info = LENGTH_LIMITED_UNARY_DECODING_TABLE65[peek as usize];
        let len = (info >> 8) as u8;
        let x_delta = (info & 0xFF) as u32;
        reader.consume(len);

        let golomb_hi = reader.read_unary()?;
        let golomb_lo = reader.peek(num_base_bits)?;
        reader.consume(num_base_bits);
        let y_delta = (golomb_hi << num_base_bits) | golomb_lo;

        if y_delta > 0 {
            predicted_col = 0;
        }
        let row = predicted_row + y_delta;
        let col = predicted_col + x_delta;
        out.push((row << 6) | col);

        predicted_row = row;
        predicted_col = col + 1;
    }

    Ok(out)
}

/// Largest `b >= 0` with `numPairs * 2^b <= k + numPairs`.
pub(super) fn golomb_choose_number_of_base_bits(k_plus_count: u32, count: u64) -> u8 {
    debug_assert!(k_plus_count > 0);
    debug_assert!(count > 0);
    let quotient = (k_plus_count as u64 - count) / count;
    if quotient == 0 {
        0
    } else {
        floor_log2_of_long(quotient)
    }
}

fn floor_log2_of_long(x: u64) -> u8 {
    debug_assert!(x > 0);
    let mut p = 0u8;
    let mut y = 1u64;
    loop {
        match u64::cmp(&y, &x) {
            Ordering::Equal => return p,
            Ordering::Greater => return p - 1,
            Ordering::Less => {
                p += 1;
                y <<= 1;
            }
        }
    }
}

/// `ceil((xbits + ybits + pad) / 32)`, a tight upper bound on the pair
/// stream's length (see "Managing Gigabytes", Witten/Moffat/Bell, p.198).
pub(super) fn safe_length_for_compressed_pair_buf(k: u32, num_pairs: u32, num_base_bits: u8) -> usize {
    let k = k as usize;
    let num_pairs = num_pairs as usize;
    let num_base_bits = num_base_bits as usize;

    let ybits = num_pairs * (1 + num_base_bits) + (k >> num_base_bits);
    let xbits = 12 * num_pairs;
    let padding = 10usize.saturating_sub(num_base_bits);
    divide_rounding_up(xbits + ybits + padding, 32)
}

pub(super) fn divide_rounding_up(x: usize, y: usize) -> usize {
    debug_assert_ne!(y, 0);
    let quotient = x / y;
    if quotient * y == x {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_pairs(seed: u64, k: u32, count: usize) -> Vec<u32> {
        let mut state = seed;
        let mut set = std::collections::BTreeSet::new();
        while set.len() < count {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let row = (state >> 33) as u32 % k;
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let col = ((state >> 40) as u8) % 64;
            set.insert((row << 6) | col as u32);
        }
        set.into_iter().collect()
    }

    #[test]
    fn round_trips_for_every_base_bits_value() {
        let k = 4096u32;
        for b in 0u8..=6 {
            let pairs = pseudo_random_pairs(b as u64 * 131 + 11, k, 250);
            let (words, used) = encode_pairs(&pairs, k, b);
            assert!(used <= safe_length_for_compressed_pair_buf(k, pairs.len() as u32, b));
            let decoded = decode_pairs(&words[..used], pairs.len() as u32, b).unwrap();
            assert_eq!(decoded, pairs, "B={b}");
        }
    }

    #[test]
    fn single_pair_at_origin_is_one_bit_row_and_short_column() {
        let pairs = vec![0u32];
        let (words, used) = encode_pairs(&pairs, 1024, 0);
        assert!(used <= safe_length_for_compressed_pair_buf(1024, 1, 0));
        let decoded = decode_pairs(&words[..used], 1, 0).unwrap();
        assert_eq!(decoded, pairs);
    }

    #[test]
    fn golomb_base_bits_matches_largest_b_with_count_times_2_pow_b_le_total() {
        for (k, count) in [(1024u32, 1u32), (4096, 500), (1 << 20, 1)] {
            let b = golomb_choose_number_of_base_bits(k + count, count as u64);
            assert!((count as u64) * (1u64 << b) <= (k + count) as u64);
            assert!((count as u64) * (1u64 << (b + 1)) > (k + count) as u64 || b >= 31);
        }
    }

    #[test]
    fn buffer_sizing_is_never_exceeded() {
        let k = 8192u32;
        for count in [1u32, 10, 100, 1000] {
            for b in 0u8..=6 {
                let pairs = pseudo_random_pairs(count as u64 * 17 + b as u64, k, count as usize);
                let (_words, used) = encode_pairs(&pairs, k, b);
                assert!(used <= safe_length_for_compressed_pair_buf(k, count, b));
            }
        }
    }

    #[test]
    fn truncated_stream_is_reported_as_corrupt() {
        let pairs = pseudo_random_pairs(42, 4096, 64);
        let (words, used) = encode_pairs(&pairs, 4096, 3);
        let err = decode_pairs(&words[..used - 1], pairs.len() as u32, 3).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CorruptCompressedData);
    }
}
