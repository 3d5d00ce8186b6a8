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

use crate::cpc::bit_buffer::{BitReader, BitWriter};
use crate::cpc::compression_data::{DECODING_TABLES, ENCODING_TABLES};
use crate::error::Error;

/// Encodes `data` with the byte Huffman table for `phase`, returning the
/// word buffer and the number of words actually used.
pub(super) fn encode_bytes(data: &[u8], phase: u8) -> (Vec<u32>, usize) {
    let table = &ENCODING_TABLES[phase as usize];
    let mut writer = BitWriter::with_capacity(safe_length_for_compressed_window_buf(data.len()));
    for &byte in data {
        let info = table[byte as usize];
        let value = (info & 0x0FFF) as u32;
        let len = (info >> 12) as u8;
        writer.write_bits(value, len);
    }
    writer.pad_zero_bits(11);
    writer.finish()
}

/// Decodes exactly `num_bytes` bytes from `words` using the decode table for
/// `phase`. The decoder needs no explicit word count: it stops after
/// `num_bytes` symbols.
pub(super) fn decode_bytes(words: &[u32], num_bytes: usize, phase: u8) -> Result<Vec<u8>, Error> {
    let table = &DECODING_TABLES[phase as usize];
    let mut reader = BitReader::new(words);
    let mut out = Vec::with_capacity(num_bytes);
    for _ in 0..num_bytes {
        let peek = reader.peek(12)?;
        let info = table[peek as usize];
        let len = (info >> 8) as u8;
        let byte = (info & 0xFF) as u8;
        reader.consume(len);
        out.push(byte);
    }
    Ok(out)
}

/// `ceil((12k + 11) / 32)` words: always enough for a `k`-byte window at any phase.
pub(super) fn safe_length_for_compressed_window_buf(k: usize) -> usize {
    super::pair_codec::divide_rounding_up(12 * k + 11, 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_bytes(seed: u64, len: usize) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                (state >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn round_trips_for_every_phase() {
        for phase in 0u8..22 {
            let data = pseudo_random_bytes(phase as u64 * 97 + 1, 400);
            let (words, used) = encode_bytes(&data, phase);
            assert!(used <= words.len());
            assert!(used <= safe_length_for_compressed_window_buf(data.len()));
            let decoded = decode_bytes(&words[..used], data.len(), phase).unwrap();
            assert_eq!(decoded, data, "phase={phase}");
        }
    }

    #[test]
    fn round_trips_the_all_zero_and_all_ones_extremes() {
        for phase in 0u8..22 {
            for byte in [0u8, 0xFF] {
                let data = vec![byte; 256];
                let (words, used) = encode_bytes(&data, phase);
                let decoded = decode_bytes(&words[..used], data.len(), phase).unwrap();
                assert_eq!(decoded, data, "phase={phase} byte={byte}");
            }
        }
    }

    #[test]
    fn truncated_stream_is_reported_as_corrupt() {
        let data = pseudo_random_bytes(7, 400);
        let (words, used) = encode_bytes(&data, 0);
        let err = decode_bytes(&words[..used - 1], data.len(), 0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CorruptCompressedData);
    }
}
