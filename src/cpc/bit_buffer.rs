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

use crate::error::Error;

/// Appends variable-length code units to a 32-bit little-endian word buffer
/// through a 64-bit shift register.
///
/// Bit 0 of word 0 is the first bit written; within a word the low-order bit
/// is emitted first.
pub(super) struct BitWriter {
    words: Vec<u32>,
    next_word_index: usize,
    bit_buf: u64,
    buf_bits: u8,
}

impl BitWriter {
    pub fn with_capacity(word_capacity: usize) -> Self {
        Self {
            words: vec![0u32; word_capacity],
            next_word_index: 0,
            bit_buf: 0,
            buf_bits: 0,
        }
    }

    /// Writes the low `code_len` bits of `value` (`code_len <= 32`).
    pub fn write_bits(&mut self, value: u32, code_len: u8) {
        debug_assert!(code_len <= 32);
        debug_assert!(self.buf_bits <= 31);
        self.bit_buf |= (value as u64) << self.buf_bits;
        self.buf_bits += code_len;
        self.maybe_flush();
    }

    /// Writes `n` zero bits followed by a single one bit, without doing
    /// per-bit work for large `n`.
    pub fn write_unary(&mut self, mut n: u32) {
        debug_assert!(self.buf_bits <= 31);
        while n >= 16 {
            n -= 16;
            self.buf_bits += 16;
            self.maybe_flush();
        }
        let code = 1u64 << n;
        self.bit_buf |= code << self.buf_bits;
        self.buf_bits += (n + 1) as u8;
        self.maybe_flush();
    }

    /// Advances the bit position by `n` zero bits without writing any ones;
    /// used for the trailing padding so the Huffman/pair decoders' multi-bit
    /// peeks never read past the last written word.
    pub fn pad_zero_bits(&mut self, n: u8) {
        self.buf_bits += n;
        self.maybe_flush();
    }

    fn maybe_flush(&mut self) {
        if self.buf_bits >= 32 {
            self.words[self.next_word_index] = (self.bit_buf & 0xFFFF_FFFF) as u32;
            self.next_word_index += 1;
            self.bit_buf >>= 32;
            self.buf_bits -= 32;
        }
    }

    /// Flushes any remaining bits and returns the word buffer together with
    /// the number of words actually used.
    pub fn finish(mut self) -> (Vec<u32>, usize) {
        if self.buf_bits > 0 {
            self.words[self.next_word_index] = (self.bit_buf & 0xFFFF_FFFF) as u32;
            self.next_word_index += 1;
        }
        (self.words, self.next_word_index)
    }
}

/// Consumes variable-length code units from a slice of 32-bit words.
///
/// Every peek is checked against the supplied slice: a peek that would need
/// to load a word past the end of `words` returns
/// [`ErrorKind::CorruptCompressedData`](crate::error::ErrorKind::CorruptCompressedData)
/// instead of indexing out of bounds, since that situation can only arise
/// from a caller-supplied length that doesn't match the bitstream, or from
/// corrupt input.
pub(super) struct BitReader<'a> {
    words: &'a [u32],
    word_index: usize,
    bit_buf: u64,
    buf_bits: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(words: &'a [u32]) -> Self {
        Self {
            words,
            word_index: 0,
            bit_buf: 0,
            buf_bits: 0,
        }
    }

    fn ensure(&mut self, n: u8) -> Result<(), Error> {
        debug_assert!(n <= 32);
        if self.buf_bits < n {
            let word = *self.words.get(self.word_index).ok_or_else(|| {
                Error::corrupt("compressed word stream ended before the decoder expected")
            })?;
            self.bit_buf |= (word as u64) << self.buf_bits;
            self.word_index += 1;
            self.buf_bits += 32;
        }
        Ok(())
    }

    /// Peeks the low `n` bits without consuming them.
    pub fn peek(&mut self, n: u8) -> Result<u32, Error> {
        self.ensure(n)?;
        if n == 32 {
            Ok(self.bit_buf as u32)
        } else {
            Ok((self.bit_buf & ((1u64 << n) - 1)) as u32)
        }
    }

    /// Consumes `n` bits previously returned by [`Self::peek`].
    pub fn consume(&mut self, n: u8) {
        self.bit_buf >>= n;
        self.buf_bits -= n;
    }

    /// Reads a unary code: counts zero bits via an 8-bit peek and a
    /// trailing-zeros table, consuming up through the terminating one bit.
    pub fn read_unary(&mut self) -> Result<u32, Error> {
        let mut accumulated = 0u32;
        loop {
            let byte = self.peek(8)? as u8;
            let trailing_zeros =
                crate::cpc::compression_data::BYTE_TRAILING_ZEROS_TABLE[byte as usize];
            if trailing_zeros == 8 {
                self.consume(8);
                accumulated += 8;
                continue;
            }
            self.consume(trailing_zeros + 1);
            return Ok(accumulated + trailing_zeros as u32);
        }
    }
}
