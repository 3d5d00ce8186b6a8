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

//! The CPC compression core: byte Huffman coding, pair (Golomb + length-limited
//! unary) coding, phase selection, and the five flavor drivers.

mod bit_buffer;
mod byte_huffman;
mod compression;
mod compression_data;
mod pair_codec;
mod pair_table;
mod phase;
mod sketch;

pub use compression::{compress, decompress};
pub use pair_table::PairTable;
pub use sketch::{CompressedSketch, Flavor, FlavorCode, UncompressedSketch};
