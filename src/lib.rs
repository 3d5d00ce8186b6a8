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

//! An entropy codec for the CPC (Compressed Probabilistic Counting) sketch.
//!
//! This crate turns an in-memory sketch's sliding window and surprising-value
//! table into a compact, lossless bitstream and back. It does not hash
//! items, collect coupons, estimate cardinality, or frame bytes for disk or
//! network transport; callers own those concerns and pass in the sketch's
//! scalar fields, window, and pair table directly.

pub mod cpc;
pub mod error;

pub use error::Error;
