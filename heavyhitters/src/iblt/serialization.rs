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

pub(super) const PREAMBLE_LONGS: u8 = 3;
pub(super) const SERIAL_VERSION: u8 = 1;
pub(super) const EMPTY_FLAG_MASK: u8 = 1 << 2;

/// Bytes per cell besides its key words: count (i64) and checksum (u64).
pub(super) const CELL_HEADER_BYTES: usize = 16;
