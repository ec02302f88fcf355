// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CRC-8 frame checksum.
//!
//! UAVTalk closes every frame with an 8-bit CRC over all preceding bytes.
//!
//! # Parameters
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Polynomial | 0x07 |
//! | Init | 0x00 |
//! | RefIn | false |
//! | RefOut | false |
//! | XorOut | 0x00 |
//!
//! # Test Vector
//!
//! ```
//! use uavtalk::crc::crc8;
//!
//! assert_eq!(crc8(b"123456789"), 0xF4);
//! ```

const POLY: u8 = 0x07;

const INIT: u8 = 0x00;

/// Precomputed lookup table, generated at compile time.
const CRC_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;
        while j < 8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Compute the CRC-8 of `data`.
#[inline]
#[must_use]
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(INIT, data)
}

/// Continue a running CRC with more data.
#[inline]
#[must_use]
pub fn crc8_update(crc: u8, data: &[u8]) -> u8 {
    data.iter()
        .fold(crc, |crc, &byte| CRC_TABLE[(crc ^ byte) as usize])
}
