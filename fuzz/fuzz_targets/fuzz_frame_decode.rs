// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use uavtalk::{decode_frame, encode_frame};

fuzz_target!(|data: &[u8]| {
    // Any accepted frame re-encodes to the bytes it was decoded from
    if let Ok(frame) = decode_frame(data) {
        let bytes = encode_frame(&frame).expect("decoded payload fits");
        assert_eq!(bytes, &data[..frame.length as usize]);
    }
});
