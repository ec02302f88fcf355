// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use uavtalk::definition::parse_xml;
use uavtalk::{HashConfig, ObjectSchema};

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (XML is text-based)
    if let Ok(xml) = std::str::from_utf8(data) {
        if let Ok(tree) = parse_xml(xml) {
            if let Ok(schema) = ObjectSchema::from_definition(&tree, HashConfig::default()) {
                assert_eq!(schema.identifier() & 1, 0);
            }
        }
    }
});
