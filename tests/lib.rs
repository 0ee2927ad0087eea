/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Helpers shared by the integration tests.

use std::path::Path;
use std::path::PathBuf;

use syswrap::Config;
use syswrap::Format;
use syswrap::PairingTable;
use syswrap::Record;

/// Path of a file under `fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// Runs the generator over `input` and renders the output exactly as the
/// tool would print it.
pub fn generate(input: &str, pairings: &PairingTable, format: Format) -> String {
    let records = syswrap::run(input, pairings, &Config::default()).unwrap();
    render(&records, format)
}

/// Renders records to a string.
pub fn render(records: &[Record], format: Format) -> String {
    let mut out = Vec::new();
    syswrap::emit(records, format, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}
