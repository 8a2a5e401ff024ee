// Copyright © 2024 ModuleFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build script checking the minimum supported Rust version.

use std::process;

/// Minimum Rust version required to build ModuleFlow.
const MIN_RUST_VERSION: &str = "1.70.0";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    match version_check::is_min_version(MIN_RUST_VERSION) {
        Some(true) => {}
        Some(false) => {
            eprintln!(
                "ModuleFlow requires Rust {} or newer. Please update your toolchain.",
                MIN_RUST_VERSION
            );
            process::exit(1);
        }
        None => {
            println!(
                "cargo:warning=Unable to determine the rustc version; assuming {} or newer.",
                MIN_RUST_VERSION
            );
        }
    }
}
