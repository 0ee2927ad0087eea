/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use syswrap::Config;
use syswrap::Format;
use syswrap::PairingTable;
use syswrap::MAX_SYSCALL_ARGS;
use syswrap::SYSCALL_PREFIX;
use syswrap_util::CommonToolArguments;
use tracing::info;

/// Generates syscall wrap directives from preprocessed C declarations.
#[derive(Parser, Debug)]
struct Opts {
    #[clap(flatten)]
    common: CommonToolArguments,

    /// Preprocessed input containing the syscall number macros and the
    /// syscall prototypes.
    #[clap(value_name = "INPUT")]
    input: PathBuf,

    /// JSON file with the array length pairings. The built-in Linux pairings
    /// are used when this is not given.
    #[clap(long, value_name = "PATH")]
    pairings: Option<PathBuf>,

    /// Output format, either `macros` or `json`.
    #[clap(long, default_value = "macros")]
    format: Format,

    /// Number of argument slots wrapped for syscalls without a prototype.
    #[clap(long, default_value_t = MAX_SYSCALL_ARGS)]
    max_args: usize,

    /// Prefix of the syscall number macros.
    #[clap(long, default_value = SYSCALL_PREFIX)]
    prefix: String,
}

impl Opts {
    fn config(&self) -> Config {
        Config {
            max_args: self.max_args,
            syscall_prefix: self.prefix.clone(),
        }
    }

    fn pairings(&self) -> anyhow::Result<PairingTable> {
        match &self.pairings {
            Some(path) => PairingTable::load(path)
                .with_context(|| format!("Failed to load pairings from {}", path.display())),
            None => Ok(PairingTable::linux()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Opts::parse();
    let log_guard = args.common.init_tracing()?;

    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let pairings = args.pairings()?;
    info!("Using {} pairings", pairings.len());

    let records = syswrap::run(&input, &pairings, &args.config())
        .with_context(|| format!("Failed to generate directives for {}", args.input.display()))?;
    syswrap::emit(&records, args.format, io::stdout().lock())
        .context("Failed to write directives")?;

    drop(log_guard); // Flush logs before exiting.
    Ok(())
}
