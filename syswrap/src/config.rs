/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use serde::Deserialize;
use serde::Serialize;

/// The most arguments a Linux syscall can take. Syscalls without type
/// information have this many argument slots wrapped.
pub const MAX_SYSCALL_ARGS: usize = 6;

/// Prefix of the macros that define syscall numbers, e.g. `__NR_read`.
pub const SYSCALL_PREFIX: &str = "__NR_";

/// Settings for one generator run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of argument slots a generic wrapper covers.
    pub max_args: usize,

    /// Prefix of the syscall number macros.
    pub syscall_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_args: MAX_SYSCALL_ARGS,
            syscall_prefix: SYSCALL_PREFIX.to_owned(),
        }
    }
}
