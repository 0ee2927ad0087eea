/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Splits generator input into syscall names and declaration text.

use std::collections::BTreeSet;
use std::io;
use std::io::BufRead;

use regex::Regex;

/// The known syscalls plus the declarations that may describe them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SyscallSource {
    /// Every syscall with a number macro.
    pub names: BTreeSet<String>,

    /// The non-directive lines. Directive lines are replaced by empty lines
    /// so that parse errors report line numbers of the original input.
    pub declarations: String,
}

/// Scans preprocessor directives for syscall number macros.
#[derive(Clone, Debug)]
pub struct Extractor {
    pattern: Regex,
}

impl Extractor {
    /// Creates an extractor matching `<prefix><identifier>`.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("{}([a-zA-Z0-9_]+)", regex::escape(prefix)))?;
        Ok(Self { pattern })
    }

    /// Returns the syscall name in a directive line, if any.
    pub fn syscall_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Splits `lines` into syscall names and declaration text.
    pub fn extract<I, S>(&self, lines: I) -> SyscallSource
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source = SyscallSource::default();

        for line in lines {
            let line = line.as_ref();
            if line.starts_with('#') {
                if let Some(name) = self.syscall_name(line) {
                    source.names.insert(name.to_owned());
                }
            } else {
                source.declarations.push_str(line);
            }
            source.declarations.push('\n');
        }

        source
    }

    /// Like [`Extractor::extract`], but reads lines from `reader`.
    pub fn extract_from<R: BufRead>(&self, reader: R) -> io::Result<SyscallSource> {
        let lines = reader.lines().collect::<io::Result<Vec<_>>>()?;
        Ok(self.extract(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SYSCALL_PREFIX;

    #[test]
    fn splits_directives_from_declarations() {
        let extractor = Extractor::new(SYSCALL_PREFIX).unwrap();
        let source = extractor.extract([
            "#define __NR_read 0",
            "extern int read_it (void);",
            "# 12 \"/usr/include/unistd.h\" 3 4",
            "#define __NR_write 1",
            "#define SYS_read __NR_read",
            "int __NR_not_a_directive;",
        ]);

        assert_eq!(
            source.names.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["read", "write"]
        );
        assert_eq!(
            source.declarations,
            "\nextern int read_it (void);\n\n\n\nint __NR_not_a_directive;\n"
        );
    }

    #[test]
    fn custom_prefix() {
        let extractor = Extractor::new("__NR32_").unwrap();
        assert_eq!(extractor.syscall_name("#define __NR32_open 5"), Some("open"));
        assert_eq!(extractor.syscall_name("#define __NR_open 2"), None);
    }

    #[test]
    fn reads_lines() {
        let extractor = Extractor::new(SYSCALL_PREFIX).unwrap();
        let input = "#define __NR_close 3\nint close (int);\n";
        let source = extractor.extract_from(input.as_bytes()).unwrap();
        assert!(source.names.contains("close"));
        assert_eq!(source.declarations, "\nint close (int);\n");
    }
}
