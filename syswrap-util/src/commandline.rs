/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Command-line arguments shared by the syswrap tools.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Number of timestamped names tried before giving up on a log file.
const LOG_FILE_ATTEMPTS: usize = 100;

// Arguments that are shared by every syswrap tool. Tools flatten this into
// their own options.
//
// NOTE: Do not change this to a doc comment, it would become the help text of
// every tool that flattens it.
#[allow(missing_docs)]
#[derive(Debug, Clone, Parser)]
pub struct CommonToolArguments {
    /// Direct logging to a file.  This can also be set with the RUST_LOG_FILE environment
    /// variable, but the CLI flag takes precedence. Logs go to stderr otherwise, never
    /// to stdout.
    #[clap(long = "log-file", value_name = "PATH", env = "RUST_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Default log filter, used when RUST_LOG is not set.
    #[clap(long = "log-level", value_name = "FILTER", default_value = "warn")]
    pub log_level: String,
}

impl CommonToolArguments {
    /// Installs the global tracing subscriber. Logs are filtered with
    /// `RUST_LOG`, falling back to `--log-level`.
    ///
    /// The returned guard flushes the log file when dropped, so keep it alive
    /// until the tool exits.
    pub fn init_tracing(&self) -> anyhow::Result<Option<WorkerGuard>> {
        match self.log_file.as_deref().and_then(unique_log_path) {
            Some((parent, filename)) => {
                let file_writer = tracing_appender::rolling::never(&parent, &filename);
                let (file_writer, guard) = tracing_appender::non_blocking(file_writer);

                eprintln!(" [syswrap] Logging to file at {:?}", parent.join(&filename));
                self.set_subscriber_with_writer(file_writer)?;
                Ok(Some(guard))
            }
            None => {
                if self.log_file.is_some() {
                    eprintln!(
                        " [syswrap] WARNING: could not open log file, falling back to stderr"
                    );
                }
                self.set_subscriber_with_writer(io::stderr)?;
                Ok(None)
            }
        }
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(&self.log_level)?),
        }
    }

    fn set_subscriber_with_writer<T>(&self, writer: T) -> anyhow::Result<()>
    where
        T: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_writer(writer)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}

/// Picks the file to log to. An existing file is never overwritten: a
/// timestamp is appended to the name instead.
fn unique_log_path(path: &Path) -> Option<(PathBuf, OsString)> {
    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return None,
    };
    let orig_filename = path.file_name()?.to_os_string();
    let mut filename = orig_filename.clone();

    for _ in 0..LOG_FILE_ATTEMPTS {
        if parent.join(&filename).exists() {
            filename = orig_filename.clone();
            filename.push(format!("{}", Local::now().format(".%Y%m%d.%H%M%S.%f")));
        } else {
            return Some((parent.to_path_buf(), filename));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn fresh_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.log");
        assert_eq!(
            unique_log_path(&path),
            Some((dir.path().to_path_buf(), "gen.log".into()))
        );
    }

    #[test]
    fn existing_log_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.log");
        fs::write(&path, "previous run").unwrap();

        let (parent, filename) = unique_log_path(&path).unwrap();
        assert_eq!(parent, dir.path());
        assert_ne!(filename, "gen.log");
        assert!(filename.to_string_lossy().starts_with("gen.log."));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous run");
    }

    #[test]
    fn relative_log_file() {
        assert_eq!(
            unique_log_path(Path::new("does-not-exist.log")),
            Some((PathBuf::from("."), "does-not-exist.log".into()))
        );
        assert_eq!(unique_log_path(Path::new("/")), None);
    }

    #[test]
    fn parse_arguments() {
        let args = CommonToolArguments::try_parse_from(["tool", "--log-file", "/tmp/x.log"]).unwrap();
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/x.log")));
        assert_eq!(args.log_level, "warn");
    }
}
