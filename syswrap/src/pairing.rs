/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Pairs pointers to arrays of structs with the argument or field holding the
//! element count.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;

/// Where to find the element count of a paired array.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PairingValue {
    /// For syscalls: the count argument is this many positions after the
    /// array argument.
    Offset(isize),
    /// For structs: the name of the count field.
    Field(String),
}

/// One entry of a pairing table file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PairingEntry {
    /// A syscall name, or a printed struct type such as `struct msghdr`.
    pub owner: String,
    /// For syscalls, the printed struct type of the array argument. For
    /// structs, the name of the array field.
    pub member: String,
    /// Where the element count lives.
    pub count: PairingValue,
}

/// Maps `(owner, member)` to the location of an array's element count.
///
/// For example, `ssize_t readv(int fd, const struct iovec *iov, int count)`
/// is registered as `("readv", "struct iovec") => 1`, since `count` sits one
/// position after `iov`. Struct fields map to a field name instead:
/// `("struct msghdr", "msg_iov") => "msg_iovlen"`.
///
/// The table is read-only while generating, so one table can be shared by
/// any number of runs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PairingTable {
    entries: BTreeMap<(String, String), PairingValue>,
}

impl PairingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pairings needed for the Linux syscall ABI.
    pub fn linux() -> Self {
        let mut table = Self::new();
        for syscall in ["readv", "writev", "preadv", "pwritev"] {
            table.insert(syscall, "struct iovec", PairingValue::Offset(1));
        }
        table.insert(
            "struct msghdr",
            "msg_iov",
            PairingValue::Field("msg_iovlen".to_owned()),
        );
        table
    }

    /// Registers a pairing, returning the value it replaced.
    pub fn insert(
        &mut self,
        owner: &str,
        member: &str,
        value: PairingValue,
    ) -> Option<PairingValue> {
        self.entries
            .insert((owner.to_owned(), member.to_owned()), value)
    }

    /// Looks up a pairing.
    pub fn get(&self, owner: &str, member: &str) -> Option<&PairingValue> {
        self.entries.get(&(owner.to_owned(), member.to_owned()))
    }

    /// Number of registered pairings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All pairings, ordered by key.
    pub fn entries(&self) -> impl Iterator<Item = PairingEntry> + '_ {
        self.entries
            .iter()
            .map(|((owner, member), count)| PairingEntry {
                owner: owner.clone(),
                member: member.clone(),
                count: count.clone(),
            })
    }

    /// Reads a JSON list of [`PairingEntry`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let entries: Vec<PairingEntry> = serde_json::from_reader(reader)?;
        Ok(entries.into_iter().collect())
    }

    /// Reads a JSON pairing file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl FromIterator<PairingEntry> for PairingTable {
    fn from_iter<I: IntoIterator<Item = PairingEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(&entry.owner, &entry.member, entry.count);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_defaults() {
        let table = PairingTable::linux();
        assert_eq!(table.len(), 5);
        assert_eq!(
            table.get("readv", "struct iovec"),
            Some(&PairingValue::Offset(1))
        );
        assert_eq!(
            table.get("struct msghdr", "msg_iov"),
            Some(&PairingValue::Field("msg_iovlen".into()))
        );
        assert_eq!(table.get("read", "struct iovec"), None);
    }

    #[test]
    fn parse_json() {
        let json = r#"[
            {"owner": "process_vm_readv", "member": "struct iovec", "count": 1},
            {"owner": "struct mmsghdr", "member": "msg_hdr", "count": "msg_len"}
        ]"#;
        let table = PairingTable::from_reader(json.as_bytes()).unwrap();
        assert_eq!(
            table.get("process_vm_readv", "struct iovec"),
            Some(&PairingValue::Offset(1))
        );
        assert_eq!(
            table.get("struct mmsghdr", "msg_hdr"),
            Some(&PairingValue::Field("msg_len".into()))
        );
        assert_eq!(table.entries().count(), 2);
    }

    #[test]
    fn invalid_json() {
        let err = PairingTable::from_reader(r#"[{"owner": "readv"}]"#.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Pairings(_)));
    }
}
