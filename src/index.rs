//! Index sidecar records.
//!
//! An index file is a sequence of fixed size records locating blocks of packets in
//! the measurement data file.
use std::io::Read;

use serde::Serialize;

use crate::bytes::Bytes;
use crate::error::{Error, Result};
use crate::header::{decode_fields, field, Field};

pub static INDEX_LAYOUT: [Field; 7] = [
    field("date_time", 64),
    field("time_delta", 64),
    field("data_size", 32),
    field("unit_offset", 32),
    field("byte_offset", 64),
    field("variable_flag", 8),
    field("spare", 24),
];

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub date_time: u64,
    pub time_delta: u64,
    pub data_size: u32,
    pub unit_offset: u32,
    pub byte_offset: u64,
    pub variable_flag: u8,
}

impl IndexRecord {
    pub const LEN: usize = 36;

    /// # Errors
    /// [Error::HeaderLengthMismatch] if `buf` is not exactly [IndexRecord::LEN] bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let f = decode_fields(buf, &INDEX_LAYOUT)?;
        Ok(IndexRecord {
            date_time: f.get("date_time")?,
            time_delta: f.get("time_delta")?,
            data_size: f.get("data_size")? as u32,
            unit_offset: f.get("unit_offset")? as u32,
            byte_offset: f.get("byte_offset")?,
            variable_flag: f.get("variable_flag")? as u8,
        })
    }
}

/// Iterator returned by [read_index].
pub struct IndexIter<R> {
    bytes: Bytes<R>,
    done: bool,
}

impl<R: Read> Iterator for IndexIter<R> {
    type Item = Result<IndexRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = [0u8; IndexRecord::LEN];
        let n = match self.bytes.fill(&mut buf) {
            Ok(n) => n,
            Err(err) => {
                self.done = true;
                return Some(Err(err.into()));
            }
        };
        if n == 0 {
            self.done = true;
            return None;
        }
        if n < IndexRecord::LEN {
            self.done = true;
            return Some(Err(Error::TruncatedInput {
                needed: IndexRecord::LEN,
                available: n,
            }));
        }
        Some(IndexRecord::decode(&buf))
    }
}

/// Read index records from `reader` until EOF. A trailing partial record is yielded as
/// [Error::TruncatedInput].
pub fn read_index<R: Read>(reader: R) -> IndexIter<R> {
    IndexIter {
        bytes: Bytes::new(reader),
        done: false,
    }
}
