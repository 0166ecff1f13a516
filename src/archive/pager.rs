//! Packs message records into JSON arrays that fit under the upload limit.

use serde::Serialize;

use crate::error::MagiResult;

/// Largest file, in bytes, the bot may upload to a channel.
pub const FILE_UPLOAD_SIZE_LIMIT: usize = 8_000_000;

/// Accumulates serialized records and hands back full pages.
#[derive(Debug)]
pub struct Pager {
    limit: usize,
    buf: Vec<u8>,
    count: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(FILE_UPLOAD_SIZE_LIMIT)
    }
}

impl Pager {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            buf: Vec::new(),
            count: 0,
        }
    }

    /// Appends `record`. Returns the finished page when `record` didn't fit on it.
    ///
    /// A record larger than the limit still gets a page of its own.
    pub fn push<T: Serialize>(&mut self, record: &T) -> MagiResult<Option<Vec<u8>>> {
        let item = serde_json::to_vec(record)?;

        // "[" + items joined by "," + "]"
        let grown = if self.count == 0 {
            item.len() + 2
        } else {
            self.buf.len() + 1 + item.len() + 1
        };

        let full = if self.count > 0 && grown > self.limit {
            self.take()
        } else {
            None
        };

        self.buf.push(if self.count == 0 { b'[' } else { b',' });
        self.buf.extend_from_slice(&item);
        self.count += 1;

        Ok(full)
    }

    /// The last, partially filled page, if any record is pending.
    pub fn finish(mut self) -> Option<Vec<u8>> {
        self.take()
    }

    fn take(&mut self) -> Option<Vec<u8>> {
        if self.count == 0 {
            return None;
        }
        let mut page = std::mem::take(&mut self.buf);
        page.push(b']');
        self.count = 0;
        Some(page)
    }
}
