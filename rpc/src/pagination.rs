//! Cursor-based pagination utilities for list endpoints.

use serde::{Deserialize, Serialize};

use crate::RpcError;

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Common pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response (hex-encoded offset).
    pub cursor: Option<String>,
    /// Number of items per page (default 100, max 1000).
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Resolve effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Offset encoded in the cursor, 0 without one.
    pub fn decode_offset(&self) -> Result<u64, RpcError> {
        match self.cursor.as_deref() {
            None | Some("") => Ok(0),
            Some(c) => decode_cursor(c)
                .ok_or_else(|| RpcError::InvalidRequest(format!("invalid cursor: {c}"))),
        }
    }

    /// Slice one page out of `items` and compute the cursor of the next one.
    pub fn page<T>(&self, items: Vec<T>) -> Result<Page<T>, RpcError> {
        let offset = self.decode_offset()?;
        let size = self.effective_count();
        let page: Vec<T> = items
            .into_iter()
            .skip(offset as usize)
            .take(size as usize + 1)
            .collect();
        let has_more = page.len() > size as usize;
        let mut items = page;
        items.truncate(size as usize);
        let cursor = has_more.then(|| encode_cursor(offset + items.len() as u64));
        Ok(Page { items, cursor })
    }
}

/// One page of a list response.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor to pass for the next page, or `None` if this is the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Encode a numeric offset into an opaque cursor string.
pub fn encode_cursor(offset: u64) -> String {
    hex::encode(offset.to_be_bytes())
}

/// Decode a cursor string back to a numeric offset.
pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let mut bytes = [0u8; 8];
    hex::decode_to_slice(cursor, &mut bytes).ok()?;
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cursor: Option<String>, count: Option<u32>) -> PaginationParams {
        PaginationParams { cursor, count }
    }

    #[test]
    fn cursor_roundtrip() {
        for offset in [0u64, 1, 42, 100, 999, 123456789] {
            assert_eq!(decode_cursor(&encode_cursor(offset)), Some(offset));
        }
    }

    #[test]
    fn malformed_cursor_is_rejected() {
        assert!(decode_cursor("zz").is_none());
        assert!(params(Some("0102".into()), None).decode_offset().is_err());
    }

    #[test]
    fn effective_count_defaults_and_clamps() {
        assert_eq!(params(None, None).effective_count(), 100);
        assert_eq!(params(None, Some(5000)).effective_count(), 1000);
        assert_eq!(params(None, Some(0)).effective_count(), 1);
    }

    #[test]
    fn pages_walk_the_whole_list() {
        let items: Vec<u32> = (0..5).collect();
        let first = params(None, Some(2)).page(items.clone()).unwrap();
        assert_eq!(first.items, vec![0, 1]);
        let second = params(first.cursor, Some(2)).page(items.clone()).unwrap();
        assert_eq!(second.items, vec![2, 3]);
        let last = params(second.cursor, Some(2)).page(items).unwrap();
        assert_eq!(last.items, vec![4]);
        assert!(last.cursor.is_none());
    }

    #[test]
    fn exact_fit_has_no_next_page() {
        let page = params(None, Some(3)).page(vec![1, 2, 3]).unwrap();
        assert!(page.cursor.is_none());
    }
}
