//! Byte ranges for streaming media to a player that seeks.
//!
//! Only the single-range `bytes=start-end` and `bytes=start-` forms are
//! understood; anything else is served as the whole item.

/// An inclusive byte range requested by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    /// Last byte, inclusive. `None` means to the end of the item.
    pub end: Option<u64>,
}

impl ByteRange {
    /// Parse a `Range` header value.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }
        let (start, end) = spec.split_once('-')?;
        let start = start.trim().parse().ok()?;
        let end = match end.trim() {
            "" => None,
            end => Some(end.parse().ok()?),
        };
        if end.is_some_and(|end| end < start) {
            return None;
        }
        Some(Self { start, end })
    }

    /// The `Range` header value asking for this range.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{end}", self.start),
            None => format!("bytes={}-", self.start),
        }
    }
}

/// Where a partial chunk sits in the full item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialContent {
    pub start: u64,
    pub total: u64,
}

impl PartialContent {
    /// Parse a `Content-Range` header value such as `bytes 0-99/1000`.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes ")?;
        let (span, total) = spec.split_once('/')?;
        let (start, _) = span.split_once('-')?;
        Some(Self {
            start: start.trim().parse().ok()?,
            total: total.trim().parse().ok()?,
        })
    }
}

/// Bytes of an item, either whole or one requested range of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    pub bytes: Vec<u8>,
    pub partial: Option<PartialContent>,
}

impl MediaChunk {
    #[must_use]
    pub const fn whole(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            partial: None,
        }
    }

    /// Cut `range` out of the full item. Unsatisfiable ranges yield the whole item.
    #[must_use]
    pub fn slice(bytes: Vec<u8>, range: Option<ByteRange>) -> Self {
        let Some(range) = range else {
            return Self::whole(bytes);
        };
        let total = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if total == 0 || range.start >= total {
            return Self::whole(bytes);
        }
        let last = range.end.map_or(total - 1, |end| end.min(total - 1));

        let (Ok(start), Ok(last)) = (usize::try_from(range.start), usize::try_from(last)) else {
            return Self::whole(bytes);
        };
        Self {
            bytes: bytes[start..=last].to_vec(),
            partial: Some(PartialContent {
                start: range.start,
                total,
            }),
        }
    }

    /// `Content-Range` header value for a partial chunk.
    #[must_use]
    pub fn content_range(&self) -> Option<String> {
        let partial = self.partial?;
        let len = u64::try_from(self.bytes.len()).unwrap_or(u64::MAX);
        let last = (partial.start + len).saturating_sub(1);
        Some(format!("bytes {}-{last}/{}", partial.start, partial.total))
    }
}
