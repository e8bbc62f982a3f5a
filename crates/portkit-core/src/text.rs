//! Byte-string helpers.

/// Find `needle` in the first `limit` bytes of `haystack`.
///
/// Returns the byte offset of the first match that lies entirely within the
/// limit. An empty needle matches at offset 0. A `limit` past the end of the
/// haystack is clamped to its length.
pub fn find_bounded(haystack: &[u8], needle: &[u8], limit: usize) -> Option<usize> {
    let window = &haystack[..limit.min(haystack.len())];
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > window.len() {
        return None;
    }
    window
        .windows(needle.len())
        .position(|candidate| candidate == needle)
}
