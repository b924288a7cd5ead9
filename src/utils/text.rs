/// Bytes inspected when sniffing for binary content
const BINARY_SNIFF_LEN: usize = 8192;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Check if content looks binary (a NUL byte near the start)
pub fn is_binary(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(BINARY_SNIFF_LEN)];
    memchr::memchr(0, sample).is_some()
}

/// Drop a leading UTF-8 byte order mark
pub fn strip_bom(content: &[u8]) -> &[u8] {
    content.strip_prefix(UTF8_BOM).unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_binary() {
        assert!(is_binary(b"\x7fELF\x00\x01"));
        assert!(!is_binary(b"plain text\n"));
        assert!(!is_binary("ünïcödé".as_bytes()));
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(b"\xEF\xBB\xBFabc"), b"abc");
        assert_eq!(strip_bom(b"abc"), b"abc");
    }
}
