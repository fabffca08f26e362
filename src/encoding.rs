use crate::error::SassError;

/// Byte-order marks of encodings we can name but not parse.
///
/// UTF-8 is absent: its BOM is tolerated and skipped by the parser itself.
const FOREIGN_BOMS: &[(&[u8], &str)] = &[
    (&[0x00, 0x00, 0xFE, 0xFF], "UTF-32 (big endian)"),
    (&[0xFF, 0xFE, 0x00, 0x00], "UTF-32 (little endian)"),
    (&[0xFE, 0xFF], "UTF-16 (big endian)"),
    (&[0xFF, 0xFE], "UTF-16 (little endian)"),
    (&[0x2B, 0x2F, 0x76, 0x38, 0x2D], "UTF-7"),
    (&[0x2B, 0x2F, 0x76, 0x38], "UTF-7"),
    (&[0x2B, 0x2F, 0x76, 0x39], "UTF-7"),
    (&[0x2B, 0x2F, 0x76, 0x2B], "UTF-7"),
    (&[0x2B, 0x2F, 0x76, 0x2F], "UTF-7"),
    (&[0xF7, 0x64, 0x4C], "UTF-1"),
    (&[0xDD, 0x73, 0x66, 0x73], "UTF-EBCDIC"),
    (&[0x0E, 0xFE, 0xFF], "SCSU"),
    (&[0xFB, 0xEE, 0x28], "BOCU-1"),
    (&[0x84, 0x31, 0x95, 0x33], "GB-18030"),
];

/// Decodes a raw buffer into a UTF-8 string, rejecting foreign byte-order
/// marks by name and invalid UTF-8 by byte offset.
pub(crate) fn decode_source(input: Vec<u8>) -> Result<String, Box<SassError>> {
    for (bom, encoding) in FOREIGN_BOMS {
        if input.starts_with(bom) {
            return Err(Box::new(SassError::unsupported_encoding(format!(
                "only UTF-8 documents are currently supported; your document appears to be {}",
                encoding
            ))));
        }
    }

    String::from_utf8(input).map_err(|err| {
        let offset = err.utf8_error().valid_up_to();
        let byte = err.as_bytes()[offset];
        Box::new(SassError::from_utf8(
            format!(
                "Invalid UTF-8 sequence \"\\x{:02X?}\" at byte {}.",
                byte, offset
            ),
            offset,
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_source(b"a { b: c; }".to_vec()).unwrap(), "a { b: c; }");
    }

    #[test]
    fn utf8_bom_is_not_rejected() {
        // The BOM itself is skipped later, by the parser.
        let src = decode_source(vec![0xEF, 0xBB, 0xBF, b'a']).unwrap();
        assert_eq!(src, "\u{feff}a");
    }

    #[test]
    fn utf16_bom_is_named() {
        let err = decode_source(vec![0xFE, 0xFF, 0x00, b'a']).unwrap_err();
        assert!(err.to_string().contains("UTF-16 (big endian)"));
    }

    #[test]
    fn invalid_utf8_reports_offset() {
        let err = decode_source(vec![b'a', b'b', 0xC3, 0x28]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("at byte 2"), "{}", msg);
    }
}
