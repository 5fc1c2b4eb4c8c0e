use std::fmt::Write;
use std::str::FromStr;

use encoding_rs::{UTF_8, UTF_16LE};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("encoding not implemented: {0}")]
pub struct UnknownEncoding(pub String);

/// Character encodings accepted when reading a file as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Latin1,
    Ascii,
    Hex,
}

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(TextEncoding::Utf16Le),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "ascii" => Ok(TextEncoding::Ascii),
            "hex" => Ok(TextEncoding::Hex),
            _ => Err(UnknownEncoding(name.to_owned())),
        }
    }
}

impl TextEncoding {
    /// Decode `bytes`; malformed sequences become U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => UTF_8.decode_without_bom_handling(bytes).0.into_owned(),
            TextEncoding::Utf16Le => {
                // a dangling odd byte is dropped, not replaced
                let even = &bytes[..bytes.len() & !1];
                UTF_16LE.decode_without_bom_handling(even).0.into_owned()
            }
            // ISO-8859-1 proper; the encoding_rs "latin1" label is windows-1252
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Ascii => bytes.iter().map(|&b| (b & 0x7F) as char).collect(),
            TextEncoding::Hex => {
                let mut s = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(s, "{b:02x}");
                }
                s
            }
        }
    }
}
