//! ToUnicode CMap parser.
//!
//! Reads the `bfchar` and `bfrange` sections of a `/ToUnicode` stream.
//! Destination strings are UTF-16BE; a single code may map to several
//! characters (ligatures).

use std::collections::HashMap;

use crate::error::BackendError;

/// Character code to Unicode mapping parsed from a ToUnicode stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicode {
    mappings: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Hex(&'a str),
    OpenArray,
    CloseArray,
    Keyword(&'a str),
}

impl ToUnicode {
    /// Parse a ToUnicode CMap from its decoded stream bytes.
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let text = String::from_utf8_lossy(data);
        let tokens = tokenize(&text);
        let mut mappings = HashMap::new();

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                Token::Keyword("beginbfchar") => {
                    i += 1;
                    while i + 1 < tokens.len() {
                        match (&tokens[i], &tokens[i + 1]) {
                            (Token::Hex(src), Token::Hex(dst)) => {
                                mappings.insert(parse_code(src)?, decode_utf16be(dst)?);
                                i += 2;
                            }
                            _ => break,
                        }
                    }
                }
                Token::Keyword("beginbfrange") => {
                    i += 1;
                    i = parse_bfrange(&tokens, i, &mut mappings)?;
                }
                _ => i += 1,
            }
        }

        Ok(ToUnicode { mappings })
    }

    /// The Unicode text for `code`, if mapped.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// The smallest code mapping to exactly `text`.
    pub fn code_for(&self, text: &str) -> Option<u32> {
        self.mappings
            .iter()
            .filter(|(_, v)| v.as_str() == text)
            .map(|(&code, _)| code)
            .min()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Parse `bfrange` entries starting at `i`; returns the index after them.
fn parse_bfrange(
    tokens: &[Token<'_>],
    mut i: usize,
    mappings: &mut HashMap<u32, String>,
) -> Result<usize, BackendError> {
    while i + 2 < tokens.len() {
        let (Token::Hex(lo), Token::Hex(hi)) = (&tokens[i], &tokens[i + 1]) else {
            break;
        };
        let lo = parse_code(lo)?;
        let hi = parse_code(hi)?;
        if hi < lo {
            return Err(BackendError::Font(format!(
                "bfrange end {hi:#x} before start {lo:#x}"
            )));
        }
        match &tokens[i + 2] {
            Token::Hex(dst) => {
                let mut units = utf16_units(dst)?;
                for code in lo..=hi {
                    if let Ok(s) = String::from_utf16(&units) {
                        mappings.insert(code, s);
                    }
                    // The last UTF-16 unit increments across the range.
                    if let Some(last) = units.last_mut() {
                        *last = last.wrapping_add(1);
                    }
                }
                i += 3;
            }
            Token::OpenArray => {
                i += 3;
                let mut code = lo;
                while i < tokens.len() {
                    match &tokens[i] {
                        Token::Hex(dst) => {
                            if code <= hi {
                                mappings.insert(code, decode_utf16be(dst)?);
                            }
                            code += 1;
                            i += 1;
                        }
                        Token::CloseArray => {
                            i += 1;
                            break;
                        }
                        _ => {
                            return Err(BackendError::Font(
                                "unterminated bfrange array".to_string(),
                            ));
                        }
                    }
                }
            }
            _ => break,
        }
    }
    Ok(i)
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if bytes.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if bytes.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = text[start..].find('>').map_or(bytes.len(), |p| start + p);
                tokens.push(Token::Hex(&text[start..end]));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::OpenArray);
                i += 1;
            }
            b']' => {
                tokens.push(Token::CloseArray);
                i += 1;
            }
            b if b.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Keyword(&text[start..i]));
            }
            _ => i += 1,
        }
    }
    tokens
}

fn clean_hex(hex: &str) -> String {
    hex.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_code(hex: &str) -> Result<u32, BackendError> {
    let hex = clean_hex(hex);
    u32::from_str_radix(&hex, 16)
        .map_err(|e| BackendError::Font(format!("invalid CMap code <{hex}>: {e}")))
}

fn utf16_units(hex: &str) -> Result<Vec<u16>, BackendError> {
    let mut hex = clean_hex(hex);
    // Pad odd-length strings to whole bytes, then to whole UTF-16 units.
    while hex.len() % 4 != 0 {
        hex.insert(0, '0');
    }
    (0..hex.len())
        .step_by(4)
        .map(|i| {
            u16::from_str_radix(&hex[i..i + 4], 16)
                .map_err(|e| BackendError::Font(format!("invalid UTF-16 in CMap <{hex}>: {e}")))
        })
        .collect()
}

fn decode_utf16be(hex: &str) -> Result<String, BackendError> {
    let units = utf16_units(hex)?;
    Ok(String::from_utf16_lossy(&units))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<00> <FF>
endcodespacerange
3 beginbfchar
<01> <0041>
<02> <00660069>
<03> <D83DDE00>
endbfchar
2 beginbfrange
<20> <22> <0061>
<30> <31> [<0058> <0059>]
endbfrange
endcmap
";

    #[test]
    fn empty_cmap_has_no_mappings() {
        let cmap = ToUnicode::parse(b"").unwrap();
        assert!(cmap.is_empty());
        assert_eq!(cmap.lookup(0x41), None);
    }

    // --- bfchar ---

    #[test]
    fn bfchar_single_and_ligature() {
        let cmap = ToUnicode::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(cmap.lookup(0x01), Some("A"));
        assert_eq!(cmap.lookup(0x02), Some("fi"));
    }

    #[test]
    fn bfchar_surrogate_pair() {
        let cmap = ToUnicode::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(cmap.lookup(0x03), Some("\u{1F600}"));
    }

    // --- bfrange ---

    #[test]
    fn bfrange_incrementing() {
        let cmap = ToUnicode::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(cmap.lookup(0x20), Some("a"));
        assert_eq!(cmap.lookup(0x21), Some("b"));
        assert_eq!(cmap.lookup(0x22), Some("c"));
        assert_eq!(cmap.lookup(0x23), None);
    }

    #[test]
    fn bfrange_array() {
        let cmap = ToUnicode::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(cmap.lookup(0x30), Some("X"));
        assert_eq!(cmap.lookup(0x31), Some("Y"));
        assert_eq!(cmap.len(), 8);
    }

    #[test]
    fn two_byte_codes() {
        let data = b"1 beginbfchar\n<0003> <0020>\nendbfchar\n1 beginbfrange\n<0024> <0025> <0041>\nendbfrange";
        let cmap = ToUnicode::parse(data).unwrap();
        assert_eq!(cmap.lookup(0x0003), Some(" "));
        assert_eq!(cmap.lookup(0x0025), Some("B"));
        assert_eq!(cmap.code_for(" "), Some(0x0003));
        assert_eq!(cmap.code_for("Z"), None);
    }

    #[test]
    fn reversed_range_is_an_error() {
        let data = b"1 beginbfrange\n<05> <01> <0041>\nendbfrange";
        assert!(matches!(ToUnicode::parse(data), Err(BackendError::Font(_))));
    }
}
