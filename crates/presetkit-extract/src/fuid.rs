//! Processor class id from `fuid.hpp`.

use crate::source::{PreparedSource, Scanner, find_word, split_top_level};

/// Extract the processor GUID from a declaration such as
///
/// ```cpp
/// static const FUID ProcessorUID(0x41347FD6, 0xFED64094, 0xAFBB12B7, 0xDBA1D441);
/// ```
///
/// Returns the four 32-bit words as 32 uppercase hex characters, the same
/// text a preset stores as its class id. `None` if the declaration is missing
/// or any word is not a hex literal of at most eight digits.
pub fn extract_processor_uid(source: &str) -> Option<String> {
    let prepared = PreparedSource::new(source);
    let text = prepared.text();

    let mut from = 0;
    while let Some(at) = find_word(text, "ProcessorUID", from) {
        from = at + "ProcessorUID".len();
        let mut s = Scanner::at(text, from);
        s.skip_ws();
        let Some(args) = s.balanced(b'(', b')') else {
            continue;
        };
        let Some([a, b, c, d]) = parse_words(args) else {
            continue;
        };
        return Some(format!("{a:08X}{b:08X}{c:08X}{d:08X}"));
    }
    None
}

/// Four comma separated hex literals.
fn parse_words(args: &str) -> Option<[u32; 4]> {
    let words = split_top_level(args);
    if words.len() != 4 {
        return None;
    }
    let mut parts = [0u32; 4];
    for (part, word) in parts.iter_mut().zip(words) {
        let word = word.trim();
        let digits = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X"))?;
        *part = u32::from_str_radix(digits.trim_end_matches(['u', 'U', 'l', 'L']), 16).ok()?;
    }
    Some(parts)
}
