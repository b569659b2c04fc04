//! International Morse code table: text ↔ dot/dash conversion.
//!
//! Pure and total over printable ASCII; unmapped characters are dropped.
//! In code strings a single space separates letters and `/` separates words.

/// Character to dot/dash code, international Morse.
const CODE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('/', "-..-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('@', ".--.-."),
];

/// Look up the code for a single character (case-insensitive).
pub fn char_to_code(ch: char) -> Option<&'static str> {
    let upper = ch.to_ascii_uppercase();
    CODE_TABLE
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, code)| *code)
}

/// Look up the character for a single dot/dash code.
pub fn code_to_char(code: &str) -> Option<char> {
    CODE_TABLE
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(ch, _)| *ch)
}

/// Encode text as a dot/dash string: one space between letters, ` / `
/// between words. Characters without a mapping are dropped.
pub fn text_to_code(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(char_to_code)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Decode a dot/dash string back to text. Letters without a mapping are
/// dropped; `/` marks a word boundary.
pub fn code_to_text(code: &str) -> String {
    code.split('/')
        .map(|word| {
            word.split_whitespace()
                .filter_map(code_to_char)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A random practice group of letters and digits.
pub fn random_group(len: usize) -> String {
    const GROUP_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..len)
        .map(|_| GROUP_CHARS[fastrand::usize(..GROUP_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_lookup() {
        assert_eq!(char_to_code('A'), Some(".-"));
        assert_eq!(char_to_code('s'), Some("..."));
        assert_eq!(char_to_code('0'), Some("-----"));
        assert_eq!(char_to_code('#'), None);
    }

    #[test]
    fn sos_encodes() {
        assert_eq!(text_to_code("SOS"), "... --- ...");
    }

    #[test]
    fn words_are_slash_separated() {
        assert_eq!(text_to_code("AT ET"), ".- - / . -");
    }

    #[test]
    fn unmapped_characters_are_dropped() {
        assert_eq!(text_to_code("S#S"), "... ...");
        assert_eq!(code_to_text("... ___ ..."), "SS");
    }

    #[test]
    fn encode_is_case_insensitive() {
        assert_eq!(text_to_code("sos"), text_to_code("SOS"));
    }

    #[test]
    fn round_trip_text() {
        let text = "HELLO WORLD 73";
        assert_eq!(code_to_text(&text_to_code(text)), text);
    }

    #[test]
    fn decode_tolerates_extra_whitespace() {
        assert_eq!(code_to_text("  ...   ---  ... "), "SOS");
    }

    #[test]
    fn empty_input() {
        assert_eq!(text_to_code(""), "");
        assert_eq!(code_to_text(""), "");
    }

    #[test]
    fn random_group_has_requested_length() {
        let group = random_group(5);
        assert_eq!(group.len(), 5);
        assert!(group.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
