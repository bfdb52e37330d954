//! Username and room-name normalization and validation.
//!
//! Names cross three boundaries: what the user types, what appears in a URL
//! path segment (`/room/<name>`), and what is sent to the server.  All three
//! go through the same [`normalize`] step so the validated value is exactly
//! the transmitted one.
//!
//! # Rules
//!
//! | step | effect |
//! |------|--------|
//! | percent-decode | `My%20Room` → `My Room`; malformed escapes keep the raw text |
//! | strip controls | code points below 32 and 127 are removed |
//! | collapse | every whitespace run becomes one space |
//! | trim | no leading or trailing whitespace |
//!
//! A valid name is non-empty, at most [`NameKind::max_len`] characters, and
//! made only of letters, digits, space, `_`, `.` and `-` (letters and digits
//! in any script).

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;
use unicode_general_category::{get_general_category, GeneralCategory};

/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 24;

/// Maximum room-name length, in characters.
pub const MAX_ROOM_NAME_LEN: usize = 32;

/// Which identity string is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Username,
    RoomName,
}

impl NameKind {
    pub fn max_len(self) -> usize {
        match self {
            NameKind::Username => MAX_USERNAME_LEN,
            NameKind::RoomName => MAX_ROOM_NAME_LEN,
        }
    }

    /// Label used at the start of user-facing error messages.
    pub fn label(self) -> &'static str {
        match self {
            NameKind::Username => "Username",
            NameKind::RoomName => "Room name",
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A name was rejected.  The `Display` text is shown to the user verbatim.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("{0} cannot be empty.")]
    Empty(NameKind),

    #[error("{0} must be {max} characters or fewer.", max = .0.max_len())]
    TooLong(NameKind),

    #[error("{0} may only include letters, numbers, spaces, hyphens, underscores, and periods.")]
    InvalidCharacter(NameKind),
}

impl NameError {
    pub fn kind(&self) -> NameKind {
        match self {
            NameError::Empty(kind) | NameError::TooLong(kind) | NameError::InvalidCharacter(kind) => {
                *kind
            }
        }
    }
}

/// Cleans up a raw name.  Never fails; `None` normalizes to an empty string.
///
/// The pipeline is repeated until the text stops changing, so the result is
/// a fixed point: `normalize(normalize(x)) == normalize(x)`.
///
/// # Examples
///
/// ```rust
/// use big2_core::domain::names::normalize;
///
/// assert_eq!(normalize("  a   b\t"), "a b");
/// assert_eq!(normalize("My%20Room"), "My Room");
/// assert_eq!(normalize(None), "");
/// ```
pub fn normalize<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let Some(raw) = raw.into() else {
        return String::new();
    };

    // Every changing pass shortens the text or only rewrites whitespace to
    // plain spaces, so this terminates.
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let decoded = percent_decode(raw);
    let stripped: String = decoded.chars().filter(|c| !is_stripped_control(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn percent_decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

fn is_stripped_control(c: char) -> bool {
    (c as u32) < 32 || c as u32 == 127
}

/// Letters (`\p{L}`), numbers (`\p{N}`) and ` _.-`.
///
/// Uses the general category rather than `char::is_alphabetic`, which also
/// admits combining marks such as U+093F.
fn is_allowed_char(c: char) -> bool {
    use GeneralCategory::*;
    matches!(c, ' ' | '_' | '.' | '-')
        || matches!(
            get_general_category(c),
            UppercaseLetter
                | LowercaseLetter
                | TitlecaseLetter
                | ModifierLetter
                | OtherLetter
                | DecimalNumber
                | LetterNumber
                | OtherNumber
        )
}

/// Normalizes then validates `raw` as a name of the given kind.
///
/// Checks run in order: empty, too long, invalid character.
///
/// # Errors
///
/// Returns the first [`NameError`] that applies.
pub fn validate<'a>(raw: impl Into<Option<&'a str>>, kind: NameKind) -> Result<String, NameError> {
    let name = normalize(raw);
    if name.is_empty() {
        return Err(NameError::Empty(kind));
    }
    if name.chars().count() > kind.max_len() {
        return Err(NameError::TooLong(kind));
    }
    if !name.chars().all(is_allowed_char) {
        return Err(NameError::InvalidCharacter(kind));
    }
    Ok(name)
}

pub fn validate_username<'a>(raw: impl Into<Option<&'a str>>) -> Result<String, NameError> {
    validate(raw, NameKind::Username)
}

pub fn validate_room_name<'a>(raw: impl Into<Option<&'a str>>) -> Result<String, NameError> {
    validate(raw, NameKind::RoomName)
}

/// Percent-encodes a name for use as a single URL path segment.
pub fn encode_for_path(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Recovers a name from a URL path segment.
///
/// Tolerates already-decoded text and malformed escapes.
pub fn decode_from_path(segment: &str) -> String {
    normalize(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── normalize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_collapses_and_trims_whitespace() {
        assert_eq!(normalize("  a   b\t"), "a b");
    }

    #[test]
    fn test_normalize_empty_and_missing_input_yield_empty_string() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(None), "");
    }

    #[test]
    fn test_normalize_strips_control_characters() {
        assert_eq!(normalize("Al\u{7}ice\u{7f}"), "Alice");
    }

    #[test]
    fn test_normalize_collapses_unicode_whitespace() {
        assert_eq!(normalize("a\u{00a0}\u{2003} b"), "a b");
    }

    #[test]
    fn test_normalize_decodes_percent_escapes() {
        assert_eq!(normalize("Room%20%C3%85"), "Room Å");
    }

    #[test]
    fn test_normalize_keeps_raw_text_when_decoding_fails() {
        // %FF alone is not valid UTF-8.
        assert_eq!(normalize("bad%FFname"), "bad%FFname");
    }

    #[test]
    fn test_normalize_keeps_plus_sign() {
        assert_eq!(normalize("a+b"), "a+b");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "  a   b\t",
            "Room%20%C3%85",
            "double%2520encoded",
            "\u{1}\u{2} x \u{7f}",
            "bad%FFname",
            "plain",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(once.as_str()), once, "input {input:?}");
        }
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_accepts_name_with_allowed_punctuation() {
        assert_eq!(validate("valid_name.1", NameKind::Username), Ok("valid_name.1".to_string()));
    }

    #[test]
    fn test_validate_returns_normalized_value() {
        assert_eq!(validate_room_name("  Quick   42 "), Ok("Quick 42".to_string()));
    }

    #[test]
    fn test_validate_rejects_long_username() {
        assert_eq!(
            validate("this-name-is-way-too-long-for-a-username-field", NameKind::Username),
            Err(NameError::TooLong(NameKind::Username))
        );
    }

    #[test]
    fn test_validate_room_name_allows_32_characters() {
        let name = "r".repeat(32);
        assert_eq!(validate_room_name(name.as_str()), Ok(name.clone()));
        let too_long = "r".repeat(33);
        assert_eq!(
            validate_room_name(too_long.as_str()),
            Err(NameError::TooLong(NameKind::RoomName))
        );
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let name = "Å".repeat(24);
        assert!(validate_username(name.as_str()).is_ok());
    }

    #[test]
    fn test_validate_rejects_whitespace_only_as_empty() {
        assert_eq!(validate_username("   \t "), Err(NameError::Empty(NameKind::Username)));
        assert_eq!(validate_username(None), Err(NameError::Empty(NameKind::Username)));
    }

    #[test]
    fn test_validate_rejects_symbols() {
        assert_eq!(
            validate_username("bob!"),
            Err(NameError::InvalidCharacter(NameKind::Username))
        );
        assert_eq!(
            validate_room_name("a/b"),
            Err(NameError::InvalidCharacter(NameKind::RoomName))
        );
    }

    #[test]
    fn test_validate_accepts_non_latin_letters_and_digits() {
        assert!(validate_username("Zoë 東京 ٣").is_ok());
    }

    #[test]
    fn test_validate_rejects_combining_marks() {
        // U+093F is Alphabetic but a spacing mark, not a letter.
        assert_eq!(
            validate("\u{915}\u{93F}", NameKind::Username),
            Err(NameError::InvalidCharacter(NameKind::Username))
        );
        assert_eq!(validate("Zoë", NameKind::Username), Ok("Zoë".to_string()));
    }

    #[test]
    fn test_validate_checks_length_before_characters() {
        let name = format!("{}!", "x".repeat(30));
        assert_eq!(validate_username(name.as_str()), Err(NameError::TooLong(NameKind::Username)));
    }

    // ── error messages ────────────────────────────────────────────────────────

    #[test]
    fn test_error_messages_match_user_facing_text() {
        assert_eq!(NameError::Empty(NameKind::Username).to_string(), "Username cannot be empty.");
        assert_eq!(
            NameError::TooLong(NameKind::RoomName).to_string(),
            "Room name must be 32 characters or fewer."
        );
        assert_eq!(
            NameError::InvalidCharacter(NameKind::Username).to_string(),
            "Username may only include letters, numbers, spaces, hyphens, underscores, and periods."
        );
    }

    // ── path encoding ─────────────────────────────────────────────────────────

    #[test]
    fn test_path_encoding_round_trip_preserves_name() {
        let encoded = encode_for_path("Room Å");
        assert_eq!(encoded, "Room%20%C3%85");
        assert_eq!(decode_from_path(&encoded), "Room Å");
    }

    #[test]
    fn test_decode_from_path_tolerates_decoded_and_malformed_input() {
        assert_eq!(decode_from_path("Room Å"), "Room Å");
        assert_eq!(decode_from_path("%E0%A4%A"), "%E0%A4%A");
    }
}
