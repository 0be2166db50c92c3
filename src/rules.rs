//! Formatting rules attachable to a field definition.
//!
//! Each rule is a pure `&str -> Cow<str>` transform identified by a stable
//! name so that dictionaries can be persisted and reloaded with the same
//! rule bound. The set is closed; unknown names fail at dictionary load.

use std::borrow::Cow;
use std::sync::OnceLock;

use heck::ToTitleCase;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRule {
    Uppercase,
    Lowercase,
    InitialCaps,
    PhoneNumber,
    CountryCode,
}

impl FormatRule {
    /// Resolves a persisted rule name. Names are matched after common-name
    /// style normalization so "Initial Caps" and "initial-caps" both bind.
    pub fn from_name(name: &str) -> Option<Self> {
        let canonical: String = name
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match canonical.as_str() {
            "uppercase" | "allcaps" => Some(Self::Uppercase),
            "lowercase" => Some(Self::Lowercase),
            "initialcaps" => Some(Self::InitialCaps),
            "phonenumber" => Some(Self::PhoneNumber),
            "countrycode" => Some(Self::CountryCode),
            _ => None,
        }
    }

    /// Stable name written when a dictionary is persisted.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::InitialCaps => "initial-caps",
            Self::PhoneNumber => "phone-number",
            Self::CountryCode => "country-code",
        }
    }

    pub fn transform<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match self {
            Self::Uppercase => uppercase(input),
            Self::Lowercase => lowercase(input),
            Self::InitialCaps => initial_caps(input),
            Self::PhoneNumber => phone_number(input),
            Self::CountryCode => country_code(input),
        }
    }
}

/// Returns a lowercase representation, reusing the original string if already lowercase.
fn lowercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_uppercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_lowercase())
    }
}

/// Returns an uppercase representation, avoiding allocation when unnecessary.
fn uppercase(input: &str) -> Cow<'_, str> {
    if input.chars().all(|ch| !ch.is_lowercase()) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.to_uppercase())
    }
}

fn initial_caps(input: &str) -> Cow<'_, str> {
    let converted = input.to_title_case();
    if converted == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(converted)
    }
}

fn non_digit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9]").expect("static pattern"))
}

/// Normalizes North-American style phone numbers to `(###) ###-####`,
/// passing anything with an unexpected digit count through unchanged.
fn phone_number(input: &str) -> Cow<'_, str> {
    let digits = non_digit_pattern().replace_all(input, "");
    let digits = match digits.strip_prefix('1') {
        Some(rest) if digits.len() == 11 => rest,
        _ => digits.as_ref(),
    };
    if digits.len() != 10 {
        return Cow::Borrowed(input);
    }
    Cow::Owned(format!(
        "({}) {}-{}",
        &digits[..3],
        &digits[3..6],
        &digits[6..]
    ))
}

const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("australia", "AU"),
    ("canada", "CA"),
    ("france", "FR"),
    ("germany", "DE"),
    ("uk", "GB"),
    ("unitedkingdom", "GB"),
    ("unitedstates", "US"),
    ("unitedstatesofamerica", "US"),
    ("usa", "US"),
];

/// Normalizes a country spelling to its two-letter code; two-letter inputs
/// are uppercased, known names are mapped, anything else passes through.
fn country_code(input: &str) -> Cow<'_, str> {
    let trimmed = input.trim();
    if trimmed.len() == 2 && trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return uppercase(trimmed);
    }
    let folded: String = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    match COUNTRY_NAMES.binary_search_by(|(name, _)| name.cmp(&folded.as_str())) {
        Ok(idx) => Cow::Borrowed(COUNTRY_NAMES[idx].1),
        Err(_) => Cow::Borrowed(input),
    }
}
