// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-based detection and masking of personal data in free text.
//!
//! [`scan`] never fails. It runs an ordered list of matchers over the full
//! text and returns every detection plus a masked copy of the input. Raw
//! matched values stay inside this module: callers only see the category,
//! the masked value, and the byte span.

use std::fmt;
use std::sync::LazyLock;

use neoai_core::DetectionHint;
use regex::Regex;
use strum::{Display, EnumString};

/// Category of personal data a matcher recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PiiKind {
    Email,
    Phone,
    CreditCard,
    Ssn,
    ApiKey,
    Password,
    Address,
    Aadhaar,
    Pan,
}

/// One match inside a scanned text. Byte offsets are into the original input.
#[derive(Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: PiiKind,
    pub masked: String,
    pub start: usize,
    pub end: usize,
    raw: String,
}

impl Detection {
    /// The `{type, hint}` pair that may be shown to a client.
    pub fn hint(&self) -> DetectionHint {
        DetectionHint {
            kind: self.kind.to_string(),
            hint: self.masked.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detection")
            .field("kind", &self.kind)
            .field("masked", &self.masked)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("raw", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    pub has_detections: bool,
    pub detections: Vec<Detection>,
    pub masked_text: String,
}

impl ScanResult {
    pub fn hints(&self) -> Vec<DetectionHint> {
        self.detections.iter().map(Detection::hint).collect()
    }
}

struct Matcher {
    kind: PiiKind,
    regex: Regex,
    accept: fn(&str) -> bool,
    mask: fn(&str) -> String,
}

static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        Matcher {
            kind: PiiKind::Email,
            regex: Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").unwrap(),
            accept: |_| true,
            mask: mask_email,
        },
        Matcher {
            kind: PiiKind::Phone,
            regex: Regex::new(r"\+\d{1,3}[-.]\s?\(?\d{2,4}\)?[-.]?\d{3,4}[-.]?\d{3,4}").unwrap(),
            accept: |_| true,
            mask: mask_phone,
        },
        Matcher {
            kind: PiiKind::CreditCard,
            regex: Regex::new(r"\b(?:\d[ \-]*?){13,19}\b").unwrap(),
            accept: is_luhn_valid,
            mask: |m| format!("****-****-****-{}", last_digits(m, 4)),
        },
        Matcher {
            kind: PiiKind::Ssn,
            regex: Regex::new(r"\b\d{3}[-\s]\d{2}[-\s]\d{4}\b").unwrap(),
            accept: is_plausible_ssn,
            mask: |_| "***-**-****".to_string(),
        },
        Matcher {
            kind: PiiKind::ApiKey,
            regex: Regex::new(
                r"\b(?:sk-[a-zA-Z0-9]{20,}|ghp_[a-zA-Z0-9]{36,}|gho_[a-zA-Z0-9]{36,}|glpat-[a-zA-Z0-9\-]{20,}|xox[bpras]-[a-zA-Z0-9\-]{10,}|AIza[a-zA-Z0-9_\-]{35}|ya29\.[a-zA-Z0-9_\-.]{50,}|AKIA[A-Z0-9]{16})\b",
            )
            .unwrap(),
            accept: |_| true,
            mask: mask_api_key,
        },
        Matcher {
            kind: PiiKind::Password,
            regex: Regex::new(r#"(?i)(?:password|passwd|pwd|pass)\s*[=:]\s*["']?[^\s"',;]{4,}"#)
                .unwrap(),
            accept: |_| true,
            mask: mask_password,
        },
        Matcher {
            kind: PiiKind::Address,
            regex: Regex::new(
                r"(?i)\b\d{1,5}\s+(?:[a-z]+\s){1,3}(?:St|Street|Ave|Avenue|Blvd|Boulevard|Dr|Drive|Ln|Lane|Rd|Road|Ct|Court|Way|Pl|Place)\.?\b",
            )
            .unwrap(),
            accept: |_| true,
            mask: |_| "[REDACTED_ADDRESS]".to_string(),
        },
        Matcher {
            kind: PiiKind::Aadhaar,
            regex: Regex::new(r"\b[2-9]\d{3}[\s-]?\d{4}[\s-]?\d{4}\b").unwrap(),
            accept: |_| true,
            mask: |m| format!("****-****-{}", last_digits(m, 4)),
        },
        Matcher {
            kind: PiiKind::Pan,
            regex: Regex::new(r"\b[A-Z]{5}\d{4}[A-Z]\b").unwrap(),
            accept: |_| true,
            mask: |m| format!("{}****{}", &m[..2], &m[m.len() - 2..]),
        },
    ]
});

/// Scan `text` for personal data.
pub fn scan(text: &str) -> ScanResult {
    let mut detections: Vec<Detection> = Vec::new();

    for matcher in MATCHERS.iter() {
        for found in matcher.regex.find_iter(text) {
            let value = found.as_str();
            if !(matcher.accept)(value) {
                continue;
            }
            let (start, end) = (found.start(), found.end());
            if detections.iter().any(|d| d.start == start && d.end == end) {
                continue;
            }
            detections.push(Detection {
                kind: matcher.kind,
                masked: (matcher.mask)(value),
                start,
                end,
                raw: value.to_string(),
            });
        }
    }

    let masked_text = apply_masks(text, &detections);
    ScanResult {
        has_detections: !detections.is_empty(),
        detections,
        masked_text,
    }
}

/// Masked copy of `text`, suitable for logs.
pub fn mask(text: &str) -> String {
    scan(text).masked_text
}

/// Substitute masks back to front so earlier offsets stay valid.
///
/// Where spans from different categories overlap, the overlapping tail has
/// already been replaced, so only the untouched head of the later span is
/// substituted. No raw byte inside any detection survives.
fn apply_masks(text: &str, detections: &[Detection]) -> String {
    let mut ordered: Vec<&Detection> = detections.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut out = text.to_string();
    let mut cursor = text.len();
    for d in ordered {
        let end = d.end.min(cursor);
        if d.start >= end {
            continue;
        }
        out.replace_range(d.start..end, &d.masked);
        cursor = d.start;
    }
    out
}

fn mask_email(m: &str) -> String {
    let (local, domain) = m.split_once('@').unwrap_or((m, ""));
    let first = |s: &str| s.chars().next().map(String::from).unwrap_or_default();
    let tld = domain.rsplit('.').next().unwrap_or_default();
    format!("{}***@{}***.{tld}", first(local), first(domain))
}

/// Star every digit that is immediately followed by four more digits.
fn mask_phone(m: &str) -> String {
    let chars: Vec<char> = m.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let followed_by_four = chars.len() >= i + 5
                && chars[i + 1..i + 5].iter().all(char::is_ascii_digit);
            if c.is_ascii_digit() && followed_by_four {
                '*'
            } else {
                *c
            }
        })
        .collect()
}

fn mask_api_key(m: &str) -> String {
    let visible: String = m.chars().take(6).collect();
    let hidden = m.chars().count().saturating_sub(6).min(20);
    format!("{visible}{}", "*".repeat(hidden))
}

fn mask_password(m: &str) -> String {
    match m.find(['=', ':']) {
        Some(idx) => format!("{} [REDACTED]", &m[..=idx]),
        None => "[REDACTED_PASSWORD]".to_string(),
    }
}

fn last_digits(m: &str, n: usize) -> String {
    let digits: Vec<char> = m.chars().filter(char::is_ascii_digit).collect();
    digits[digits.len().saturating_sub(n)..].iter().collect()
}

/// Luhn checksum over the digits of `m`, requiring 13 to 19 digits.
fn is_luhn_valid(m: &str) -> bool {
    let digits: Vec<u32> = m.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Reject area 000, 666, 9xx; group 00; serial 0000.
fn is_plausible_ssn(m: &str) -> bool {
    let digits: String = m.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return false;
    }
    let (area, rest) = digits.split_at(3);
    let (group, serial) = rest.split_at(2);
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(result: &ScanResult) -> Vec<PiiKind> {
        result.detections.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn clean_text_passes_through_unchanged() {
        let text = "What is the capital of France? Explain in 3 sentences.";
        let result = scan(text);
        assert!(!result.has_detections);
        assert!(result.detections.is_empty());
        assert_eq!(result.masked_text, text);
    }

    #[test]
    fn email_is_masked_to_initials() {
        let result = scan("mail me at jane.doe@example.com please");
        assert_eq!(kinds(&result), vec![PiiKind::Email]);
        assert_eq!(result.detections[0].masked, "j***@e***.com");
        assert_eq!(result.masked_text, "mail me at j***@e***.com please");
    }

    #[test]
    fn valid_card_keeps_only_last_four() {
        let result = scan("card 4111 1111 1111 1111 exp 12/29");
        let cards: Vec<_> = result
            .detections
            .iter()
            .filter(|d| d.kind == PiiKind::CreditCard)
            .collect();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].masked, "****-****-****-1111");
        assert!(!result.masked_text.contains("4111 1111"));
    }

    #[test]
    fn luhn_invalid_number_is_not_a_card() {
        let result = scan("order number 1234567812345678");
        assert!(!kinds(&result).contains(&PiiKind::CreditCard));
    }

    #[test]
    fn ssn_rejects_reserved_areas() {
        assert_eq!(kinds(&scan("ssn 123-45-6789")), vec![PiiKind::Ssn]);
        assert!(scan("ssn 000-45-6789").detections.is_empty());
        assert!(scan("ssn 666-45-6789").detections.is_empty());
        assert!(scan("ssn 912-45-6789").detections.is_empty());
        assert!(scan("ssn 123-00-6789").detections.is_empty());
        assert!(scan("ssn 123-45-0000").detections.is_empty());
    }

    #[test]
    fn api_key_keeps_six_character_prefix() {
        let result = scan("token sk-abcdefghijklmnopqrstuvwxyz0123456789 here");
        assert_eq!(kinds(&result), vec![PiiKind::ApiKey]);
        assert_eq!(result.detections[0].masked, format!("sk-abc{}", "*".repeat(20)));
    }

    #[test]
    fn password_assignment_keeps_key_name() {
        let result = scan("my password: hunter22 ok");
        assert_eq!(kinds(&result), vec![PiiKind::Password]);
        assert_eq!(result.detections[0].masked, "password: [REDACTED]");
        assert_eq!(result.masked_text, "my password: [REDACTED] ok");
    }

    #[test]
    fn street_address_is_redacted() {
        let result = scan("I live at 221 Baker Street near the park");
        assert_eq!(kinds(&result), vec![PiiKind::Address]);
        assert!(result.masked_text.contains("[REDACTED_ADDRESS]"));
    }

    #[test]
    fn aadhaar_and_pan_are_detected() {
        let result = scan("aadhaar 2345 6789 0123 and pan ABCDE1234F");
        assert!(kinds(&result).contains(&PiiKind::Aadhaar));
        assert!(kinds(&result).contains(&PiiKind::Pan));
        let pan = result.detections.iter().find(|d| d.kind == PiiKind::Pan).unwrap();
        assert_eq!(pan.masked, "AB****4F");
        let aadhaar = result
            .detections
            .iter()
            .find(|d| d.kind == PiiKind::Aadhaar)
            .unwrap();
        assert_eq!(aadhaar.masked, "****-****-0123");
    }

    #[test]
    fn phone_digits_are_starred_except_last_four() {
        let result = scan("call +1-555-123-4567 now");
        assert_eq!(kinds(&result), vec![PiiKind::Phone]);
        assert_eq!(result.detections[0].masked, "+1-555-123-4567");
        let compact = scan("call +44-2079460958 now");
        assert_eq!(compact.detections[0].masked, "+44-******0958");
    }

    #[test]
    fn same_span_is_reported_once() {
        let result = scan("id 2345 6789 0123 and 4111-1111-1111-1111");
        let spans: Vec<(usize, usize)> = result.detections.iter().map(|d| (d.start, d.end)).collect();
        let mut deduped = spans.clone();
        deduped.dedup();
        assert_eq!(spans, deduped);
    }

    #[test]
    fn multiple_detections_are_all_masked() {
        let text = "email a@b.io, ssn 123-45-6789, pan ABCDE1234F";
        let result = scan(text);
        assert_eq!(result.detections.len(), 3);
        assert!(!result.masked_text.contains("a@b.io"));
        assert!(!result.masked_text.contains("123-45-6789"));
        assert!(!result.masked_text.contains("ABCDE1234F"));
        assert!(result.masked_text.starts_with("email a***@b***.io, ssn ***-**-****"));
    }

    #[test]
    fn raw_values_never_appear_in_debug_or_hints() {
        let result = scan("reach me at secret.person@example.org");
        let detection = &result.detections[0];
        assert_eq!(detection.raw(), "secret.person@example.org");
        assert!(!format!("{detection:?}").contains("secret.person"));
        let hints = result.hints();
        assert_eq!(hints[0].kind, "email");
        assert!(!hints[0].hint.contains("secret.person"));
    }

    #[test]
    fn overlapping_spans_leave_no_raw_digits() {
        // Card span and aadhaar span overlap on the same digits.
        let text = "pay 4111-1111-1111-1111 now";
        let masked = mask(text);
        assert!(!masked.contains("1111-1111-1111"));
    }

    fn card_with_check_digit(body: &[u32]) -> String {
        let mut digits = body.to_vec();
        digits.push(0);
        let sum: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &d)| if i % 2 == 1 { let x = d * 2; if x > 9 { x - 9 } else { x } } else { d })
            .sum();
        let check = (10 - sum % 10) % 10;
        let last = digits.len() - 1;
        digits[last] = check;
        digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect()
    }

    proptest! {
        #[test]
        fn any_luhn_valid_card_is_detected_with_last_four(
            first in 1u32..=9,
            rest in proptest::collection::vec(0u32..=9, 14),
        ) {
            let mut body = vec![first];
            body.extend(rest);
            let card = card_with_check_digit(&body);
            let text = format!("my card is {card} thanks");
            let result = scan(&text);
            let cards: Vec<_> = result.detections.iter().filter(|d| d.kind == PiiKind::CreditCard).collect();
            prop_assert_eq!(cards.len(), 1);
            prop_assert_eq!(&cards[0].masked, &format!("****-****-****-{}", &card[card.len() - 4..]));
            prop_assert!(!result.masked_text.contains(&card));
        }

        #[test]
        fn lowercase_words_are_never_flagged(words in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
            let text = words.join(" ");
            let result = scan(&text);
            prop_assert!(!result.has_detections);
            prop_assert_eq!(result.masked_text, text);
        }
    }
}
