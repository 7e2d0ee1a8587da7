use std::sync::Arc;
use tracing::trace;

use super::text::{capitalize_first, leading_number};
use crate::language::Translations;
use crate::types::NormalizedInfo;

/// What a single token of the info text turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Garbled "21 x 14 cm" leftovers, dropped
    Dimension,
    Age,
    PageCount,
    Year,
    Text,
}

/// First matching rule wins; the order below is significant.
pub fn classify(token: &str) -> TokenKind {
    if token.contains(" cm") || token.contains(" mm") {
        TokenKind::Dimension
    } else if token.contains(" J.") || token.contains(" Mon.") {
        TokenKind::Age
    } else if token.contains(" S.") {
        TokenKind::PageCount
    } else if token.chars().count() == 4 {
        TokenKind::Year
    } else {
        TokenKind::Text
    }
}

/// Splits on `;`, falling back to `.` when that yields a single token
pub fn split_info(text: &str) -> Vec<&str> {
    let tokens = split_trimmed(text, ';');
    if tokens.len() == 1 {
        split_trimmed(text, '.')
    } else {
        tokens
    }
}

fn split_trimmed(text: &str, separator: char) -> Vec<&str> {
    text.split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Pulls age, year and page count out of the export's "Informationen" text
/// and turns the rest into a display sentence.
pub struct FieldNormalizer {
    translations: Arc<Translations>,
}

impl FieldNormalizer {
    pub fn new(translations: Arc<Translations>) -> Self {
        Self { translations }
    }

    pub fn normalize(&self, info: &str) -> NormalizedInfo {
        let mut age_label = None;
        let mut page_count = None;
        let mut year = None;
        let mut remaining = Vec::new();

        for token in split_info(info) {
            let kind = classify(token);
            trace!(token, ?kind, "classified info token");
            match kind {
                TokenKind::Dimension => {}
                TokenKind::Age => age_label = Some(self.convert_age(token)),
                TokenKind::PageCount => page_count = leading_number(token),
                TokenKind::Year => year = Some(token.to_string()),
                TokenKind::Text => remaining.push(self.translations.substitute(token)),
            }
        }

        NormalizedInfo {
            description: finish_sentence(&remaining.join(", ")),
            year,
            age_label: age_label.unwrap_or_else(|| self.translations.age.none.clone()),
            page_count,
        }
    }

    /// "6-8 J." → "6 bis 8 Jahren", "3 u. 4 J." → "3 & 4 Jahren"
    fn convert_age(&self, token: &str) -> String {
        let vocab = &self.translations.age;
        token
            .replace("J.", &vocab.years)
            .replace("Mon.", &vocab.months)
            .replace('-', &vocab.range)
            .replace("u.", "&")
    }
}

fn finish_sentence(text: &str) -> String {
    let sentence = capitalize_first(text);
    let trimmed = sentence.trim_end_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}.")
    }
}
