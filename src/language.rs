//! Lookup tables loaded from the language resource (`languages/de.json`).
//!
//! Required keys: `binding` (binding code → display text) and `information`
//! (export jargon → display phrase). `age` and `no_description` are optional
//! and default to the German wording.

use crate::error::{EnrichError, Result};
use regex::{NoExpand, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LanguageFile {
    binding: BTreeMap<String, String>,
    information: BTreeMap<String, String>,
    #[serde(default)]
    age: AgeVocabulary,
    #[serde(default = "default_no_description")]
    no_description: String,
}

fn default_no_description() -> String {
    "Keine Beschreibung vorhanden!".to_string()
}

/// Words substituted into age recommendations like "6-8 J."
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgeVocabulary {
    pub years: String,
    pub months: String,
    pub range: String,
    /// Used when the info text carries no age recommendation
    pub none: String,
}

impl Default for AgeVocabulary {
    fn default() -> Self {
        Self {
            years: "Jahren".to_string(),
            months: "Monaten".to_string(),
            range: " bis ".to_string(),
            none: "Keine Altersangabe".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Translations {
    binding: BTreeMap<String, String>,
    // Longest key first, so "m. farb. Abb." is replaced before "Abb."
    phrases: Vec<(Regex, String)>,
    pub age: AgeVocabulary,
    pub no_description: String,
}

impl Translations {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EnrichError::Config(format!("Failed to read language file '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: LanguageFile = serde_json::from_str(content)?;

        let mut entries: Vec<(String, String)> = file.information.into_iter().collect();
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()).then_with(|| a.0.cmp(&b.0)));
        let phrases = entries
            .into_iter()
            .map(|(from, to)| Ok((phrase_pattern(&from)?, to)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            binding: file.binding,
            phrases,
            age: file.age,
            no_description: file.no_description,
        })
    }

    /// Display text for a binding code. An empty code stays empty.
    pub fn binding(&self, code: &str) -> Result<String> {
        if code.is_empty() {
            return Ok(String::new());
        }
        self.binding
            .get(code)
            .cloned()
            .ok_or_else(|| EnrichError::UnknownBinding(code.to_string()))
    }

    /// Replaces every known jargon token starting at a word boundary inside
    /// `text`; unknown text passes through
    pub fn substitute(&self, text: &str) -> String {
        self.phrases.iter().fold(text.to_string(), |acc, (from, to)| {
            from.replace_all(&acc, NoExpand(to)).into_owned()
        })
    }
}

// "m." must not match the tail of "Zoom."
fn phrase_pattern(key: &str) -> Result<Regex> {
    let anchor = match key.chars().next() {
        Some(c) if c.is_alphanumeric() => r"\b",
        _ => "",
    };
    Regex::new(&format!("{anchor}{}", regex::escape(key)))
        .map_err(|e| EnrichError::Config(format!("Invalid information key '{}': {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "binding": {"Gb.": "gebunden", "kart.": "kartoniert"},
        "information": {"Abb.": "Abbildungen", "m. farb. Abb.": "mit farbigen Abbildungen"}
    }"#;

    #[test]
    fn test_binding_lookup() {
        let t = Translations::from_json(SAMPLE).unwrap();
        assert_eq!(t.binding("Gb.").unwrap(), "gebunden");
        assert_eq!(t.binding("").unwrap(), "");
    }

    #[test]
    fn test_unknown_binding_is_an_error() {
        let t = Translations::from_json(SAMPLE).unwrap();
        match t.binding("Leder") {
            Err(EnrichError::UnknownBinding(code)) => assert_eq!(code, "Leder"),
            other => panic!("expected UnknownBinding, got {:?}", other),
        }
    }

    #[test]
    fn test_longer_phrases_replace_first() {
        let t = Translations::from_json(SAMPLE).unwrap();
        assert_eq!(t.substitute("m. farb. Abb."), "mit farbigen Abbildungen");
        assert_eq!(t.substitute("zahlr. Abb."), "zahlr. Abbildungen");
        assert_eq!(t.substitute("Pappbilderbuch"), "Pappbilderbuch");
    }

    #[test]
    fn test_phrases_only_match_at_word_start() {
        let t = Translations::from_json(
            r#"{"binding": {}, "information": {"m.": "mit", "Abb.": "Abbildungen"}}"#,
        )
        .unwrap();
        assert_eq!(t.substitute("Zoom."), "Zoom.");
        assert_eq!(t.substitute("Album. m. Abb."), "Album. mit Abbildungen");
        assert_eq!(t.substitute("m. Abb."), "mit Abbildungen");
    }

    #[test]
    fn test_optional_keys_default_to_german() {
        let t = Translations::from_json(SAMPLE).unwrap();
        assert_eq!(t.age.years, "Jahren");
        assert_eq!(t.age.none, "Keine Altersangabe");
        assert_eq!(t.no_description, "Keine Beschreibung vorhanden!");
    }

    #[test]
    fn test_missing_required_key_fails() {
        let result = Translations::from_json(r#"{"binding": {}}"#);
        assert!(matches!(result, Err(EnrichError::Json(_))));
    }
}
