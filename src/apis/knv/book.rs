use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::constants::{MIN_DESCRIPTION_CHARS, TEXT_SEGMENT_DELIMITER};
use crate::pipeline::processing::catalog::CatalogEnrichment;
use crate::pipeline::processing::text::{decode_entities, millimeters_to_cm, strip_tags};
use crate::types::{Field, Record};

static ELEMENT_PATTERNS: Lazy<Mutex<HashMap<&'static str, Regex>>> = Lazy::new(Default::default);

/// Compiled once per element name
fn element_pattern(name: &'static str) -> Option<Regex> {
    let mut patterns = ELEMENT_PATTERNS.lock().ok()?;
    if let Some(re) = patterns.get(name) {
        return Some(re.clone());
    }
    let escaped = regex::escape(name);
    let pattern = format!(r"(?s)<(?:[\w.-]+:)?{escaped}(?:\s[^>]*[^/>])?>(.*?)</(?:[\w.-]+:)?{escaped}\s*>");
    let re = Regex::new(&pattern).ok()?;
    patterns.insert(name, re.clone());
    Some(re)
}

/// Text of the first `<name>` element, namespace prefix allowed.
///
/// Self-closing elements (`<Utitel/>`) have no text and yield `None`.
pub fn element_text<'a>(xml: &'a str, name: &'static str) -> Option<&'a str> {
    let re = element_pattern(name)?;
    re.captures(xml).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// The catalog fields of one KNV article (`KNVXMLLangText` format)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnvBook {
    /// `Erschjahr`
    pub year: Option<String>,
    /// `AutorSachtitel`
    pub author_title: Option<String>,
    /// `Utitel`
    pub subtitle: Option<String>,
    /// `Breite`, in millimeters
    pub width_mm: Option<String>,
    /// `Hoehe`, in millimeters
    pub height_mm: Option<String>,
    /// `Mitarb`
    pub participants: Option<String>,
    /// `Text1`, segments separated by `º`
    pub text: Option<String>,
    /// `MULTIMEDIA/MMUrl`
    pub cover_url: Option<String>,
}

impl KnvBook {
    pub fn from_article_xml(xml: &str) -> Self {
        let multimedia = element_text(xml, "MULTIMEDIA").unwrap_or("");
        Self {
            year: non_empty(element_text(xml, "Erschjahr")),
            author_title: non_empty(element_text(xml, "AutorSachtitel")),
            subtitle: non_empty(element_text(xml, "Utitel")),
            width_mm: non_empty(element_text(xml, "Breite")),
            height_mm: non_empty(element_text(xml, "Hoehe")),
            participants: non_empty(element_text(xml, "Mitarb")),
            text: non_empty(element_text(xml, "Text1")),
            cover_url: non_empty(element_text(multimedia, "MMUrl")),
        }
    }

    /// Everything this article adds to `record`; `no_description` stands in
    /// for a missing long text.
    pub fn enrichment(&self, record: &Record, no_description: &str) -> CatalogEnrichment {
        CatalogEnrichment {
            year: self.year.clone().unwrap_or_default(),
            author: self.author(record.value(Field::Title)),
            subtitle: self.subtitle.clone().unwrap_or_default(),
            dimensions: self.dimensions(),
            participants: self.participants.clone().unwrap_or_default(),
            description: self.description(no_description),
            cover_url: self.cover_url.clone().unwrap_or_default(),
        }
    }

    // For anthologies the catalog puts the title into the author slot
    fn author(&self, title: &str) -> String {
        match &self.author_title {
            Some(author) if author != title => author.clone(),
            _ => String::new(),
        }
    }

    /// "21,0cm x 29,7cm", or empty unless both sides are numeric
    pub fn dimensions(&self) -> String {
        let parse = |value: &Option<String>| -> Option<f64> {
            value
                .as_deref()
                .and_then(|v| v.trim().replace(',', ".").parse().ok())
                .filter(|v: &f64| v.is_finite())
        };
        match (parse(&self.width_mm), parse(&self.height_mm)) {
            (Some(width), Some(height)) => {
                format!("{} x {}", millimeters_to_cm(width), millimeters_to_cm(height))
            }
            _ => String::new(),
        }
    }

    /// First segment that is long enough to be a real description. Short
    /// segments are only dropped while others remain, so a lone teaser stays.
    pub fn description(&self, no_description: &str) -> String {
        let Some(text) = &self.text else {
            return no_description.to_string();
        };

        let segments: Vec<String> = text
            .split(TEXT_SEGMENT_DELIMITER)
            .map(str::trim)
            .map(clean_segment)
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut remaining = segments.len();
        for segment in segments {
            if segment.chars().count() < MIN_DESCRIPTION_CHARS && remaining > 1 {
                remaining -= 1;
                continue;
            }
            return segment;
        }
        no_description.to_string()
    }
}

fn clean_segment(segment: &str) -> String {
    let html = decode_entities(segment).replace("<br><br>", ". ");
    strip_tags(&html).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "Momo lebt in den Ruinen eines Amphitheaters. Sie besitzt nichts als das, \
                        was sie findet oder geschenkt bekommt, und eine außergewöhnliche Gabe: \
                        Sie kann zuhören.";

    fn article() -> String {
        format!(
            "<Artikel><Erschjahr>2018</Erschjahr><AutorSachtitel>Ende, Michael</AutorSachtitel>\
             <Utitel/><Breite>135</Breite><Hoehe>210</Hoehe><Mitarb>Illustr. v. Michael Ende</Mitarb>\
             <Text1>Ein Klassiker.º&lt;b&gt;{LONG}&lt;/b&gt;</Text1>\
             <MULTIMEDIA><MMTyp>zoom</MMTyp><MMUrl>https://mmo.knv.de/cover/978.jpg?a=1&b=2</MMUrl></MULTIMEDIA></Artikel>"
        )
    }

    fn record(title: &str) -> Record {
        [(Field::Title, title.to_string())].into_iter().collect()
    }

    #[test]
    fn test_parse_article() {
        let book = KnvBook::from_article_xml(&article());

        assert_eq!(book.year.as_deref(), Some("2018"));
        assert_eq!(book.author_title.as_deref(), Some("Ende, Michael"));
        assert_eq!(book.subtitle, None);
        assert_eq!(book.width_mm.as_deref(), Some("135"));
        assert_eq!(book.cover_url.as_deref(), Some("https://mmo.knv.de/cover/978.jpg?a=1&b=2"));
    }

    #[test]
    fn test_enrichment_fields() {
        let book = KnvBook::from_article_xml(&article());
        let enrichment = book.enrichment(&record("Momo"), "Keine Beschreibung vorhanden!");

        assert_eq!(enrichment.year, "2018");
        assert_eq!(enrichment.author, "Ende, Michael");
        assert_eq!(enrichment.subtitle, "");
        assert_eq!(enrichment.dimensions, "13,5cm x 21,0cm");
        assert_eq!(enrichment.participants, "Illustr. v. Michael Ende");
        assert_eq!(enrichment.description, LONG);
    }

    #[test]
    fn test_author_matching_title_is_suppressed() {
        let book = KnvBook {
            author_title: Some("Das große Vorlesebuch".to_string()),
            ..Default::default()
        };
        let enrichment = book.enrichment(&record("Das große Vorlesebuch"), "");
        assert_eq!(enrichment.author, "");
    }

    #[test]
    fn test_dimensions_need_both_sides() {
        let book = KnvBook {
            width_mm: Some("210".to_string()),
            height_mm: Some("297".to_string()),
            ..Default::default()
        };
        assert_eq!(book.dimensions(), "21,0cm x 29,7cm");

        let half = KnvBook {
            width_mm: Some("210".to_string()),
            ..Default::default()
        };
        assert_eq!(half.dimensions(), "");

        let not_numbers = KnvBook {
            width_mm: Some("NaN".to_string()),
            height_mm: Some("inf".to_string()),
            ..Default::default()
        };
        assert_eq!(not_numbers.dimensions(), "");
    }

    #[test]
    fn test_description_segments() {
        let missing = KnvBook::default();
        assert_eq!(missing.description("Keine Beschreibung vorhanden!"), "Keine Beschreibung vorhanden!");

        let teaser_only = KnvBook {
            text: Some("Kurz.ºAuch kurz.".to_string()),
            ..Default::default()
        };
        assert_eq!(teaser_only.description(""), "Auch kurz.");

        let line_breaks = KnvBook {
            text: Some("Erster Satz&lt;br&gt;&lt;br&gt;Zweiter Satz".to_string()),
            ..Default::default()
        };
        assert_eq!(line_breaks.description(""), "Erster Satz. Zweiter Satz");

        for empty in ["º", "&lt;b&gt;&lt;/b&gt;º "] {
            let book = KnvBook {
                text: Some(empty.to_string()),
                ..Default::default()
            };
            assert_eq!(book.description("Keine Beschreibung vorhanden!"), "Keine Beschreibung vorhanden!");
        }
    }

    #[test]
    fn test_element_text_handles_prefixes_and_attributes() {
        let xml = r#"<ns2:SessionID xmlns:ns2="urn:x">abc</ns2:SessionID><Hoehe unit="mm">200</Hoehe><Breite />"#;
        assert_eq!(element_text(xml, "SessionID"), Some("abc"));
        assert_eq!(element_text(xml, "Hoehe"), Some("200"));
        assert_eq!(element_text(xml, "Breite"), None);
        // second lookup reuses the cached pattern
        assert_eq!(element_text("<Hoehe>150</Hoehe>", "Hoehe"), Some("150"));
    }
}
