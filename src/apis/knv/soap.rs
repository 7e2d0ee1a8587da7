//! SOAP 1.2 messages for the KNV web service (`WSCall`).
//!
//! A session is three kinds of calls: login (returns a `SessionID`), one
//! search-and-read per ISBN, and logout.

use super::book::element_text;
use crate::config::Credentials;
use crate::constants::KNV_RECORD_FORMAT;
use crate::pipeline::processing::text::decode_entities;

pub const CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

const SOAP_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
const KNV_NS: &str = "http://ws.pcbis.de/knv-2.0/";

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn envelope(call: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soap:Envelope xmlns:soap=\"{SOAP_NS}\" xmlns:knv=\"{KNV_NS}\">\
         <soap:Body><knv:WSCall>{call}</knv:WSCall></soap:Body></soap:Envelope>"
    )
}

pub fn login_envelope(credentials: &Credentials) -> String {
    envelope(&format!(
        "<LoginInfo><Benutzer>{}</Benutzer><Passwort>{}</Passwort></LoginInfo>",
        escape_xml(&credentials.user),
        escape_xml(&credentials.password)
    ))
}

/// Exact ISBN search over `databases`, reading only the first hit
pub fn search_envelope(session_id: &str, isbn: &str, databases: &[String]) -> String {
    let databases: String = databases
        .iter()
        .map(|db| format!("<Datenbank>{}</Datenbank>", escape_xml(db)))
        .collect();
    envelope(&format!(
        "<SessionID>{session}</SessionID>\
         <Suchen>{databases}<Suche><SimpleTerm>\
         <Suchfeld>ISBN</Suchfeld><Suchwert>{isbn}</Suchwert><Schwert2></Schwert2><Suchart>Genau</Suchart>\
         </SimpleTerm></Suche></Suchen>\
         <Lesen><SatzVon>1</SatzVon><SatzBis>1</SatzBis><Format>{KNV_RECORD_FORMAT}</Format>\
         <AuswahlMultimediaDaten><mmDatenLiefern>true</mmDatenLiefern><mmVarianteFilter>zoom</mmVarianteFilter>\
         </AuswahlMultimediaDaten></Lesen>",
        session = escape_xml(session_id),
        isbn = escape_xml(isbn),
    ))
}

pub fn logout_envelope(session_id: &str) -> String {
    envelope(&format!(
        "<SessionID>{}</SessionID><Logout>true</Logout>",
        escape_xml(session_id)
    ))
}

pub fn session_id(response: &str) -> Option<String> {
    element_text(response, "SessionID")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// The article XML carried as text inside `ArtikelDaten`, unescaped once
pub fn article_data(response: &str) -> Option<String> {
    element_text(response, "ArtikelDaten")
        .map(decode_entities)
        .filter(|xml| !xml.trim().is_empty())
}

/// Human-readable reason of a SOAP fault, if the response is one
pub fn fault(response: &str) -> Option<String> {
    element_text(response, "Fault")?;
    let reason = element_text(response, "Text")
        .or_else(|| element_text(response, "faultstring"))
        .unwrap_or("SOAP fault");
    Some(decode_entities(reason.trim()))
}
