/// Endpoint and provider constants shared across the codebase

// Provider names (used in logs and the run report)
pub const KNV_PROVIDER: &str = "knv";

// Cover images from the German National Library, keyed by `?isbn=`
pub const DNB_COVER_ENDPOINT: &str = "https://portal.dnb.de/opac/mvb/cover.htm";

// The cover endpoint rejects requests that don't look like a browser
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; WOW64; rv:45.0) Gecko/20100101 Firefox/45.0";

pub const KNV_ENDPOINT: &str = "http://ws.pcbis.de/knv-2.0/services/KNVWebService";

/// Backend databases searched for every ISBN
pub const KNV_DATABASES: [&str; 4] = ["KNV", "KNVBG", "BakerTaylor", "Gardners"];

/// Record format requested from the catalog
pub const KNV_RECORD_FORMAT: &str = "KNVXMLLangText";

/// Separates the segments of a long-form catalog text
pub const TEXT_SEGMENT_DELIMITER: char = 'º';

/// Text segments shorter than this are teasers, not descriptions
pub const MIN_DESCRIPTION_CHARS: usize = 130;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

pub const DEFAULT_DELIMITER: char = ';';
