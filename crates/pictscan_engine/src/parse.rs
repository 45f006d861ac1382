use pictscan_logging::scan_debug;
use scraper::Html;
use url::Url;

use crate::decode::decode_html;

/// A parsed document together with the URL its relative references resolve against.
#[derive(Debug)]
pub struct ParsedPage {
    pub document: Html,
    pub base_url: Url,
    pub encoding_label: String,
}

impl ParsedPage {
    /// Resolves `reference` against the page URL.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.base_url.join(trimmed).ok()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid base url {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

pub trait PageParser: Send + Sync {
    fn parse(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        base_url: &str,
    ) -> Result<ParsedPage, ParseError>;
}

/// Decodes the body to text and builds an html5ever tree via `scraper`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScraperParser;

impl PageParser for ScraperParser {
    fn parse(
        &self,
        body: &[u8],
        content_type: Option<&str>,
        base_url: &str,
    ) -> Result<ParsedPage, ParseError> {
        let base_url = Url::parse(base_url).map_err(|err| ParseError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: err.to_string(),
        })?;
        let decoded = decode_html(body, content_type);
        if decoded.had_errors {
            scan_debug!(
                "Replaced malformed {} bytes in {}",
                decoded.encoding_label,
                base_url
            );
        }
        Ok(ParsedPage {
            document: Html::parse_document(&decoded.html),
            base_url,
            encoding_label: decoded.encoding_label,
        })
    }
}
