//! Store date normalization.
//!
//! Each store prints its "last updated" date in its own format. All of them
//! are reduced to a calendar date rendered as `DD-MM-YYYY`; time of day is
//! dropped. Parsing fails closed: trailing text or an out-of-range value is
//! an error, never a partial date.

use crate::error::KatsiniError;
use chrono::{NaiveDate, NaiveDateTime};

/// Output format shared by every provider.
pub const CANONICAL_FORMAT: &str = "%d-%m-%Y";

/// The date formats the supported stores emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Google Play page, e.g. `Jan 2, 2006`.
    PlayStore,
    /// AppGallery page, e.g. `1/2/2006` (month first).
    AppGalleryPage,
    /// iTunes lookup API, e.g. `2006-01-02T15:04:05Z`.
    ITunes,
    /// AppGallery Connect API, e.g. `2006-01-02 15:04:05`.
    AppGalleryApi,
}

impl SourceFormat {
    /// chrono format string for this source.
    pub fn pattern(self) -> &'static str {
        match self {
            SourceFormat::PlayStore => "%b %d, %Y",
            SourceFormat::AppGalleryPage => "%m/%d/%Y",
            SourceFormat::ITunes => "%Y-%m-%dT%H:%M:%SZ",
            SourceFormat::AppGalleryApi => "%Y-%m-%d %H:%M:%S",
        }
    }

    fn has_time(self) -> bool {
        matches!(self, SourceFormat::ITunes | SourceFormat::AppGalleryApi)
    }

    /// Parse `raw` into a calendar date.
    pub fn parse(self, raw: &str) -> Result<NaiveDate, KatsiniError> {
        let input = raw.trim();
        let parsed = if self.has_time() {
            NaiveDateTime::parse_from_str(input, self.pattern()).map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(input, self.pattern())
        };
        parsed.map_err(|_| KatsiniError::DateParse {
            input: raw.to_string(),
            format: self.pattern(),
        })
    }

    /// Parse `raw` and render it as `DD-MM-YYYY`.
    pub fn normalize(self, raw: &str) -> Result<String, KatsiniError> {
        let date = self.parse(raw)?;
        Ok(date.format(CANONICAL_FORMAT).to_string())
    }
}
