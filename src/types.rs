//! Shared types passed between pipeline stages.
//!
//! Intake produces [`PhotoEntry`] values, the layout stage consumes them
//! together with a [`LedgerConfiguration`], and the document stage reads the
//! same configuration for the title row.

use chrono::NaiveDate;
use std::fmt;

/// A calendar date as printed on photos and in the ledger (`YYYY.MM.DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerDate(pub NaiveDate);

impl LedgerDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year/month/day. Returns `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for LedgerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y.%m.%d"))
    }
}

/// One uploaded photo with its label.
///
/// The bytes are the untouched upload. They are decoded independently for
/// preview and for the final render, so both passes see the same source.
///
/// The capture date is not stored here. It comes from the same EXIF read as
/// the orientation ([`crate::metadata::PhotoMetadata`]), which the layout
/// stage performs once per entry while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEntry {
    /// Raw image file bytes (JPEG, PNG, TIFF or WebP).
    pub bytes: Vec<u8>,
    /// 0-based position in upload order.
    pub index: usize,
    /// Short label number, e.g. `①`.
    pub number: String,
    /// Free-form description of the work location.
    pub content: String,
}

impl PhotoEntry {
    pub fn new(
        index: usize,
        bytes: Vec<u8>,
        number: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            index,
            number: number.into(),
            content: content.into(),
        }
    }

    /// Caption cell text: number and content joined by a single space.
    pub fn caption(&self) -> String {
        crate::layout::caption(&self.number, &self.content)
    }
}

/// Which date, if any, is burned into each photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStampMode {
    /// The same user-chosen date on every photo.
    Fixed(LedgerDate),
    /// Each photo's own EXIF capture date; photos without one get no stamp.
    FromCapture,
    #[default]
    None,
}

/// Per-build options. Immutable for the duration of one build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerConfiguration {
    pub customer_name: Option<String>,
    pub date_stamp: DateStampMode,
}

impl LedgerConfiguration {
    /// Customer name exactly as entered, `None` when absent or empty.
    pub fn customer(&self) -> Option<&str> {
        self.customer_name.as_deref().filter(|s| !s.is_empty())
    }

    /// The fixed date, present only in [`DateStampMode::Fixed`].
    pub fn fixed_date(&self) -> Option<LedgerDate> {
        match self.date_stamp {
            DateStampMode::Fixed(date) => Some(date),
            _ => None,
        }
    }
}
