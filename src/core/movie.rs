//! Purpose: Define the movie record and its wire representation.
//! Exports: `Movie`, `RELEASE_DATE_FORMAT`.
//! Role: The single row type shared by the parser, store, queries, and tools.
//! Invariants: Release dates round-trip through the strict `YYYY-MM-DD` form.
//! Invariants: JSON keys are camelCase and stable once published.

use serde::{Serialize, Serializer};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

pub const RELEASE_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// One row of the dataset, in source column order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub original_language: String,
    pub overview: String,
    #[serde(serialize_with = "serialize_release_date")]
    pub release_date: Date,
    pub title: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u64,
}

impl Movie {
    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }
}

fn serialize_release_date<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
    let text = date
        .format(RELEASE_DATE_FORMAT)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}
