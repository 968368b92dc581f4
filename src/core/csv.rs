//! Purpose: Split dataset lines into fields and convert them into typed movie rows.
//! Exports: `split_fields`, `parse_row`, `RowError`, `FIELD_COUNT`.
//! Role: Pure, allocation-light row parser used by the record store loader.
//! Invariants: Comma separates fields except inside double quotes.
//! Invariants: A quote preceded by a backslash is literal and does not toggle quoting.
//! Invariants: Quote state never spans lines; each line is scanned independently.
//! Invariants: A row either converts completely or is rejected; no partial rows.
//! Notes: The backslash-quote convention intentionally differs from RFC 4180 `""`.

use std::fmt;

use time::Date;

use super::movie::{Movie, RELEASE_DATE_FORMAT};

pub const FIELD_COUNT: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowError {
    MissingFields { found: usize },
    InvalidField { field: &'static str, value: String },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::MissingFields { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            RowError::InvalidField { field, value } => {
                write!(f, "invalid {field}: {value:?}")
            }
        }
    }
}

impl std::error::Error for RowError {}

/// Split one line into raw field values.
///
/// Quote characters that toggle quoting are dropped from the output; an
/// escaped quote (`\"`) is kept verbatim, backslash included.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        if ch == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
        } else if ch == ',' && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
        prev = Some(ch);
    }

    fields.push(current);
    fields
}

pub fn parse_row(line: &str) -> Result<Movie, RowError> {
    let fields = split_fields(line);
    if fields.len() < FIELD_COUNT {
        return Err(RowError::MissingFields {
            found: fields.len(),
        });
    }

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    let id = parse_integer("id", &next())?;
    let original_language = next();
    let overview = next();
    let release_date = parse_date("releaseDate", &next())?;
    let title = next();
    let popularity = parse_float("popularity", &next())?;
    let vote_average = parse_float("voteAverage", &next())?;
    let vote_count = parse_integer("voteCount", &next())?;

    Ok(Movie {
        id,
        original_language,
        overview,
        release_date,
        title,
        popularity,
        vote_average,
        vote_count,
    })
}

fn invalid(field: &'static str, value: &str) -> RowError {
    RowError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn parse_integer<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, RowError> {
    value.trim().parse().map_err(|_| invalid(field, value))
}

fn parse_float(field: &'static str, value: &str) -> Result<f64, RowError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(invalid(field, value)),
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<Date, RowError> {
    Date::parse(value, RELEASE_DATE_FORMAT).map_err(|_| invalid(field, value))
}
