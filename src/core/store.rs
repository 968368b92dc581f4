//! Purpose: Own the fully loaded, immutable movie collection.
//! Exports: `RecordStore`.
//! Role: Leaf component constructed once at startup and shared read-only.
//! Invariants: Lines end at `\n`, `\r\n`, or a lone `\r`.
//! Invariants: Line 0 is a header and is skipped without validation.
//! Invariants: Rows that fail to parse are dropped; loading never fails on a bad row.
//! Invariants: Source order is preserved and is the default iteration order.
//! Invariants: A missing dataset file is a `NotFound` error; nothing is served.

use std::fs;
use std::io;
use std::path::Path;

use bstr::ByteSlice;

use super::csv::parse_row;
use super::error::{Error, ErrorKind};
use super::movie::Movie;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordStore {
    movies: Vec<Movie>,
}

impl RecordStore {
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    /// Load a dataset file. Invalid UTF-8 is decoded lossily.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let bytes = fs::read(path).map_err(|err| {
            let (kind, message) = match err.kind() {
                io::ErrorKind::NotFound => (ErrorKind::NotFound, "dataset file not found"),
                _ => (ErrorKind::Io, "failed to read dataset file"),
            };
            Error::new(kind)
                .with_message(message)
                .with_path(path)
                .with_hint("Pass --data <PATH> or set CINEDEX_DATA to a movie CSV file.")
                .with_source(err)
        })?;

        let lines = bytes
            .lines()
            .flat_map(|line| line.split_str("\r"))
            .map(|line| line.to_str_lossy());
        let store = Self::from_lines(lines);
        tracing::info!(path = %path.display(), records = store.len(), "dataset loaded");
        Ok(store)
    }

    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines().flat_map(|line| line.split('\r')))
    }

    fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let movies = lines
            .into_iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, line)| match parse_row(line.as_ref()) {
                Ok(movie) => Some(movie),
                Err(err) => {
                    tracing::trace!(line = index + 1, error = %err, "dropping dataset row");
                    None
                }
            })
            .collect();
        Self { movies }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Movie> {
        self.movies.iter()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Movie;
    type IntoIter = std::slice::Iter<'a, Movie>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
