//! Purpose: Read-only query and aggregation operations over the record store.
//! Exports: `QueryEngine`, `DEFAULT_COUNT`.
//! Role: The operation surface the tool layer binds to named tools.
//! Invariants: No operation mutates the store; results borrow it immutably.
//! Invariants: Filters return matches in source order.
//! Invariants: Ranked operations use a stable sort, so ties keep source order.
//! Invariants: A non-positive `count` yields an empty result, never an error.
//! Invariants: Text matching is case-insensitive; each char is lowercased on its own,
//! so a letter folds the same wherever it sits in a word.

use std::cmp::Ordering;
use std::sync::Arc;

use super::movie::Movie;
use super::stats::{MovieStatistics, summarize};
use super::store::RecordStore;

pub const DEFAULT_COUNT: i64 = 10;

/// Cheap to clone; clones share the same store.
#[derive(Clone, Debug)]
pub struct QueryEngine {
    store: Arc<RecordStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn all_movies(&self) -> Vec<&Movie> {
        self.store.iter().collect()
    }

    /// An empty needle matches every title.
    pub fn search_by_title(&self, needle: &str) -> Vec<&Movie> {
        let needle = fold_case(needle);
        self.filter(|movie| fold_case(&movie.title).contains(&needle))
    }

    pub fn by_year(&self, year: i64) -> Vec<&Movie> {
        self.filter(|movie| i64::from(movie.release_year()) == year)
    }

    pub fn by_language(&self, language: &str) -> Vec<&Movie> {
        let language = fold_case(language);
        self.filter(|movie| fold_case(&movie.original_language) == language)
    }

    pub fn top_rated(&self, count: i64) -> Vec<&Movie> {
        self.ranked(count, |a, b| b.vote_average.total_cmp(&a.vote_average))
    }

    pub fn lowest_rated(&self, count: i64) -> Vec<&Movie> {
        self.ranked(count, |a, b| a.vote_average.total_cmp(&b.vote_average))
    }

    pub fn most_popular(&self, count: i64) -> Vec<&Movie> {
        self.ranked(count, |a, b| b.popularity.total_cmp(&a.popularity))
    }

    /// First match in source order when ids repeat.
    pub fn by_id(&self, id: i64) -> Option<&Movie> {
        self.store.iter().find(|movie| movie.id == id)
    }

    /// Inclusive on both ends; `min > max` is simply empty.
    pub fn by_rating_range(&self, min_rating: f64, max_rating: f64) -> Vec<&Movie> {
        self.filter(|movie| movie.vote_average >= min_rating && movie.vote_average <= max_rating)
    }

    pub fn statistics(&self) -> Option<MovieStatistics> {
        summarize(self.store.iter())
    }

    fn filter<P>(&self, predicate: P) -> Vec<&Movie>
    where
        P: Fn(&Movie) -> bool,
    {
        self.store.iter().filter(|movie| predicate(movie)).collect()
    }

    fn ranked<C>(&self, count: i64, compare: C) -> Vec<&Movie>
    where
        C: Fn(&Movie, &Movie) -> Ordering,
    {
        let take = match usize::try_from(count) {
            Ok(0) | Err(_) => return Vec::new(),
            Ok(take) => take,
        };
        let mut movies = self.all_movies();
        movies.sort_by(|a, b| compare(a, b));
        movies.truncate(take);
        movies
    }
}

// `str::to_lowercase` maps a word-final capital sigma to `ς`, which would stop `Σ` matching it.
fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}
