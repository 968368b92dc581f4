//! Purpose: Aggregate summary statistics over a set of movies.
//! Exports: `MovieStatistics`, `LanguageCount`, `YearRange`, `summarize`.
//! Role: Pure reduction used by the query engine's statistics operation.
//! Invariants: An empty input yields `None`, never NaN or infinite values.
//! Invariants: Language buckets are case-sensitive and sorted by descending count;
//! equal counts keep first-appearance order.

use std::collections::HashMap;

use serde::Serialize;

use super::movie::Movie;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieStatistics {
    pub total_movies: usize,
    pub average_rating: f64,
    pub highest_rating: f64,
    pub lowest_rating: f64,
    pub average_popularity: f64,
    pub language_distribution: Vec<LanguageCount>,
    pub year_range: YearRange,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    pub earliest_year: i32,
    pub latest_year: i32,
}

pub fn summarize<'a, I>(movies: I) -> Option<MovieStatistics>
where
    I: IntoIterator<Item = &'a Movie>,
{
    let mut movies = movies.into_iter();
    let first = movies.next()?;

    let mut total = 0usize;
    let mut rating_sum = 0.0;
    let mut popularity_sum = 0.0;
    let mut highest = first.vote_average;
    let mut lowest = first.vote_average;
    let mut earliest = first.release_year();
    let mut latest = earliest;
    let mut languages: Vec<LanguageCount> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for movie in std::iter::once(first).chain(movies) {
        total += 1;
        rating_sum += movie.vote_average;
        popularity_sum += movie.popularity;
        highest = highest.max(movie.vote_average);
        lowest = lowest.min(movie.vote_average);
        earliest = earliest.min(movie.release_year());
        latest = latest.max(movie.release_year());

        let slot = *slots
            .entry(movie.original_language.as_str())
            .or_insert_with(|| {
                languages.push(LanguageCount {
                    language: movie.original_language.clone(),
                    count: 0,
                });
                languages.len() - 1
            });
        languages[slot].count += 1;
    }

    // Stable: ties stay in first-appearance order.
    languages.sort_by(|a, b| b.count.cmp(&a.count));

    Some(MovieStatistics {
        total_movies: total,
        average_rating: rating_sum / total as f64,
        highest_rating: highest,
        lowest_rating: lowest,
        average_popularity: popularity_sum / total as f64,
        language_distribution: languages,
        year_range: YearRange {
            earliest_year: earliest,
            latest_year: latest,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::{LanguageCount, summarize};
    use crate::core::movie::Movie;
    use time::{Date, Month};

    fn movie(id: i64, language: &str, year: i32, popularity: f64, vote_average: f64) -> Movie {
        Movie {
            id,
            original_language: language.to_string(),
            overview: String::new(),
            release_date: Date::from_calendar_date(year, Month::June, 1).expect("date"),
            title: format!("Movie {id}"),
            popularity,
            vote_average,
            vote_count: 1,
        }
    }

    #[test]
    fn empty_input_has_no_statistics() {
        let movies: Vec<Movie> = Vec::new();
        assert_eq!(summarize(&movies), None);
    }

    #[test]
    fn ratings_popularity_and_years_are_aggregated() {
        let movies = vec![
            movie(1, "en", 1994, 10.0, 4.0),
            movie(2, "en", 1972, 20.0, 6.0),
            movie(3, "ja", 2001, 60.0, 8.0),
        ];
        let stats = summarize(&movies).expect("stats");
        assert_eq!(stats.total_movies, 3);
        assert_eq!(stats.average_rating, 6.0);
        assert_eq!(stats.highest_rating, 8.0);
        assert_eq!(stats.lowest_rating, 4.0);
        assert_eq!(stats.average_popularity, 30.0);
        assert_eq!(stats.year_range.earliest_year, 1972);
        assert_eq!(stats.year_range.latest_year, 2001);
    }

    #[test]
    fn language_distribution_orders_by_count_then_first_appearance() {
        let movies = vec![
            movie(1, "ko", 2000, 1.0, 1.0),
            movie(2, "en", 2000, 1.0, 1.0),
            movie(3, "fr", 2000, 1.0, 1.0),
            movie(4, "en", 2000, 1.0, 1.0),
            movie(5, "fr", 2000, 1.0, 1.0),
            movie(6, "EN", 2000, 1.0, 1.0),
        ];
        let stats = summarize(&movies).expect("stats");
        let expected = [("en", 2), ("fr", 2), ("ko", 1), ("EN", 1)]
            .into_iter()
            .map(|(language, count)| LanguageCount {
                language: language.to_string(),
                count,
            })
            .collect::<Vec<_>>();
        assert_eq!(stats.language_distribution, expected);
    }

    #[test]
    fn serializes_with_nested_year_range() {
        let movies = vec![movie(1, "en", 1999, 2.0, 5.0)];
        let value = serde_json::to_value(summarize(&movies).expect("stats")).expect("json");
        assert_eq!(value["totalMovies"], 1);
        assert_eq!(value["languageDistribution"][0]["language"], "en");
        assert_eq!(value["languageDistribution"][0]["count"], 1);
        assert_eq!(value["yearRange"]["earliestYear"], 1999);
        assert_eq!(value["yearRange"]["latestYear"], 1999);
    }
}
