//! Purpose: Bind query engine operations to named MCP tools.
//! Exports: `MovieTools`, `tool_catalog`, `not_found_message`, `NO_STATISTICS_MESSAGE`.
//! Role: The tool layer's catalog (names, descriptions, input schemas) and invoker.
//! Invariants: Tool names and argument names are stable once published.
//! Invariants: Empty matches are empty arrays; only id lookup and empty-store
//! statistics answer with a plain text sentinel.
//! Invariants: Bad arguments are tool execution errors; unknown tools are protocol errors.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::api::{DEFAULT_COUNT, QueryEngine};
use crate::mcp::{JsonRpcError, McpHandler, McpTool, ToolCallRequest, ToolCallResult};

pub const NO_STATISTICS_MESSAGE: &str = "No movies loaded; statistics are unavailable.";

pub fn not_found_message(id: i64) -> String {
    format!("Movie with ID {id} not found.")
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tool {
    AllMovies,
    SearchByTitle,
    ByYear,
    ByLanguage,
    TopRated,
    LowestRated,
    MostPopular,
    ById,
    ByRatingRange,
    Statistics,
}

const TOOLS: [Tool; 10] = [
    Tool::SearchByTitle,
    Tool::ByYear,
    Tool::ByLanguage,
    Tool::TopRated,
    Tool::LowestRated,
    Tool::MostPopular,
    Tool::ById,
    Tool::ByRatingRange,
    Tool::AllMovies,
    Tool::Statistics,
];

impl Tool {
    fn from_name(name: &str) -> Option<Self> {
        TOOLS.into_iter().find(|tool| tool.name() == name)
    }

    fn name(self) -> &'static str {
        match self {
            Tool::AllMovies => "get_all_movies",
            Tool::SearchByTitle => "search_movies_by_title",
            Tool::ByYear => "get_movies_by_year",
            Tool::ByLanguage => "get_movies_by_language",
            Tool::TopRated => "get_top_rated_movies",
            Tool::LowestRated => "get_lowest_rated_movies",
            Tool::MostPopular => "get_most_popular_movies",
            Tool::ById => "get_movie_by_id",
            Tool::ByRatingRange => "get_movies_by_rating_range",
            Tool::Statistics => "get_movie_statistics",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Tool::AllMovies => "Get all movies in the database.",
            Tool::SearchByTitle => {
                "Search for movies by title. Returns movies that contain the search term in their title."
            }
            Tool::ByYear => "Get movies released in a specific year.",
            Tool::ByLanguage => "Get movies in a specific language.",
            Tool::TopRated => "Get the top-rated movies ordered by vote average.",
            Tool::LowestRated => "Get the lowest-rated movies ordered by vote average.",
            Tool::MostPopular => "Get the most popular movies ordered by popularity score.",
            Tool::ById => "Get a specific movie by its ID.",
            Tool::ByRatingRange => "Get movies within a specific rating range.",
            Tool::Statistics => {
                "Get statistics about the movie database including total count, average rating, and language distribution."
            }
        }
    }

    fn input_schema(self) -> Value {
        let count = || {
            json!({
                "count": {
                    "type": "integer",
                    "description": "Number of movies to return (default: 10)",
                    "default": DEFAULT_COUNT,
                }
            })
        };
        let (properties, required): (Value, Vec<&str>) = match self {
            Tool::AllMovies | Tool::Statistics => (json!({}), Vec::new()),
            Tool::SearchByTitle => (
                json!({
                    "title": {
                        "type": "string",
                        "description": "Title or partial title to search for",
                    }
                }),
                vec!["title"],
            ),
            Tool::ByYear => (
                json!({
                    "year": {"type": "integer", "description": "Year to filter movies by"}
                }),
                vec!["year"],
            ),
            Tool::ByLanguage => (
                json!({
                    "language": {
                        "type": "string",
                        "description": "Language code (e.g., 'en', 'ja', 'hi')",
                    }
                }),
                vec!["language"],
            ),
            Tool::TopRated | Tool::LowestRated | Tool::MostPopular => (count(), Vec::new()),
            Tool::ById => (
                json!({
                    "id": {"type": "integer", "description": "Movie ID to retrieve"}
                }),
                vec!["id"],
            ),
            Tool::ByRatingRange => (
                json!({
                    "minRating": {"type": "number", "description": "Minimum rating (inclusive)"},
                    "maxRating": {"type": "number", "description": "Maximum rating (inclusive)"},
                }),
                vec!["minRating", "maxRating"],
            ),
        };
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

pub fn tool_catalog() -> Vec<McpTool> {
    TOOLS
        .into_iter()
        .map(|tool| McpTool {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        })
        .collect()
}

/// Tool invoker over a shared query engine.
#[derive(Clone, Debug)]
pub struct MovieTools {
    engine: QueryEngine,
}

impl MovieTools {
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn call(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolCallResult, JsonRpcError> {
        let tool = Tool::from_name(name).ok_or_else(|| {
            JsonRpcError::invalid_params(format!("unknown tool: {name}"))
                .with_data(json!({ "tool": name }))
        })?;
        match self.run(tool, &Args(arguments)) {
            Ok(result) => Ok(result),
            Err(ToolError::Argument(message)) => {
                tracing::debug!(tool = name, %message, "rejected tool arguments");
                Ok(ToolCallResult::execution_error_text(message))
            }
            Err(ToolError::Protocol(error)) => Err(error),
        }
    }

    fn run(&self, tool: Tool, args: &Args<'_>) -> Result<ToolCallResult, ToolError> {
        let engine = &self.engine;
        match tool {
            Tool::AllMovies => json_result(engine.all_movies()),
            Tool::SearchByTitle => json_result(engine.search_by_title(args.string("title")?)),
            Tool::ByYear => json_result(engine.by_year(args.integer("year")?)),
            Tool::ByLanguage => json_result(engine.by_language(args.string("language")?)),
            Tool::TopRated => json_result(engine.top_rated(args.count()?)),
            Tool::LowestRated => json_result(engine.lowest_rated(args.count()?)),
            Tool::MostPopular => json_result(engine.most_popular(args.count()?)),
            Tool::ById => {
                let id = args.integer("id")?;
                match engine.by_id(id) {
                    Some(movie) => json_result(movie),
                    None => Ok(ToolCallResult::text(not_found_message(id))),
                }
            }
            Tool::ByRatingRange => {
                let min_rating = args.number("minRating")?;
                let max_rating = args.number("maxRating")?;
                json_result(engine.by_rating_range(min_rating, max_rating))
            }
            Tool::Statistics => match engine.statistics() {
                Some(stats) => json_result(stats),
                None => Ok(ToolCallResult::text(NO_STATISTICS_MESSAGE)),
            },
        }
    }
}

impl McpHandler for MovieTools {
    fn list_tools(&mut self) -> Result<Vec<McpTool>, JsonRpcError> {
        Ok(tool_catalog())
    }

    fn call_tool(&mut self, request: ToolCallRequest) -> Result<ToolCallResult, JsonRpcError> {
        self.call(&request.name, &request.arguments)
    }
}

enum ToolError {
    Argument(String),
    Protocol(JsonRpcError),
}

fn json_result<T: Serialize>(value: T) -> Result<ToolCallResult, ToolError> {
    let value = serde_json::to_value(value).map_err(|_| {
        ToolError::Protocol(JsonRpcError::internal_error("failed to encode tool result"))
    })?;
    ToolCallResult::json(value).map_err(ToolError::Protocol)
}

struct Args<'a>(&'a Map<String, Value>);

impl<'a> Args<'a> {
    fn present(&self, name: &str) -> Option<&'a Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    fn required(&self, name: &str) -> Result<&'a Value, ToolError> {
        self.present(name)
            .ok_or_else(|| ToolError::Argument(format!("missing required argument `{name}`")))
    }

    fn string(&self, name: &str) -> Result<&'a str, ToolError> {
        self.required(name)?
            .as_str()
            .ok_or_else(|| mistyped(name, "a string"))
    }

    fn integer(&self, name: &str) -> Result<i64, ToolError> {
        self.required(name)?
            .as_i64()
            .ok_or_else(|| mistyped(name, "an integer"))
    }

    fn number(&self, name: &str) -> Result<f64, ToolError> {
        self.required(name)?
            .as_f64()
            .ok_or_else(|| mistyped(name, "a number"))
    }

    fn count(&self) -> Result<i64, ToolError> {
        match self.present("count") {
            None => Ok(DEFAULT_COUNT),
            Some(value) => value.as_i64().ok_or_else(|| mistyped("count", "an integer")),
        }
    }
}

fn mistyped(name: &str, expected: &str) -> ToolError {
    ToolError::Argument(format!("argument `{name}` must be {expected}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{MovieTools, NO_STATISTICS_MESSAGE, tool_catalog};
    use crate::api::{QueryEngine, RecordStore};
    use crate::mcp::{INVALID_PARAMS_CODE, McpHandler, ToolCallRequest, ToolCallResult};
    use serde_json::{Map, Value, json};

    const DATASET: &str = "\
id,original_language,overview,release_date,title,popularity,vote_average,vote_count
1,en,\"Two imprisoned men bond, over years\",1994-09-23,The Shawshank Redemption,90.5,9,26000
2,ja,A girl enters a spirit world,2001-07-20,Spirited Away,80.25,5,16000
3,EN,\"A mob family, in decline\",1972-03-14,The Godfather,120,7,19000
4,hi,x,1995-10-20,Broken Row,notanumber,8,10
";

    fn tools() -> MovieTools {
        let store = RecordStore::parse(DATASET);
        MovieTools::new(QueryEngine::new(Arc::new(store)))
    }

    fn call(tools: &MovieTools, name: &str, arguments: Value) -> ToolCallResult {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        tools.call(name, &arguments).expect("tool call")
    }

    fn text_json(result: &ToolCallResult) -> Value {
        assert!(!result.is_error, "unexpected error: {:?}", result.first_text());
        serde_json::from_str(result.first_text().expect("text")).expect("json text")
    }

    fn ids(value: &Value) -> Vec<i64> {
        value
            .as_array()
            .expect("array")
            .iter()
            .map(|movie| movie["id"].as_i64().expect("id"))
            .collect()
    }

    #[test]
    fn catalog_lists_every_operation_with_object_schemas() {
        let catalog = tool_catalog();
        let names: Vec<&str> = catalog.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "search_movies_by_title",
                "get_movies_by_year",
                "get_movies_by_language",
                "get_top_rated_movies",
                "get_lowest_rated_movies",
                "get_most_popular_movies",
                "get_movie_by_id",
                "get_movies_by_rating_range",
                "get_all_movies",
                "get_movie_statistics",
            ]
        );
        for tool in &catalog {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
        let range = catalog
            .iter()
            .find(|tool| tool.name == "get_movies_by_rating_range")
            .expect("range tool");
        assert_eq!(range.input_schema["required"], json!(["minRating", "maxRating"]));
        let top = catalog
            .iter()
            .find(|tool| tool.name == "get_top_rated_movies")
            .expect("top tool");
        assert_eq!(top.input_schema["properties"]["count"]["default"], 10);
    }

    #[test]
    fn all_movies_skips_malformed_rows() {
        let result = call(&tools(), "get_all_movies", json!({}));
        assert_eq!(ids(&text_json(&result)), vec![1, 2, 3]);
        assert_eq!(result.structured_content, None);
    }

    #[test]
    fn records_serialize_with_camel_case_fields() {
        let value = text_json(&call(&tools(), "get_movie_by_id", json!({"id": 3})));
        assert_eq!(value["title"], "The Godfather");
        assert_eq!(value["originalLanguage"], "EN");
        assert_eq!(value["overview"], "A mob family, in decline");
        assert_eq!(value["releaseDate"], "1972-03-14");
        assert_eq!(value["voteAverage"], 7.0);
        assert_eq!(value["voteCount"], 19000);
    }

    #[test]
    fn lookup_miss_is_plain_text_sentinel() {
        let result = call(&tools(), "get_movie_by_id", json!({"id": 999999}));
        assert!(!result.is_error);
        assert_eq!(result.first_text(), Some("Movie with ID 999999 not found."));
        assert_eq!(result.structured_content, None);
    }

    #[test]
    fn lookup_hit_is_structured() {
        let result = call(&tools(), "get_movie_by_id", json!({"id": 1}));
        let structured = result.structured_content.clone().expect("structured");
        assert_eq!(structured, text_json(&result));
    }

    #[test]
    fn filters_are_case_insensitive() {
        let tools = tools();
        let by_language = call(&tools, "get_movies_by_language", json!({"language": "en"}));
        assert_eq!(ids(&text_json(&by_language)), vec![1, 3]);
        let by_title = call(&tools, "search_movies_by_title", json!({"title": "THE"}));
        assert_eq!(ids(&text_json(&by_title)), vec![1, 3]);
        let by_year = call(&tools, "get_movies_by_year", json!({"year": 2001}));
        assert_eq!(ids(&text_json(&by_year)), vec![2]);
    }

    #[test]
    fn no_matches_is_an_empty_array() {
        let result = call(&tools(), "get_movies_by_year", json!({"year": 1800}));
        assert_eq!(text_json(&result), json!([]));
        assert_eq!(result.first_text(), Some("[]"));
    }

    #[test]
    fn ranked_tools_default_and_truncate() {
        let tools = tools();
        let top = call(&tools, "get_top_rated_movies", json!({}));
        assert_eq!(ids(&text_json(&top)), vec![1, 3, 2]);
        let top = call(&tools, "get_top_rated_movies", json!({"count": 2}));
        assert_eq!(ids(&text_json(&top)), vec![1, 3]);
        let lowest = call(&tools, "get_lowest_rated_movies", json!({"count": 1}));
        assert_eq!(ids(&text_json(&lowest)), vec![2]);
        let popular = call(&tools, "get_most_popular_movies", json!({"count": null}));
        assert_eq!(ids(&text_json(&popular)), vec![3, 1, 2]);
        let none = call(&tools, "get_most_popular_movies", json!({"count": -1}));
        assert_eq!(text_json(&none), json!([]));
    }

    #[test]
    fn rating_range_accepts_integers_and_floats() {
        let tools = tools();
        let exact = call(
            &tools,
            "get_movies_by_rating_range",
            json!({"minRating": 5, "maxRating": 5.0}),
        );
        assert_eq!(ids(&text_json(&exact)), vec![2]);
        let inverted = call(
            &tools,
            "get_movies_by_rating_range",
            json!({"minRating": 9, "maxRating": 1}),
        );
        assert_eq!(text_json(&inverted), json!([]));
    }

    #[test]
    fn statistics_are_computed_over_loaded_rows() {
        let result = call(&tools(), "get_movie_statistics", json!({}));
        let stats = text_json(&result);
        assert_eq!(stats["totalMovies"], 3);
        assert_eq!(stats["averageRating"], 7.0);
        assert_eq!(stats["highestRating"], 9.0);
        assert_eq!(stats["lowestRating"], 5.0);
        assert_eq!(stats["yearRange"], json!({"earliestYear": 1972, "latestYear": 2001}));
        assert_eq!(
            stats["languageDistribution"],
            json!([
                {"language": "en", "count": 1},
                {"language": "ja", "count": 1},
                {"language": "EN", "count": 1},
            ])
        );
        let structured = result.structured_content.expect("structured");
        assert_eq!(structured["totalMovies"], 3);
        assert_eq!(structured["yearRange"], stats["yearRange"]);
    }

    #[test]
    fn statistics_on_empty_store_is_text_sentinel() {
        let tools = MovieTools::new(QueryEngine::new(Arc::new(RecordStore::default())));
        let result = call(&tools, "get_movie_statistics", json!({}));
        assert!(!result.is_error);
        assert_eq!(result.first_text(), Some(NO_STATISTICS_MESSAGE));
    }

    #[test]
    fn bad_arguments_are_execution_errors() {
        let tools = tools();
        for (name, arguments, message) in [
            ("get_movie_by_id", json!({}), "missing required argument `id`"),
            ("get_movie_by_id", json!({"id": "1"}), "argument `id` must be an integer"),
            ("get_movies_by_year", json!({"year": 1994.5}), "argument `year` must be an integer"),
            ("search_movies_by_title", json!({"title": 7}), "argument `title` must be a string"),
            ("get_top_rated_movies", json!({"count": "3"}), "argument `count` must be an integer"),
            (
                "get_movies_by_rating_range",
                json!({"minRating": 1}),
                "missing required argument `maxRating`",
            ),
        ] {
            let result = call(&tools, name, arguments);
            assert!(result.is_error, "{name}");
            assert_eq!(result.first_text(), Some(message));
        }
    }

    #[test]
    fn unknown_tool_is_protocol_error() {
        let mut tools = tools();
        let err = tools
            .call_tool(ToolCallRequest {
                name: "drop_all_movies".to_string(),
                arguments: Map::new(),
            })
            .expect_err("unknown");
        assert_eq!(err.code, INVALID_PARAMS_CODE);
        assert_eq!(err.data, Some(json!({"tool": "drop_all_movies"})));
    }

    #[test]
    fn handler_lists_the_catalog() {
        let mut tools = tools();
        assert_eq!(tools.list_tools().expect("tools"), tool_catalog());
        assert_eq!(tools.engine().store().len(), 3);
    }
}
