//! Purpose: `cinedex` CLI entry point.
//! Role: Binary crate root; parses args, loads the dataset, runs commands.
//! Invariants: The dataset is loaded once, before any query is answered.
//! Invariants: A missing dataset aborts with a non-zero exit before serving.
//! Invariants: Errors are emitted on stderr (JSON when stderr is not a terminal).
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod data_paths;
mod mcp_stdio;

use cinedex::api::{Error, ErrorKind, QueryEngine, RecordStore, to_exit_code};
use cinedex::movie_tools::{MovieTools, tool_catalog};
use data_paths::resolve_data_path;

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(());
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `cinedex --help`."));
            }
        },
    };

    init_tracing();

    match cli.command {
        Command::Mcp => mcp_stdio::serve(load_tools(cli.data)?),
        Command::Tools => {
            let tools = serde_json::to_value(tool_catalog()).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode tool catalog")
                    .with_source(err)
            })?;
            emit_json(&json!({ "tools": tools }))
        }
        Command::Call { tool, arguments } => {
            let arguments = parse_arguments(arguments.as_deref())?;
            let tools = load_tools(cli.data)?;
            call_tool(&tools, &tool, &arguments)
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "cinedex", &mut io::stdout());
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(
    name = "cinedex",
    version,
    about = "Read-only movie dataset queries, served as MCP tools",
    long_about = None,
    after_help = r#"EXAMPLES
  $ cinedex mcp                                    # serve MCP over stdio
  $ cinedex tools                                  # list tools and input schemas
  $ cinedex call get_top_rated_movies '{"count": 3}'
  $ cinedex --data ./movies.csv call get_movie_by_id '{"id": 238}'

NOTES
  - Dataset: --data, then $CINEDEX_DATA, then data/tmdb_top_rated_movies.csv next to the binary
  - Logs go to stderr; filter with RUST_LOG (e.g. RUST_LOG=debug)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Movie dataset CSV file",
        value_hint = ValueHint::FilePath
    )]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Serve the movie tools over MCP (JSON-RPC on stdin/stdout)")]
    Mcp,
    #[command(about = "Print the tool catalog as JSON")]
    Tools,
    #[command(
        arg_required_else_help = true,
        about = "Run one tool against the dataset and print its result"
    )]
    Call {
        #[arg(help = "Tool name (see `cinedex tools`)")]
        tool: String,
        #[arg(help = "Tool arguments as a JSON object")]
        arguments: Option<String>,
    },
    #[command(arg_required_else_help = true, about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// stdout is reserved for protocol and command output.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn load_tools(data: Option<PathBuf>) -> Result<MovieTools, Error> {
    let path = resolve_data_path(data);
    let store = RecordStore::load(&path)?;
    Ok(MovieTools::new(QueryEngine::new(Arc::new(store))))
}

fn parse_arguments(raw: Option<&str>) -> Result<Map<String, Value>, Error> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(Error::new(ErrorKind::Usage)
            .with_message("tool arguments must be a JSON object")
            .with_hint(r#"Example: cinedex call get_top_rated_movies '{"count": 3}'"#)),
        Err(err) => Err(Error::new(ErrorKind::Usage)
            .with_message("tool arguments are not valid JSON")
            .with_source(err)),
    }
}

fn call_tool(tools: &MovieTools, name: &str, arguments: &Map<String, Value>) -> Result<(), Error> {
    let result = tools.call(name, arguments).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(err.message)
            .with_hint("Run `cinedex tools` to list tool names.")
    })?;
    let text = result.first_text().unwrap_or_default();
    if result.is_error {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(text)
            .with_hint(format!("Run `cinedex tools` to see the arguments `{name}` takes.")));
    }
    println!("{text}");
    Ok(())
}

fn emit_json(value: &Value) -> Result<(), Error> {
    let text = serde_json::to_string_pretty(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })?;
    println!("{text}");
    Ok(())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }
    json!({ "error": Value::Object(inner) })
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}
