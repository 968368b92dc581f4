//! Purpose: Run the MCP server over stdio transport.
//! Exports: `serve`.
//! Role: Bridge newline-delimited JSON-RPC lines to the shared MCP dispatcher.
//! Invariants: The output stream only carries JSON-RPC messages (one JSON value per line).
//! Invariants: Input EOF exits cleanly; blank lines are ignored.
//! Invariants: Parse/protocol errors are surfaced as JSON-RPC error responses.

use std::io::{self, BufRead, Write};

use cinedex::api::{Error, ErrorKind};
use cinedex::mcp::{
    DispatchOutcome, JsonRpcError, JsonRpcId, JsonRpcResponse, McpDispatcher, McpHandler,
    parse_jsonrpc_line,
};
use cinedex::movie_tools::MovieTools;

pub(super) fn serve(tools: MovieTools) -> Result<(), Error> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    tracing::info!(records = tools.engine().store().len(), "mcp server listening on stdio");
    serve_lines(stdin.lock(), stdout.lock(), McpDispatcher::new(tools))?;
    tracing::info!("mcp server stopped (stdin closed)");
    Ok(())
}

fn serve_lines<R, W, H>(
    mut reader: R,
    mut writer: W,
    mut dispatcher: McpDispatcher<H>,
) -> Result<(), Error>
where
    R: BufRead,
    W: Write,
    H: McpHandler,
{
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read MCP request")
                .with_source(err)
        })?;
        if read == 0 {
            return writer.flush().map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to flush MCP output")
                    .with_source(err)
            });
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let response = match parse_jsonrpc_line(message) {
            Ok(request) => match dispatcher.dispatch_value(request) {
                DispatchOutcome::Response(response) => response,
                DispatchOutcome::NoResponse => continue,
            },
            Err(error) => parse_failure(error),
        };
        write_json_line(&mut writer, &response)?;
    }
}

fn parse_failure(error: JsonRpcError) -> JsonRpcResponse {
    tracing::debug!(error = %error.message, "unparsable MCP line");
    JsonRpcResponse::failure(JsonRpcId::Null, error)
}

fn write_json_line<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), Error> {
    serde_json::to_writer(&mut *writer, response).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode MCP message")
            .with_source(err)
    })?;
    writer.write_all(b"\n").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write MCP message")
            .with_source(err)
    })?;
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush MCP message")
            .with_source(err)
    })
}
