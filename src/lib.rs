//! Purpose: Library crate backing the `cinedex` CLI and MCP server.
//! Exports: `api` (records, store, queries, errors), `mcp` (protocol core),
//! `movie_tools` (tool catalog bound to the query engine).
//! Role: Loads a movie dataset once and answers read-only queries over it.
//! Invariants: Stores are built explicitly and injected; there is no global state.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
mod core;

pub mod api;
pub mod mcp;
pub mod movie_tools;
