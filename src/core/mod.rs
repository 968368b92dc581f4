// Core modules implementing parsing, the record store, queries, and errors.
pub mod csv;
pub mod error;
pub mod movie;
pub mod query;
pub mod stats;
pub mod store;
