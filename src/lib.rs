//! SqlTool library crate
//!
//! An SQL script interpreter and interactive client. The library provides:
//!
//! - A line-oriented lexer splitting scripts into SQL statements and
//!   `\` special, `*` procedural, `:` buffer, `/` macro and raw commands
//! - User variables with `${name}` expansion, `*if`/`*while`/`*foreach`
//!   blocks and `*break`/`*continue`
//! - An edit buffer and bounded command history with substitution
//! - SQL execution against a `Connection`, with text or HTML result tables
//! - Catalog listing and table description commands
//! - Delimiter-separated import with reject reports and export
//!
//! SQLite is the bundled connection implementation; anything implementing
//! `connection::Connection` can be driven by `sqlfile::SqlFile`.

pub mod block;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dsv;
pub mod error;
pub mod expr;
pub mod history;
pub mod lexer;
pub mod line_source;
pub mod logging;
pub mod messages;
pub mod metadata;
pub mod render;
pub mod session;
pub mod shell;
pub mod sqlfile;
pub mod sqlite;
pub mod statement;
pub mod token;
pub mod value;
pub mod variables;
