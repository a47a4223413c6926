//! PDF Toolkit Server Library
//!
//! This crate exposes the server's building blocks for the binary, the
//! benchmarks and tests. The main server binary is in main.rs.
//!
//! # Modules
//!
//! - `pdf`: MuPDF-backed parsing, splitting, rendering and redaction
//! - `layout`: heuristic layout inference (rows, titles, fields, tables, checkboxes)
//! - `extract`: per-endpoint extraction pipelines
//! - `routes`: HTTP handlers and the router

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod mupdf;
pub mod pdf;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testutil;
