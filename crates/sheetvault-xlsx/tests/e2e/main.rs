//! End-to-end tests for sheetvault-xlsx.
//!
//! Each test synthesizes the exact package it needs with `zip::ZipWriter`,
//! then reads it back with `XlsxReader` and asserts on the extraction.

mod common;

pub use common::*;
