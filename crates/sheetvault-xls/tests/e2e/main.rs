//! End-to-end tests for the XLS adapter over synthesized BIFF8 workbooks.

mod common;

pub use common::*;
