//! gridbench-cli: load a labelled table, run a configured grid search and
//! write the resulting table.
pub mod grid;
pub mod util;
