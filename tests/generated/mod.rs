// Code generated by rustf-querygen. DO NOT EDIT.
// versions:
//   rustf-querygen v0.1.0
//
// Package `db`, engine sqlite.

pub mod models;
pub mod authors;

pub use models::*;
pub use authors::*;

pub use rustf_querygen::runtime::{
    with_tx, BatchResults, Error, ExecResult, QueryExecutor, Result, Transaction,
};
