//! Core library for the `imgbench` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration parsing, URL templates, bounded-concurrency request
//! dispatch, and streaming aggregation of latency and throughput samples.
//! The primary user-facing interface is the `imgbench` command-line
//! application; library APIs may evolve as the CLI grows.
pub mod app;
pub mod args;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod shutdown;
