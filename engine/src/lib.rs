//! `repohealth_engine` — the Health Orchestration Engine.
//!
//! A multi-repository operations tool's core subsystem: discovers and
//! filters repositories, composes a graph of checkers and language
//! analyzers from a layered configuration, executes them with bounded
//! concurrency and timeouts, aggregates per-repository scores and
//! statuses, and renders a structured report with a process exit code.
//!
//! The `clone`/`rm`/`run`/`pr`/`init` commands, YAML inventory loading,
//! and colorized terminal printing are thin external collaborators (see
//! [`collaborators`]) around this engine, not part of it.

pub mod analyzer_registry;
pub mod analyzers;
pub mod checker_registry;
pub mod checkers;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod platform;
pub mod reporter;
pub mod types;
