//! Audit Domain
//!
//! Runs pluggable audit rules against cloud accounts and tracks every run as
//! a result that is written pending before the rule executes and completed
//! once it returns.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ AuditService │  ← run_by_id / run_by_category / run_all, result queries
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐     ┌───────────────────────┐
//! │ RuleRegistry │────►│ AuditRule (built-ins)  │ ← provider clients
//! └──────┬───────┘     └───────────────────────┘
//!        │
//! ┌──────▼───────┐
//! │ ResultStore  │  ← in-memory + PostgreSQL
//! └──────────────┘
//! ```
//!
//! Result lifecycle per rule: `CREATE_PENDING → EXECUTE → COMPLETE`. A failed
//! execution leaves the result pending.

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod registry;
pub mod repository;
pub mod rule;
pub mod rules;
pub mod service;

pub use error::{AuditEntity, AuditError, Result};
pub use models::{AuditResult, Item, ResultData};
pub use postgres::PgResultStore;
pub use registry::RuleRegistry;
pub use repository::{InMemoryResultStore, ResultStore};
pub use rule::AuditRule;
pub use rules::{builtin_rules, SqlInstancePeak};
pub use service::AuditService;
