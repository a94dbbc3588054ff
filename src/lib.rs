//! # docdex
//!
//! A local full-text index and search tool for PDF folder trees.
//!
//! docdex maintains an incremental SQLite index of the text content of every
//! PDF under a configured folder and answers substring queries against it:
//! fuzzy multi-keyword (AND), keyword alternatives (OR), and exact-phrase
//! search, each with a context snippet per hit. Indexing is idempotent and
//! runs in the background while existing entries stay searchable.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────────┐   ┌──────────────┐
//! │  Indexer   │──▶│ Extract +     │──▶│    SQLite    │
//! │ (walkdir)  │   │ Normalize     │   │  documents   │
//! └─────┬──────┘   └───────────────┘   └──────┬───────┘
//!       │ progress                            │
//!       ▼                                     ▼
//! ┌────────────┐                     ┌──────────────┐
//! │ IndexRun   │                     │ SearchEngine │◀── Result cache
//! │ (poll/wait)│                     │ AND/OR/exact │
//! └────────────┘                     └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`normalize`] | Text canonicalization |
//! | [`store`] | Persistent document store and predicate AST |
//! | [`indexer`] | Incremental index builder |
//! | [`progress`] | Indexing progress observation |
//! | [`query`] | Query parsing, execution, snippets |
//! | [`cache`] | Short-TTL result memoization |
//! | [`extract`] | PDF text extraction collaborator |

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod query;
pub mod store;
