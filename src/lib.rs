//! # WakeUp
//!
//! A small service that accepts PDF uploads, deduplicates them by content
//! hash, and stores the extracted text of every page. It also ships thin
//! clients for hosted language-model APIs and a daily delivery scheduler.
//!
//! ## Architecture
//!
//! ```text
//! POST /upload ─▶ validate ─▶ save ─▶ hash ─▶ dedupe ─▶ extract ─▶ persist
//!                                       │                            │
//!                                       ▼                            ▼
//!                              <storage>/<sha256>/          page_<n>.txt
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | JSON configuration parsing |
//! | [`hashing`] | SHA-256 content hashing |
//! | [`storage`] | Hash-keyed page storage |
//! | [`extract`] | Per-page PDF text extraction |
//! | [`upload`] | Upload pipeline |
//! | [`server`] | HTTP upload server |
//! | [`gateway`] | Hosted model API clients |
//! | [`scheduler`] | Daily job scheduler |
//! | [`plan`] | Page batching for reading plans |

pub mod config;
pub mod extract;
pub mod gateway;
pub mod hashing;
pub mod plan;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod upload;
