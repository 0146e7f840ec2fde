//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different PDF engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preprocess ──▶ markdown ──▶ compose ──▶ engine
//! (path/URL)  (normalise)   (+highlight)  (+stylesheet) (Chromium)
//! ```
//!
//! 1. [`input`]     : read a path, URL or stdin into UTF-8 text
//! 2. [`preprocess`]: deterministic cleanup; optionally lift the front-matter title
//! 3. [`markdown`]  : parse with tables, footnotes, definition lists and
//!    fenced code; code goes through [`highlight`]
//! 4. [`stylesheet`]: CSS from a [`crate::style::StyleConfig`]
//! 5. [`compose`]   : fragment + stylesheet → standalone HTML document
//! 6. [`engine`]    : HTML → PDF; blocking, so async callers use
//!    `spawn_blocking`

pub mod compose;
pub mod engine;
pub mod highlight;
pub mod input;
pub mod markdown;
pub mod preprocess;
pub mod stylesheet;
