//! Phone recommender: free-text phone search over a fixed catalog.
//!
//! The user's preference (English or Hindi) and the whole catalog go to a
//! language model in one prompt. The model ranks and justifies; this crate
//! builds the prompt, makes the single call, and validates the reply down to
//! at most five known products with non-empty reasons.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod display;
pub mod logging;
pub mod prompt;
pub mod providers;
pub mod recommend;
