//! Accumulation over server-paginated collections.
//!
//! - [`PageCursor`] / [`NextPageRequest`] - the cursor capability a remote
//!   client exposes for one page and its continuation
//! - [`collect_pages`] - bounded accumulation across pages
//! - [`collect_matching`] - accumulation keeping only selected items
//! - [`InMemoryPages`] - cursor over pages already held in memory

pub mod accumulator;
pub mod cursor;
pub mod memory;

pub use accumulator::{collect_matching, collect_pages};
pub use cursor::{MaxRows, NextPageRequest, PageCursor};
pub use memory::{InMemoryNextPage, InMemoryPages};
