//! Managed regions: delimited blocks of generated text the engine may rewrite.
//!
//! A region opens on a line containing [`START_TOKEN`] (optionally tagged
//! with `id:<name>`) and closes on the next line containing [`END_TOKEN`].
//! Everything outside a region belongs to the developer and is never touched.

pub mod errors;
pub mod indexer;
pub mod markers;
pub mod patcher;

pub use errors::RegionError;
pub use indexer::{scan, ManagedRegion, RegionIndex, Segment};
pub use markers::{render_region, CommentStyle, END_TOKEN, START_TOKEN};
pub use patcher::{update_regions, RegionUpdate};
