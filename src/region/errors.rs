use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("region id '{id}' appears {count} times, expected exactly 1")]
    AmbiguousId { id: String, count: usize },

    #[error("invalid region id '{id}': ids may only contain [A-Za-z0-9_.-]")]
    InvalidId { id: String },

    #[error("region edit failed: {0}")]
    Edit(#[from] crate::edit::EditError),
}
