//! File and directory reading collaborator.
//!
//! Produces immutable [`DocumentRecord`]s with filesystem provenance. The
//! directory reader owns all eligibility filtering (size limit, hidden-file
//! exclusion, extension allow-list); callers just consume the records.

mod dir;
mod file;

pub use dir::DirReader;
pub use file::FileReader;
