//! Profile fetching, caching and background loading for native hosts.

pub mod cache;
pub mod manager;
pub mod source;

pub use cache::CachedSource;
pub use manager::{LoadOutcome, LoadedProfile, ProfileManager};
pub use source::{ByteSource, DirSource, HttpSource, PROFILE_DIR};
