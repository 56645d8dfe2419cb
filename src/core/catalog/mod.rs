pub mod cached;
pub mod github;
pub mod release;

pub use cached::CachedReleaseCatalog;
pub use github::GithubReleaseSource;
pub use release::{find_release, normalize, Release, ReleaseCatalog, ReleaseSource};
