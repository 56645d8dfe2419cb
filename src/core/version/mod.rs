pub mod descriptor;
pub mod profile;
pub mod resolver;

pub use descriptor::{resolve_release, ResolvedRelease, VersionDescriptor, VersionResolver};
pub use profile::VersionProfile;
pub use resolver::ProfileVersionResolver;
