//! Domain logic - pure rules for versions, tags, step modes and pipeline status

pub mod mode;
pub mod prerelease;
pub mod release;
pub mod status;
pub mod tag;
pub mod version;

pub use mode::{ExecutionMode, ModeResolver, ModeSource};
pub use prerelease::{PreRelease, PreReleaseLabel};
pub use release::ReleaseType;
pub use status::{JobResult, JobResults, PipelineStatus};
pub use tag::{RollbackTag, StabilityTag, TagPattern};
pub use version::Version;
