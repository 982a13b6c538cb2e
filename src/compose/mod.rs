pub mod document;
pub mod volume;

pub use document::{apply_volume_mount, ComposeDocument, MountOutcome};
pub use volume::VolumeMount;
