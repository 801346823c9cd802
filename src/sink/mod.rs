pub mod image;
pub mod snapshot;

pub use image::ImageSink;
pub use snapshot::SnapshotSink;
