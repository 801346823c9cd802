pub mod adapter;
pub mod image;

pub use adapter::{FillResult, PullAdapter};
pub use image::ImageSource;
