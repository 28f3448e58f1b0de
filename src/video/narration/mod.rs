//! Narration text: where it comes from and how it is cut into clips.

mod preprocess;
pub mod resolve;
mod scene_key;
mod split;

pub use preprocess::Preprocessor;
pub use resolve::{SegmentTexts, resolve_segment_texts};
