//! Subtitle file formats for subfit.

pub mod decode;
pub mod srt;
pub mod traits;

pub use decode::decode_text;
pub use srt::SrtFormat;
pub use traits::SubtitleFormat;
