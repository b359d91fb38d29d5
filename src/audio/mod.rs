//! Audio formats and streams for feeding recognition from memory.

mod format;
mod stream;

pub use format::{AudioFormat, BitRate, Channels, SampleRate};
pub use stream::PushStream;
