//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order.

/// `ffmpeg`-based sink (MP4/GIF output via the system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
