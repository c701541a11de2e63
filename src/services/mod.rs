/// Shared reactive building blocks
pub mod common;
/// Lyric lines from an external helper
pub mod lyric;
/// MPRIS player tracking and active player selection
pub mod mpris;

pub use lyric::{Lyric, LyricRouter, LyricService};
pub use mpris::MprisService;
