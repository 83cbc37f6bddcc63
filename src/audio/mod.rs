//! Audio output

pub mod engine;

pub use engine::SoundEngine;
