//! Language capability checks against a voice catalog
//!
//! A voice matches a requested tag when the tags are equal or share the
//! same primary subtag. An "en-GB"-only catalog therefore supports "en-US":
//! availability wins over accent precision.

use super::VoiceDescriptor;
use crate::languages::{same_primary, tags_equal};

fn matches(voice: &VoiceDescriptor, lang: &str) -> bool {
    tags_equal(&voice.lang, lang) || same_primary(&voice.lang, lang)
}

/// True iff some voice in `voices` can speak `lang`.
pub fn is_supported(voices: &[VoiceDescriptor], lang: &str) -> bool {
    !voices.is_empty() && voices.iter().any(|v| matches(v, lang))
}

/// First voice (in platform order) that can speak `lang`.
pub fn pick_voice<'a>(voices: &'a [VoiceDescriptor], lang: &str) -> Option<&'a VoiceDescriptor> {
    voices.iter().find(|v| matches(v, lang))
}
