//! Language support table
//!
//! Static mappings from language tags to display names, remote service
//! language codes and the canned phrases used by the diagnostic sweep.
//! Lookups are exact first, then fall back to the primary subtag.

/// One supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    /// BCP 47 style tag, e.g. "zh-TW"
    pub tag: &'static str,
    /// Human readable name shown to the user
    pub display_name: &'static str,
    /// Language code understood by the remote speech service
    pub remote_code: &'static str,
    /// Short phrase used to probe the remote service
    pub probe_phrase: &'static str,
}

/// Phrase used when a language has no dedicated probe phrase.
pub const DEFAULT_PROBE_PHRASE: &str = "Test";

/// All supported languages, in sweep order.
pub const SUPPORTED_LANGUAGES: [LanguageEntry; 10] = [
    LanguageEntry {
        tag: "zh-TW",
        display_name: "繁體中文（台灣）",
        remote_code: "zh-TW",
        probe_phrase: "繁體中文測試",
    },
    LanguageEntry {
        tag: "zh-CN",
        display_name: "簡體中文（中國）",
        remote_code: "zh-CN",
        probe_phrase: "简体中文测试",
    },
    // Hong Kong uses the Taiwan voice on the remote service.
    LanguageEntry {
        tag: "zh-HK",
        display_name: "繁體中文（香港）",
        remote_code: "zh-TW",
        probe_phrase: "繁體中文測試",
    },
    LanguageEntry {
        tag: "en-US",
        display_name: "English (US)",
        remote_code: "en",
        probe_phrase: "English test",
    },
    LanguageEntry {
        tag: "en-GB",
        display_name: "English (UK)",
        remote_code: "en",
        probe_phrase: DEFAULT_PROBE_PHRASE,
    },
    LanguageEntry {
        tag: "ja-JP",
        display_name: "日本語",
        remote_code: "ja",
        probe_phrase: "日本語テスト",
    },
    LanguageEntry {
        tag: "ko-KR",
        display_name: "한국어",
        remote_code: "ko",
        probe_phrase: "한국어 테스트",
    },
    LanguageEntry {
        tag: "fr-FR",
        display_name: "Français",
        remote_code: "fr",
        probe_phrase: DEFAULT_PROBE_PHRASE,
    },
    LanguageEntry {
        tag: "de-DE",
        display_name: "Deutsch",
        remote_code: "de",
        probe_phrase: DEFAULT_PROBE_PHRASE,
    },
    LanguageEntry {
        tag: "es-ES",
        display_name: "Español",
        remote_code: "es",
        probe_phrase: DEFAULT_PROBE_PHRASE,
    },
];

/// Primary subtag of a language tag ("en-US" -> "en", "pt_BR" -> "pt").
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Exact tag comparison, case-insensitive and tolerant of `_` separators.
pub fn tags_equal(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| normalize_char(x) == normalize_char(y))
}

/// Same primary subtag, case-insensitive.
pub fn same_primary(a: &str, b: &str) -> bool {
    let (pa, pb) = (primary_subtag(a), primary_subtag(b));
    !pa.is_empty() && pa.eq_ignore_ascii_case(pb)
}

fn normalize_char(c: char) -> char {
    if c == '_' {
        '-'
    } else {
        c.to_ascii_lowercase()
    }
}

/// Look up a table entry by exact tag.
pub fn lookup(tag: &str) -> Option<&'static LanguageEntry> {
    SUPPORTED_LANGUAGES.iter().find(|e| tags_equal(e.tag, tag))
}

/// Display name for a tag, or the tag itself when unknown.
pub fn display_name(tag: &str) -> &str {
    lookup(tag).map(|e| e.display_name).unwrap_or(tag)
}

/// Remote service language code: exact table entry, else the primary subtag.
pub fn remote_code(tag: &str) -> String {
    match lookup(tag) {
        Some(entry) => entry.remote_code.to_string(),
        None => primary_subtag(tag).to_string(),
    }
}
