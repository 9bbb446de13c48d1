//! Language handles and alias resolution

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical language handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// English name
    pub name: &'static str,
    /// Canonical code (ISO 639-1 where one exists)
    pub code: &'static str,
    /// ISO 639-3 code
    pub iso3: &'static str,
    /// Other codes and names this language is known by
    pub aliases: &'static [&'static str],
}

const fn lang(
    name: &'static str,
    code: &'static str,
    iso3: &'static str,
    aliases: &'static [&'static str],
) -> Language {
    Language { name, code, iso3, aliases }
}

/// Known languages
const LANGUAGES: &[Language] = &[
    lang("Afrikaans", "af", "afr", &[]),
    lang("Albanian", "sq", "sqi", &[]),
    lang("Amharic", "am", "amh", &[]),
    lang("Arabic", "ar", "ara", &[]),
    lang("Armenian", "hy", "hye", &[]),
    lang("Azerbaijani", "az", "aze", &[]),
    lang("Bengali", "bn", "ben", &["bangla"]),
    lang("Bulgarian", "bg", "bul", &[]),
    lang("Catalan", "ca", "cat", &[]),
    lang("Chinese (Simplified)", "zh", "zho", &["zh-CN", "zh-Hans", "zh-CHS", "chinese"]),
    lang("Chinese (Traditional)", "zh-Hant", "zho-Hant", &["zh-TW", "zh-HK", "zh-CHT"]),
    lang("Croatian", "hr", "hrv", &[]),
    lang("Czech", "cs", "ces", &[]),
    lang("Danish", "da", "dan", &[]),
    lang("Dutch", "nl", "nld", &[]),
    lang("English", "en", "eng", &[]),
    lang("Estonian", "et", "est", &[]),
    lang("Filipino", "fil", "fil", &["tl", "tagalog"]),
    lang("Finnish", "fi", "fin", &[]),
    lang("French", "fr", "fra", &[]),
    lang("Georgian", "ka", "kat", &[]),
    lang("German", "de", "deu", &[]),
    lang("Greek", "el", "ell", &[]),
    lang("Gujarati", "gu", "guj", &[]),
    lang("Hebrew", "he", "heb", &["iw"]),
    lang("Hindi", "hi", "hin", &[]),
    lang("Hungarian", "hu", "hun", &[]),
    lang("Icelandic", "is", "isl", &[]),
    lang("Indonesian", "id", "ind", &["in"]),
    lang("Irish", "ga", "gle", &[]),
    lang("Italian", "it", "ita", &[]),
    lang("Japanese", "ja", "jpn", &[]),
    lang("Kazakh", "kk", "kaz", &[]),
    lang("Khmer", "km", "khm", &[]),
    lang("Korean", "ko", "kor", &[]),
    lang("Latin", "la", "lat", &[]),
    lang("Latvian", "lv", "lav", &[]),
    lang("Lithuanian", "lt", "lit", &[]),
    lang("Malay", "ms", "msa", &[]),
    lang("Mongolian", "mn", "mon", &["mn-Cyrl"]),
    lang("Nepali", "ne", "nep", &[]),
    lang("Norwegian", "no", "nor", &["nb", "nob", "norwegian bokmal"]),
    lang("Persian", "fa", "fas", &["farsi"]),
    lang("Polish", "pl", "pol", &[]),
    lang("Portuguese", "pt", "por", &["pt-BR"]),
    lang("Romanian", "ro", "ron", &[]),
    lang("Russian", "ru", "rus", &[]),
    lang("Serbian", "sr", "srp", &["sr-Cyrl"]),
    lang("Slovak", "sk", "slk", &[]),
    lang("Slovenian", "sl", "slv", &[]),
    lang("Spanish", "es", "spa", &[]),
    lang("Swahili", "sw", "swa", &[]),
    lang("Swedish", "sv", "swe", &[]),
    lang("Tamil", "ta", "tam", &[]),
    lang("Thai", "th", "tha", &[]),
    lang("Turkish", "tr", "tur", &[]),
    lang("Ukrainian", "uk", "ukr", &[]),
    lang("Urdu", "ur", "urd", &[]),
    lang("Uzbek", "uz", "uzb", &["uz-Latn"]),
    lang("Vietnamese", "vi", "vie", &[]),
    lang("Welsh", "cy", "cym", &[]),
];

impl Language {
    /// Resolve a code, ISO 639-3 code, English name or alias (case-insensitive)
    pub fn resolve(input: &str) -> Option<Language> {
        let needle = input.trim();
        if needle.is_empty() {
            return None;
        }

        LANGUAGES.iter().copied().find(|lang| lang.matches(needle))
    }

    /// All known languages
    pub fn all() -> &'static [Language] {
        LANGUAGES
    }

    fn matches(&self, needle: &str) -> bool {
        self.code.eq_ignore_ascii_case(needle)
            || self.iso3.eq_ignore_ascii_case(needle)
            || self.name.eq_ignore_ascii_case(needle)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Language::resolve(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown language: {}", code)))
    }
}
