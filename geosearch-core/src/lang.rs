//! Lightweight language detection for result statistics.
//!
//! [`LanguageDetector`] is a seam: the router only needs *some* language
//! code per result. [`ScriptDetector`] is the built-in heuristic. It
//! classifies non-Latin text by Unicode script and Latin text by a small
//! stop-word vote, and answers [`UNDETERMINED`] when neither is decisive.

/// Code returned when no language can be determined.
pub const UNDETERMINED: &str = "und";

/// Maps a piece of text to a language code.
pub trait LanguageDetector: Send + Sync {
    /// Best-guess language code for `text`, or [`UNDETERMINED`].
    fn detect(&self, text: &str) -> String;
}

/// Stop words per Latin-script language, checked in this order.
const STOP_WORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &["the", "and", "of", "to", "is", "in", "for", "with", "that", "on", "are", "this"],
    ),
    (
        "fr",
        &["le", "la", "les", "des", "est", "et", "une", "pour", "dans", "du", "sur", "avec"],
    ),
    (
        "de",
        &["der", "die", "das", "und", "ist", "nicht", "mit", "ein", "eine", "für", "auf", "den"],
    ),
    (
        "es",
        &["el", "los", "las", "del", "que", "por", "una", "para", "con", "es", "y", "como"],
    ),
    (
        "it",
        &["il", "di", "che", "non", "della", "per", "sono", "gli", "una", "con", "nel", "è"],
    ),
    (
        "pt",
        &["o", "os", "do", "da", "não", "em", "uma", "para", "com", "que", "dos", "são"],
    ),
    (
        "nl",
        &["de", "het", "een", "van", "en", "niet", "op", "voor", "met", "zijn", "dat", "ook"],
    ),
];

/// Script- and stop-word-based detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDetector;

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> String {
        detect_script(text)
            .or_else(|| detect_latin(text))
            .unwrap_or(UNDETERMINED)
            .to_owned()
    }
}

fn script_of(c: char) -> Option<&'static str> {
    match u32::from(c) {
        0x0370..=0x03FF => Some("el"),
        0x0400..=0x04FF => Some("ru"),
        0x0590..=0x05FF => Some("he"),
        0x0600..=0x06FF => Some("ar"),
        0x0900..=0x097F => Some("hi"),
        0x0E00..=0x0E7F => Some("th"),
        0x1100..=0x11FF | 0xAC00..=0xD7AF => Some("ko"),
        0x3040..=0x30FF => Some("ja"),
        0x4E00..=0x9FFF => Some("zh"),
        _ => None,
    }
}

/// Dominant non-Latin script, if it outweighs Latin letters.
fn detect_script(text: &str) -> Option<&'static str> {
    let mut latin = 0usize;
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        match script_of(c) {
            Some(lang) => match counts.iter_mut().find(|(l, _)| *l == lang) {
                Some((_, n)) => *n += 1,
                None => counts.push((lang, 1)),
            },
            None => latin += 1,
        }
    }

    // Kanji inside kana text is Japanese.
    if let Some(zh) = counts.iter().position(|(l, _)| *l == "zh") {
        if counts.iter().any(|(l, _)| *l == "ja") {
            let (_, n) = counts.remove(zh);
            if let Some((_, ja)) = counts.iter_mut().find(|(l, _)| *l == "ja") {
                *ja += n;
            }
        }
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .filter(|(_, n)| *n > latin)
        .map(|(lang, _)| lang)
}

/// Stop-word vote over lowercase words; ties are undetermined.
fn detect_latin(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    let mut best: Option<(&'static str, usize)> = None;
    let mut tied = false;
    for (lang, stops) in STOP_WORDS {
        let hits = words.iter().filter(|w| stops.contains(*w)).count();
        if hits == 0 {
            continue;
        }
        match best {
            Some((_, top)) if hits < top => {}
            Some((_, top)) if hits == top => tied = true,
            _ => {
                best = Some((*lang, hits));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best.map(|(lang, _)| lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> String {
        ScriptDetector.detect(text)
    }

    #[test]
    fn detects_latin_languages_by_stop_words() {
        assert_eq!(detect("The history of the Roman empire and its fall"), "en");
        assert_eq!(detect("Les meilleures recettes pour la cuisine du soir"), "fr");
        assert_eq!(detect("Die Geschichte der Stadt und ist nicht klein"), "de");
    }

    #[test]
    fn detects_non_latin_scripts() {
        assert_eq!(detect("Новости дня"), "ru");
        assert_eq!(detect("東京の天気予報"), "ja");
        assert_eq!(detect("北京天气"), "zh");
        assert_eq!(detect("서울 날씨"), "ko");
        assert_eq!(detect("Καιρός σήμερα"), "el");
    }

    #[test]
    fn latin_majority_beats_stray_script() {
        assert_eq!(detect("The word Москва is in the title of this page"), "en");
    }

    #[test]
    fn undetermined_without_evidence() {
        assert_eq!(detect(""), UNDETERMINED);
        assert_eq!(detect("12345 !!!"), UNDETERMINED);
        assert_eq!(detect("Xylophone Zebra"), UNDETERMINED);
    }

    #[test]
    fn ties_are_undetermined() {
        assert_eq!(detect("con het"), UNDETERMINED);
    }
}
