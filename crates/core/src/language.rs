use crate::models::Language;

/// Indic languages in detection priority order.
const DETECTION_ORDER: [Language; 4] = [Language::Hi, Language::Te, Language::Kn, Language::Ta];

fn script_range(lang: Language) -> Option<(u32, u32)> {
    match lang {
        Language::Hi => Some((0x0900, 0x097F)),
        Language::Te => Some((0x0C00, 0x0C7F)),
        Language::Kn => Some((0x0C80, 0x0CFF)),
        Language::Ta => Some((0x0B80, 0x0BFF)),
        Language::En => None,
    }
}

fn hint_words(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Hi => &[
            "namaste",
            "bukhar",
            "khansi",
            "swasthya",
            "नमस्ते",
            "खांसी",
            "बुखार",
            "टीका",
            "टीकाकरण",
            "स्वास्थ्य",
        ],
        Language::Te => &[
            "namaskaram",
            "jwaram",
            "daggu",
            "arogyam",
            "నమస్తే",
            "జ్వరం",
            "దగ్గు",
            "టీకా",
            "ఆరోగ్యం",
        ],
        Language::Kn => &[
            "namaskara",
            "kemmu",
            "lasike",
            "ನಮಸ್ಕಾರ",
            "ಜ್ವರ",
            "ಕೆಮ್ಮು",
            "ಲಸಿಕೆ",
            "ಆರೋಗ್ಯ",
        ],
        Language::Ta => &[
            "vanakkam",
            "kaichal",
            "irumal",
            "thaduppoosi",
            "வணக்கம்",
            "காய்ச்சல்",
            "இருமல்",
            "தடுப்பூசி",
            "ஆரோக்கியம்",
        ],
        Language::En => &[],
    }
}

/// Maps free text to a supported language.
///
/// Native script wins over everything else: a single character from a
/// script block is enough, checked in hi, te, kn, ta order. Romanized hint
/// words are only consulted when no script character is present. Anything
/// else, including empty input, is English.
pub fn detect_language(text: &str) -> Language {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return Language::En;
    }

    for lang in DETECTION_ORDER {
        if let Some((start, end)) = script_range(lang) {
            if lower
                .chars()
                .any(|ch| (start..=end).contains(&(ch as u32)))
            {
                return lang;
            }
        }
    }

    DETECTION_ORDER
        .into_iter()
        .find(|lang| contains_any(&lower, hint_words(*lang)))
        .unwrap_or(Language::En)
}

/// Uses the caller's hint when it is exactly a supported code, otherwise
/// falls back to detection.
pub fn resolve_language(hint: Option<&str>, text: &str) -> Language {
    hint.and_then(Language::from_code)
        .unwrap_or_else(|| detect_language(text))
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
