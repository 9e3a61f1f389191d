use unicode_segmentation::UnicodeSegmentation;

use crate::models::{Intent, Language};

/// Texts at or below this many characters (after trimming) are greetings.
pub const SHORT_PING_MAX_CHARS: usize = 2;

/// Trigger substrings for one `(language, intent)` pair, already case-folded.
pub fn keywords(lang: Language, intent: Intent) -> &'static [&'static str] {
    match (lang, intent) {
        (Language::En, Intent::Greet) => &["hi", "hello", "hey", "namaste"],
        (Language::En, Intent::Preventive) => &["prevention", "prevent", "wash", "mask", "avoid"],
        (Language::En, Intent::Symptoms) => &["symptom", "fever", "cough", "cold", "headache"],
        (Language::En, Intent::Vaccine) => {
            &["vaccine", "vaccination", "schedule", "dose", "immunization"]
        }
        (Language::En, Intent::Outbreak) => &["outbreak", "alert", "cases", "disease spread"],
        (Language::En, Intent::Help) => &["help", "menu"],

        (Language::Hi, Intent::Greet) => &["नमस्ते", "नमस्कार", "हैलो"],
        (Language::Hi, Intent::Preventive) => &["रोकथाम", "सावधानी", "मास्क", "हाथ", "धो"],
        (Language::Hi, Intent::Symptoms) => &["लक्षण", "बुखार", "खांसी", "जुकाम", "सरदर्द"],
        (Language::Hi, Intent::Vaccine) => &["टीका", "टीकाकरण", "खुराक", "शेड्यूल"],
        (Language::Hi, Intent::Outbreak) => &["प्रकोप", "अलर्ट", "मामले", "फैल"],
        (Language::Hi, Intent::Help) => &["मदद", "विकल्प"],

        (Language::Te, Intent::Greet) => &["నమస్తే", "హలో"],
        (Language::Te, Intent::Preventive) => &["నివారణ", "మాస్క్", "కడుగు", "దూరం"],
        (Language::Te, Intent::Symptoms) => &["లక్షణాలు", "జ్వరం", "దగ్గు", "జలుబు", "తలనొప్పి"],
        (Language::Te, Intent::Vaccine) => &["టీకా", "టీకాకరణ", "డోస్", "షెడ్యూల్"],
        (Language::Te, Intent::Outbreak) => &["అలర్ట్", "కేసులు", "విస్తరణ"],
        (Language::Te, Intent::Help) => &["సహాయం", "మెను"],

        (Language::Kn, Intent::Greet) => &["ನಮಸ್ಕಾರ", "ಹಲೋ"],
        (Language::Kn, Intent::Preventive) => &["ತಡೆಗಟ್ಟುವಿಕೆ", "ಮಾಸ್ಕ್", "ಕೈ", "ತೊಳೆಯಿರಿ", "ಅಂತರ"],
        (Language::Kn, Intent::Symptoms) => &["ಲಕ್ಷಣಗಳು", "ಜ್ವರ", "ಕೆಮ್ಮು", "ಶೀತ", "ತಲೆನೋವು"],
        (Language::Kn, Intent::Vaccine) => &["ಲಸಿಕೆ", "ವೇಳಾಪಟ್ಟಿ", "ಡೋಸ್", "ಲಸಿಕಾಕರಣ"],
        (Language::Kn, Intent::Outbreak) => &["ಎಚ್ಚರಿಕೆ", "ಕೇಸುಗಳು", "ಪ್ರಸರಣ"],
        (Language::Kn, Intent::Help) => &["ಸಹಾಯ", "ಮೆನು"],

        (Language::Ta, Intent::Greet) => &["வணக்கம்", "ஹலோ"],
        (Language::Ta, Intent::Preventive) => &["தடுப்பு", "மாஸ்க்", "கைகளை", "கழுவ", "இடைவெளி"],
        (Language::Ta, Intent::Symptoms) => {
            &["அறிகுறிகள்", "காய்ச்சல்", "இருமல்", "சளி", "தலைவலி"]
        }
        (Language::Ta, Intent::Vaccine) => &["தடுப்பூசி", "அட்டவணை", "டோஸ்"],
        (Language::Ta, Intent::Outbreak) => &["அலர்ட்", "பரவல்", "வழக்குகள்"],
        (Language::Ta, Intent::Help) => &["உதவி", "மெனு"],
    }
}

/// First-match keyword classification against the table for `lang`.
///
/// Intents are tried in [`Intent::ALL`] order and the first one with any
/// trigger contained in the lower-cased text wins, so a message matching
/// both vaccine and outbreak triggers is a vaccine message. Short pings are
/// always greetings; no match at all is `help`.
pub fn classify_intent(text: &str, lang: Language) -> Intent {
    let lower = text.to_lowercase();

    if lower.trim().chars().count() <= SHORT_PING_MAX_CHARS {
        return Intent::Greet;
    }

    Intent::ALL
        .into_iter()
        .find(|intent| contains_any(&lower, keywords(lang, *intent)))
        .unwrap_or(Intent::Help)
}

/// Collapses whitespace runs into single spaces.
pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized prefix of at most `max_graphemes` user-perceived
/// characters, so Indic vowel signs are never split from their consonant.
pub fn preview_text(input: &str, max_graphemes: usize) -> String {
    let normalized = normalize_text(input);
    let mut graphemes = normalized.graphemes(true);
    let mut preview = graphemes.by_ref().take(max_graphemes).collect::<String>();
    if graphemes.next().is_some() {
        preview.push('…');
    }
    preview
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
