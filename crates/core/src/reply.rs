use crate::content::ContentProvider;
use crate::models::{Intent, Language, VaccinationScheduleEntry};

/// Joins the schedule header and its entry lines. Empty: lines run together,
/// which existing subscribers already receive.
pub const SCHEDULE_LINE_SEPARATOR: &str = "";

/// Joins the reply and an appended outbreak alert. Empty for the same reason.
pub const ALERT_SEPARATOR: &str = "";

pub fn reply_template(lang: Language, intent: Intent) -> &'static str {
    match (lang, intent) {
        (Language::En, Intent::Greet) => {
            "Hello! Ask me about prevention, symptoms, vaccines, or type 'alert'."
        }
        (Language::En, Intent::Preventive) => {
            "Wash hands, wear a mask in crowds, keep distance if sick, drink safe water."
        }
        (Language::En, Intent::Symptoms) => {
            "Watch for fever, cough, cold, headache. Seek a doctor for breathing issues."
        }
        (Language::En, Intent::Vaccine) => {
            "Send your age or a child's age to get a sample vaccination schedule."
        }
        (Language::En, Intent::Outbreak) => {
            "Current demo alert: Dengue risk is moderate. Remove stagnant water."
        }
        (Language::En, Intent::Help) => {
            "Try: prevention tips, symptoms, vaccine schedule, outbreak alerts."
        }

        (Language::Hi, Intent::Greet) => "नमस्ते! रोकथाम, लक्षण, टीकाकरण या 'अलर्ट' लिखें।",
        (Language::Hi, Intent::Preventive) => {
            "हाथ धोएँ, भीड़ में मास्क पहनें, बीमार हों तो दूरी रखें, साफ पानी पिएँ।"
        }
        (Language::Hi, Intent::Symptoms) => {
            "लक्षण: बुखार, खांसी, जुकाम, सिरदर्द। सांस में दिक्कत हो तो डॉक्टर से मिलें।"
        }
        (Language::Hi, Intent::Vaccine) => {
            "अपनी या बच्चे की उम्र भेजें, मैं नमूना टीकाकरण शेड्यूल बताऊँगा।"
        }
        (Language::Hi, Intent::Outbreak) => "डेमो अलर्ट: डेंगू जोखिम मध्यम। रुका पानी हटाएँ।",
        (Language::Hi, Intent::Help) => "पूछें: रोकथाम, लक्षण, टीकाकरण, प्रकोप अलर्ट।",

        (Language::Te, Intent::Greet) => "నమస్తే! నివారణ, లక్షణాలు, టీకాలు లేదా 'అలర్ట్' అడగండి.",
        (Language::Te, Intent::Preventive) => {
            "చేతులు కడగండి, గుంపుల్లో మాస్క్ ధరించండి, అనారోగ్యం ఉంటే దూరం పాటించండి, శుభ్రమైన నీరు తాగండి."
        }
        (Language::Te, Intent::Symptoms) => {
            "లక్షణాలు: జ్వరం, దగ్గు, జలుబు, తలనొప్పి. శ్వాస ఇబ్బంది అయితే వైద్యుడిని సంప్రదించండి."
        }
        (Language::Te, Intent::Vaccine) => "వయస్సు పంపండి, నమూనా టీకా షెడ్యూల్ ఇస్తాను.",
        (Language::Te, Intent::Outbreak) => {
            "డెమో అలర్ట్: డెంగ్యూ మోస్తరు ప్రమాదం. నిల్వ నీరు తొలగించండి."
        }
        (Language::Te, Intent::Help) => "ప్రశ్నలు: నివారణ, లక్షణాలు, టీకాలు, అలర్ట్స్.",

        (Language::Kn, Intent::Greet) => {
            "ನಮಸ್ಕಾರ! ತಡೆಗಟ್ಟುವಿಕೆ, ಲಕ್ಷಣಗಳು, ಲಸಿಕೆಗಳು ಅಥವಾ 'ಅಲರ್ಟ್' ಕೇಳಿ."
        }
        (Language::Kn, Intent::Preventive) => {
            "ಕೈ ತೊಳೆಯಿರಿ, ಗುಂಪಿನಲ್ಲಿ ಮಾಸ್ಕ್ ಧರಿಸಿ, ಅಸ್ವಸ್ಥರಾಗಿದ್ದರೆ ಅಂತರ ಕಾಯ್ದುಕೊಳ್ಳಿ, ಶುದ್ಧ ನೀರು ಕುಡಿಯಿರಿ."
        }
        (Language::Kn, Intent::Symptoms) => {
            "ಲಕ್ಷಣಗಳು: ಜ್ವರ, ಕೆಮ್ಮು, ಶೀತ, ತಲೆನೋವು. ಉಸಿರಾಟ ತೊಂದರೆ ಇದ್ದರೆ ವೈದ್ಯರನ್ನು ಸಂಪರ್ಕಿಸಿ."
        }
        (Language::Kn, Intent::Vaccine) => {
            "ನಿಮ್ಮ ವಯಸ್ಸು ಕಳುಹಿಸಿ, ಮಾದರಿ ಲಸಿಕೆ ವೇಳಾಪಟ್ಟಿ ನೀಡುತ್ತೇನೆ."
        }
        (Language::Kn, Intent::Outbreak) => {
            "ಡೆಮೋ ಎಚ್ಚರಿಕೆ: ಡೆಂಗ್ಯು ಮಧ್ಯಮ ಅಪಾಯ. ನಿಂತ ನೀರನ್ನು ತೆಗೆಯಿರಿ."
        }
        (Language::Kn, Intent::Help) => "ಪ್ರಶ್ನೆಗಳು: ತಡೆಗಟ್ಟುವಿಕೆ, ಲಕ್ಷಣಗಳು, ಲಸಿಕೆ, ಅಲರ್ಟ್.",

        (Language::Ta, Intent::Greet) => {
            "வணக்கம்! தடுப்பு, அறிகுறிகள், தடுப்பூசி அல்லது 'அலர்ட்' கேளுங்கள்."
        }
        (Language::Ta, Intent::Preventive) => {
            "கைகளை கழுவுங்கள், கூட்டத்தில் மாஸ்க் அணியுங்கள், உடல்நலம் குன்றினால் இடைவெளி வைத்திருங்கள், சுத்தமான தண்ணீர் குடியுங்கள்."
        }
        (Language::Ta, Intent::Symptoms) => {
            "அறிகுறிகள்: காய்ச்சல், இருமல், சளி, தலைவலி. சுவாச சிரமம் இருந்தால் மருத்துவரை காணுங்கள்."
        }
        (Language::Ta, Intent::Vaccine) => {
            "வயதை அனுப்புங்கள், மாதிரி தடுப்பூசி அட்டவணை தருகிறேன்."
        }
        (Language::Ta, Intent::Outbreak) => {
            "டெமோ எச்சரிக்கை: டெங்கு மிதமான ஆபத்து. தங்கிய நீரை அகற்றுங்கள்."
        }
        (Language::Ta, Intent::Help) => "கேள்விகள்: தடுப்பு, அறிகுறிகள், தடுப்பூசி, அலர்ட்.",
    }
}

pub fn schedule_header(lang: Language) -> &'static str {
    match lang {
        Language::En => "Sample vaccination schedule:",
        Language::Hi => "नमूना टीकाकरण शेड्यूल:",
        Language::Te => "నమూనా టీకా షెడ్యూల్:",
        Language::Kn => "ಮಾದರಿ ಲಸಿಕೆ ವೇಳಾಪಟ್ಟಿ:",
        Language::Ta => "மாதிரி தடுப்பூசி அட்டவணை:",
    }
}

/// Localized header followed by one `- {age}: {vaccine}` line per entry.
pub fn format_schedule(lang: Language, schedule: &[VaccinationScheduleEntry]) -> String {
    let mut lines = Vec::with_capacity(schedule.len() + 1);
    lines.push(schedule_header(lang).to_string());
    lines.extend(
        schedule
            .iter()
            .map(|entry| format!("- {}: {}", entry.age_label, entry.vaccine_label)),
    );
    lines.join(SCHEDULE_LINE_SEPARATOR)
}

/// Builds the outgoing reply.
///
/// The template for `(lang, intent)` is replaced wholesale by a vaccination
/// schedule whenever an age was found, whatever the intent. Outbreak replies
/// then get the provider's alert appended.
pub fn compose_reply(
    content: &dyn ContentProvider,
    lang: Language,
    intent: Intent,
    age: Option<u8>,
    pincode: Option<&str>,
) -> String {
    let mut reply = match age {
        Some(age) => format_schedule(lang, &content.schedule_for(age)),
        None => reply_template(lang, intent).to_string(),
    };

    if intent == Intent::Outbreak {
        reply.push_str(ALERT_SEPARATOR);
        reply.push_str(&content.outbreak_alert_for(pincode));
    }

    reply
}
