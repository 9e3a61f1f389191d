use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Te,
    Kn,
    Ta,
}

impl Language {
    /// Every supported language. Script detection walks the Indic entries in
    /// this order (hi, te, kn, ta).
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Hi,
        Language::Te,
        Language::Kn,
        Language::Ta,
    ];

    /// Exact membership test for a caller-supplied code. No trimming and no
    /// case folding: `"HI"` is not a supported code.
    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "en" => Some(Self::En),
            "hi" => Some(Self::Hi),
            "te" => Some(Self::Te),
            "kn" => Some(Self::Kn),
            "ta" => Some(Self::Ta),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Te => "te",
            Self::Kn => "kn",
            Self::Ta => "ta",
        }
    }

    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(|lang| lang.as_code()).collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language code `{0}` (expected one of en, hi, te, kn, ta)")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_code(value).ok_or_else(|| UnsupportedLanguage(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greet,
    Preventive,
    Symptoms,
    Vaccine,
    Outbreak,
    Help,
}

impl Intent {
    /// Classification order. The first intent with a matching trigger wins,
    /// so this order is part of the classifier's behaviour.
    pub const ALL: [Intent; 6] = [
        Intent::Greet,
        Intent::Preventive,
        Intent::Symptoms,
        Intent::Vaccine,
        Intent::Outbreak,
        Intent::Help,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greet => "greet",
            Self::Preventive => "preventive",
            Self::Symptoms => "symptoms",
            Self::Vaccine => "vaccine",
            Self::Outbreak => "outbreak",
            Self::Help => "help",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationScheduleEntry {
    pub age_label: String,
    pub vaccine_label: String,
}

impl VaccinationScheduleEntry {
    pub fn new(age_label: impl Into<String>, vaccine_label: impl Into<String>) -> Self {
        Self {
            age_label: age_label.into(),
            vaccine_label: vaccine_label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub phone: String,
    pub text: String,
    pub pincode: Option<String>,
    /// Raw hint from the transport. Only honoured when it is exactly one of
    /// the supported codes.
    pub language_hint: Option<String>,
}

impl MessageRequest {
    pub fn new(phone: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            text: text.into(),
            pincode: None,
            language_hint: None,
        }
    }

    pub fn with_pincode(mut self, pincode: impl Into<String>) -> Self {
        self.pincode = Some(pincode.into());
        self
    }

    pub fn with_language_hint(mut self, hint: impl Into<String>) -> Self {
        self.language_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResult {
    pub to: String,
    pub lang: Language,
    pub intent: Intent,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub phone: String,
    pub lang: Language,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BroadcastRequest {
    #[serde(default)]
    pub message_en: String,
    pub message_hi: Option<String>,
    pub message_te: Option<String>,
    pub message_kn: Option<String>,
    pub message_ta: Option<String>,
}

impl BroadcastRequest {
    /// Message for one language. Missing or empty translations fall back to
    /// the English text.
    pub fn message_for(&self, lang: Language) -> &str {
        let localized = match lang {
            Language::En => None,
            Language::Hi => self.message_hi.as_deref(),
            Language::Te => self.message_te.as_deref(),
            Language::Kn => self.message_kn.as_deref(),
            Language::Ta => self.message_ta.as_deref(),
        };

        localized
            .filter(|text| !text.is_empty())
            .unwrap_or(self.message_en.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastDelivery {
    pub phone: String,
    pub lang: Language,
    /// `"yes"` or `"no"`, kept as text for existing consumers of the report.
    pub sent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub count: usize,
    pub details: Vec<BroadcastDelivery>,
}
