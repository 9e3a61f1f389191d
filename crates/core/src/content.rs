use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::VaccinationScheduleEntry;

/// Ages up to and including this value get the infant schedule.
pub const INFANT_MAX_AGE_YEARS: u8 = 1;

pub const DEFAULT_PINCODE_ALERT_TEMPLATE: &str =
    "Outbreak update for {pincode}: Dengue risk is moderate. Remove stagnant water.";
pub const DEFAULT_GENERIC_ALERT: &str = "Outbreak update: No major alerts currently. Stay safe!";

/// Source of the dynamic parts of a reply.
pub trait ContentProvider: Send + Sync {
    fn schedule_for(&self, age_years: u8) -> Vec<VaccinationScheduleEntry>;
    fn outbreak_alert_for(&self, pincode: Option<&str>) -> String;
}

fn default_infant_schedule() -> Vec<VaccinationScheduleEntry> {
    vec![
        VaccinationScheduleEntry::new("6 weeks", "OPV, Penta, Rota"),
        VaccinationScheduleEntry::new("10 weeks", "OPV, Penta, Rota"),
        VaccinationScheduleEntry::new("14 weeks", "OPV, Penta, Rota"),
        VaccinationScheduleEntry::new("9-12 months", "Measles/Rubella"),
    ]
}

fn default_adult_schedule() -> Vec<VaccinationScheduleEntry> {
    vec![
        VaccinationScheduleEntry::new("Anytime", "Tetanus booster every 10 years"),
        VaccinationScheduleEntry::new(">= 60", "Flu, Pneumococcal (as advised)"),
    ]
}

fn present_pincode(pincode: Option<&str>) -> Option<&str> {
    pincode.filter(|value| !value.is_empty())
}

/// Built-in sample schedule and a fixed dengue advisory.
#[derive(Debug, Clone)]
pub struct StaticContentProvider {
    infant: Vec<VaccinationScheduleEntry>,
    adult: Vec<VaccinationScheduleEntry>,
}

impl Default for StaticContentProvider {
    fn default() -> Self {
        Self {
            infant: default_infant_schedule(),
            adult: default_adult_schedule(),
        }
    }
}

impl StaticContentProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentProvider for StaticContentProvider {
    fn schedule_for(&self, age_years: u8) -> Vec<VaccinationScheduleEntry> {
        if age_years <= INFANT_MAX_AGE_YEARS {
            self.infant.clone()
        } else {
            self.adult.clone()
        }
    }

    fn outbreak_alert_for(&self, pincode: Option<&str>) -> String {
        match present_pincode(pincode) {
            Some(pincode) => DEFAULT_PINCODE_ALERT_TEMPLATE.replace("{pincode}", pincode),
            None => DEFAULT_GENERIC_ALERT.to_string(),
        }
    }
}

/// On-disk form of [`CatalogContentProvider`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCatalog {
    #[serde(default = "default_infant_schedule")]
    pub infant: Vec<VaccinationScheduleEntry>,
    #[serde(default = "default_adult_schedule")]
    pub adult: Vec<VaccinationScheduleEntry>,
    /// Pincode-specific alerts that replace the template for that pincode.
    #[serde(default)]
    pub alerts: HashMap<String, String>,
    #[serde(default = "default_pincode_alert_template")]
    pub pincode_alert_template: String,
    #[serde(default = "default_generic_alert")]
    pub default_alert: String,
}

fn default_pincode_alert_template() -> String {
    DEFAULT_PINCODE_ALERT_TEMPLATE.to_string()
}

fn default_generic_alert() -> String {
    DEFAULT_GENERIC_ALERT.to_string()
}

/// Content backed by a JSON catalog, for deployments that publish their own
/// schedule and per-pincode advisories.
#[derive(Debug, Clone)]
pub struct CatalogContentProvider {
    catalog: ContentCatalog,
}

impl CatalogContentProvider {
    pub fn new(catalog: ContentCatalog) -> Self {
        Self { catalog }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog = serde_json::from_str(raw).context("invalid content catalog json")?;
        Ok(Self::new(catalog))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading content catalog {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("failed loading content catalog {}", path.display()))
    }
}

impl ContentProvider for CatalogContentProvider {
    fn schedule_for(&self, age_years: u8) -> Vec<VaccinationScheduleEntry> {
        if age_years <= INFANT_MAX_AGE_YEARS {
            self.catalog.infant.clone()
        } else {
            self.catalog.adult.clone()
        }
    }

    fn outbreak_alert_for(&self, pincode: Option<&str>) -> String {
        let Some(pincode) = present_pincode(pincode) else {
            return self.catalog.default_alert.clone();
        };

        self.catalog
            .alerts
            .get(pincode)
            .cloned()
            .unwrap_or_else(|| {
                self.catalog
                    .pincode_alert_template
                    .replace("{pincode}", pincode)
            })
    }
}
