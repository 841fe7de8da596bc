//! Mapping of provider sky-condition codes onto the canonical
//! `{id, main, description, icon}` vocabulary.
//!
//! The canonical ids and icons follow the OpenWeather condition list, so
//! a reading looks the same no matter which upstream served it. Both
//! classifiers are total: anything they do not recognise maps to
//! [`fallback_condition`].

use crate::model::Condition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Canonical {
    id: i32,
    main: &'static str,
    description: &'static str,
    icon: &'static str,
}

impl Canonical {
    const fn new(
        id: i32,
        main: &'static str,
        description: &'static str,
        icon: &'static str,
    ) -> Self {
        Self {
            id,
            main,
            description,
            icon,
        }
    }

    fn to_condition(self) -> Condition {
        Condition {
            id: self.id,
            main: self.main.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
        }
    }
}

const CLEAR: Canonical = Canonical::new(800, "Clear", "Clear sky", "01d");
const PARTLY_CLOUDY: Canonical = Canonical::new(801, "Clouds", "Partly cloudy", "02d");
const OVERCAST: Canonical = Canonical::new(804, "Clouds", "Overcast", "04d");
const FOG: Canonical = Canonical::new(741, "Mist", "Fog", "50d");
const DRIZZLE: Canonical = Canonical::new(300, "Drizzle", "Drizzle", "09d");
const RAIN: Canonical = Canonical::new(500, "Rain", "Rain", "10d");
const SNOW: Canonical = Canonical::new(600, "Snow", "Snow", "13d");
const RAIN_SHOWERS: Canonical = Canonical::new(521, "Rain", "Rain showers", "09d");
const SNOW_SHOWERS: Canonical = Canonical::new(621, "Snow", "Snow showers", "13d");
const THUNDERSTORM: Canonical = Canonical::new(200, "Thunderstorm", "Thunderstorm", "11d");
const FALLBACK: Canonical = Canonical::new(802, "Clouds", "Cloudy", "03d");

/// Inclusive WMO code range and the condition it maps to.
struct CodeRange {
    lo: i64,
    hi: i64,
    condition: Canonical,
}

const fn range(lo: i64, hi: i64, condition: Canonical) -> CodeRange {
    CodeRange { lo, hi, condition }
}

/// WMO weather interpretation codes as reported by Open-Meteo.
/// Ranges are disjoint; the order only matters for readability.
const WMO_TABLE: &[CodeRange] = &[
    range(0, 0, CLEAR),
    range(1, 2, PARTLY_CLOUDY),
    range(3, 3, OVERCAST),
    range(45, 45, FOG),
    range(48, 48, FOG),
    range(51, 57, DRIZZLE),
    range(61, 67, RAIN),
    range(71, 77, SNOW),
    range(80, 82, RAIN_SHOWERS),
    range(85, 86, SNOW_SHOWERS),
    range(95, 96, THUNDERSTORM),
    range(99, 99, THUNDERSTORM),
];

/// Keyword rule for Google's `weatherCondition.type` enum.
struct KeywordRule {
    keywords: &'static [&'static str],
    condition: Canonical,
}

const fn rule(keywords: &'static [&'static str], condition: Canonical) -> KeywordRule {
    KeywordRule { keywords, condition }
}

/// Evaluated in order; the first rule with a keyword contained in the
/// type wins, so the more specific rules come first.
const GOOGLE_TABLE: &[KeywordRule] = &[
    rule(&["THUNDER"], THUNDERSTORM),
    rule(&["SNOW_SHOWERS"], SNOW_SHOWERS),
    rule(&["SNOW", "HAIL"], SNOW),
    rule(&["SHOWER"], RAIN_SHOWERS),
    rule(&["DRIZZLE"], DRIZZLE),
    rule(&["RAIN"], RAIN),
    rule(&["FOG", "HAZE", "MIST"], FOG),
    rule(&["PARTLY_CLOUDY", "MOSTLY_CLEAR"], PARTLY_CLOUDY),
    rule(&["CLOUDY"], OVERCAST),
    rule(&["CLEAR"], CLEAR),
];

/// Classify an Open-Meteo / WMO weather code.
pub fn classify_wmo(code: i64) -> Condition {
    WMO_TABLE
        .iter()
        .find(|r| (r.lo..=r.hi).contains(&code))
        .map_or(FALLBACK, |r| r.condition)
        .to_condition()
}

/// Classify a Google Weather condition type such as `LIGHT_RAIN_SHOWERS`.
pub fn classify_google(kind: &str) -> Condition {
    let kind = kind.trim().to_ascii_uppercase();
    if kind.is_empty() {
        return fallback_condition();
    }

    GOOGLE_TABLE
        .iter()
        .find(|r| r.keywords.iter().any(|k| kind.contains(k)))
        .map_or(FALLBACK, |r| r.condition)
        .to_condition()
}

/// Condition used when a provider reports nothing classifiable.
pub fn fallback_condition() -> Condition {
    FALLBACK.to_condition()
}
