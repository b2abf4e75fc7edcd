//! Blood-pressure reading model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive physiological bounds for a single reading field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u16,
    pub max: u16,
}

impl Bounds {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Check whether a value lies within the bounds.
    pub fn contains(&self, value: u16) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Systolic pressure bounds (mmHg).
pub const SYS_BOUNDS: Bounds = Bounds::new(50, 300);

/// Diastolic pressure bounds (mmHg).
pub const DIA_BOUNDS: Bounds = Bounds::new(30, 200);

/// Pulse bounds (beats per minute).
pub const PULSE_BOUNDS: Bounds = Bounds::new(30, 200);

/// One of the three reading fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Sys,
    Dia,
    Pulse,
}

impl Field {
    /// Physiological bounds for this field.
    pub fn bounds(self) -> Bounds {
        match self {
            Field::Sys => SYS_BOUNDS,
            Field::Dia => DIA_BOUNDS,
            Field::Pulse => PULSE_BOUNDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Sys => "sys",
            Field::Dia => "dia",
            Field::Pulse => "pulse",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured blood-pressure reading.
///
/// Every field is optional; an absent field means the value could not be
/// found or fell outside its physiological bounds. Zero is never used as a
/// sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Systolic pressure (mmHg).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys: Option<u16>,

    /// Diastolic pressure (mmHg).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dia: Option<u16>,

    /// Pulse (beats per minute).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse: Option<u16>,
}

impl Reading {
    /// Create a reading from raw field values, without validation.
    pub fn new(sys: Option<u16>, dia: Option<u16>, pulse: Option<u16>) -> Self {
        Self { sys, dia, pulse }
    }

    /// True when no field is populated.
    pub fn is_empty(&self) -> bool {
        self.sys.is_none() && self.dia.is_none() && self.pulse.is_none()
    }

    /// True when all three fields are populated.
    pub fn is_complete(&self) -> bool {
        self.sys.is_some() && self.dia.is_some() && self.pulse.is_some()
    }

    /// Get a field value.
    pub fn get(&self, field: Field) -> Option<u16> {
        match field {
            Field::Sys => self.sys,
            Field::Dia => self.dia,
            Field::Pulse => self.pulse,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<u16> {
        match field {
            Field::Sys => &mut self.sys,
            Field::Dia => &mut self.dia,
            Field::Pulse => &mut self.pulse,
        }
    }

    /// Reset every out-of-bounds field to absent.
    ///
    /// Returns the fields that were dropped together with their values.
    pub fn validate(&mut self) -> Vec<(Field, u16)> {
        let mut dropped = Vec::new();
        for field in [Field::Sys, Field::Dia, Field::Pulse] {
            let slot = self.slot_mut(field);
            if let Some(value) = *slot {
                if !field.bounds().contains(value) {
                    *slot = None;
                    dropped.push((field, value));
                }
            }
        }
        dropped
    }

    /// Return a copy with out-of-bounds fields removed.
    pub fn validated(mut self) -> Self {
        self.validate();
        self
    }

    /// Parse a structured `{"sys": .., "dia": .., "pulse": ..}` provider reply.
    ///
    /// Values may be JSON numbers or numeric strings. The reply may be
    /// wrapped in a fenced code block. Returns `None` when the reply is not
    /// such an object or none of the keys carry a usable number. Bounds are
    /// not applied here.
    pub fn from_json_reply(reply: &str) -> Option<Self> {
        let body = strip_code_fence(reply.trim());
        let value: Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;

        let lookup = |key: &str| -> Option<u16> {
            let (_, v) = object.iter().find(|(k, _)| k.eq_ignore_ascii_case(key))?;
            match v {
                Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
        };

        let reading = Reading::new(lookup("sys"), lookup("dia"), lookup("pulse"));
        if reading.is_empty() {
            return None;
        }

        Some(reading)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<u16>| v.map(|v| v.to_string()).unwrap_or_else(|| "--".to_string());
        write!(
            f,
            "{}/{} mmHg, pulse {}",
            show(self.sys),
            show(self.dia),
            show(self.pulse)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_reading() {
        let reading = Reading::default();
        assert!(reading.is_empty());
        assert!(!reading.is_complete());
        assert_eq!(serde_json::to_string(&reading).unwrap(), "{}");
    }

    #[test]
    fn test_validate_drops_out_of_range_fields_only() {
        let mut reading = Reading::new(Some(45), Some(80), Some(250));
        let dropped = reading.validate();

        assert_eq!(reading, Reading::new(None, Some(80), None));
        assert_eq!(dropped, vec![(Field::Sys, 45), (Field::Pulse, 250)]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let reading = Reading::new(Some(50), Some(200), Some(30)).validated();
        assert!(reading.is_complete());

        let reading = Reading::new(Some(301), Some(29), Some(201)).validated();
        assert!(reading.is_empty());
    }

    #[test]
    fn test_from_json_reply_strings() {
        let reading = Reading::from_json_reply(r#"{"sys": "128", "dia": "84", "pulse": "66"}"#);
        assert_eq!(reading, Some(Reading::new(Some(128), Some(84), Some(66))));
    }

    #[test]
    fn test_from_json_reply_fenced_numbers() {
        let reply = "```json\n{\"SYS\": 118, \"DIA\": 76, \"PULSE\": null}\n```";
        assert_eq!(
            Reading::from_json_reply(reply),
            Some(Reading::new(Some(118), Some(76), None))
        );
    }

    #[test]
    fn test_from_json_reply_rejects_prose() {
        assert_eq!(Reading::from_json_reply("The display shows 120/80."), None);
        assert_eq!(Reading::from_json_reply(r#"{"note": "blurry"}"#), None);
    }

    #[test]
    fn test_display() {
        let reading = Reading::new(Some(120), Some(80), None);
        assert_eq!(reading.to_string(), "120/80 mmHg, pulse --");
    }
}
