//! Single-customer feature vector

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::ChurnError;

/// The customer attributes the prediction service expects, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKey {
    AccountLength,
    AreaCode,
    NumberVmailMessages,
    TotalDayMinutes,
    TotalDayCalls,
    TotalDayCharge,
    TotalEveMinutes,
    TotalEveCalls,
    TotalEveCharge,
    TotalNightMinutes,
    TotalNightCalls,
    TotalIntlMinutes,
    TotalIntlCalls,
    CustomerServiceCalls,
    InternationalPlanYes,
}

impl FeatureKey {
    pub const COUNT: usize = 15;

    pub fn all() -> &'static [FeatureKey; FeatureKey::COUNT] {
        &[
            FeatureKey::AccountLength,
            FeatureKey::AreaCode,
            FeatureKey::NumberVmailMessages,
            FeatureKey::TotalDayMinutes,
            FeatureKey::TotalDayCalls,
            FeatureKey::TotalDayCharge,
            FeatureKey::TotalEveMinutes,
            FeatureKey::TotalEveCalls,
            FeatureKey::TotalEveCharge,
            FeatureKey::TotalNightMinutes,
            FeatureKey::TotalNightCalls,
            FeatureKey::TotalIntlMinutes,
            FeatureKey::TotalIntlCalls,
            FeatureKey::CustomerServiceCalls,
            FeatureKey::InternationalPlanYes,
        ]
    }

    /// Field name on the wire
    pub fn label(&self) -> &'static str {
        match self {
            FeatureKey::AccountLength => "account length",
            FeatureKey::AreaCode => "area code",
            FeatureKey::NumberVmailMessages => "number vmail messages",
            FeatureKey::TotalDayMinutes => "total day minutes",
            FeatureKey::TotalDayCalls => "total day calls",
            FeatureKey::TotalDayCharge => "total day charge",
            FeatureKey::TotalEveMinutes => "total eve minutes",
            FeatureKey::TotalEveCalls => "total eve calls",
            FeatureKey::TotalEveCharge => "total eve charge",
            FeatureKey::TotalNightMinutes => "total night minutes",
            FeatureKey::TotalNightCalls => "total night calls",
            FeatureKey::TotalIntlMinutes => "total intl minutes",
            FeatureKey::TotalIntlCalls => "total intl calls",
            FeatureKey::CustomerServiceCalls => "customer service calls",
            FeatureKey::InternationalPlanYes => "international plan_yes",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FeatureKey {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FeatureKey::all()
            .iter()
            .copied()
            .find(|k| k.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChurnError::UnknownValue {
                kind: "feature",
                value: s.to_string(),
            })
    }
}

/// Raw text for every feature. Values are sent exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct FeatureVector {
    values: [String; FeatureKey::COUNT],
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field set to the same text
    pub fn filled(value: &str) -> Self {
        Self {
            values: std::array::from_fn(|_| value.to_string()),
        }
    }

    pub fn get(&self, key: FeatureKey) -> &str {
        &self.values[key.index()]
    }

    pub fn set(&mut self, key: FeatureKey, value: impl Into<String>) {
        self.values[key.index()] = value.into();
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureKey, &str)> {
        FeatureKey::all()
            .iter()
            .map(move |k| (*k, self.values[k.index()].as_str()))
    }

    pub fn blank_fields(&self) -> Vec<FeatureKey> {
        self.iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(k, _)| k)
            .collect()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FeatureKey::COUNT))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.label(), value)?;
        }
        map.end()
    }
}

impl TryFrom<Map<String, Value>> for FeatureVector {
    type Error = ChurnError;

    /// Missing keys stay blank; numbers and booleans are kept as their text.
    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut features = FeatureVector::new();
        for (name, value) in map {
            let key: FeatureKey = name.parse()?;
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(ChurnError::UnknownValue {
                        kind: "feature value",
                        value: format!("{} = {}", name, other),
                    })
                }
            };
            features.set(key, text);
        }
        Ok(features)
    }
}
