//! Feature vector contract
//!
//! Projects a caller-supplied mapping of named frequencies onto the ordered
//! numeric vector the classifier was trained on. Column order here must match
//! the order used at training time; the artifact records it and refuses to
//! load if it differs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Number of audiometric thresholds per sample
pub const FEATURE_COUNT: usize = 6;

/// Audiometric test frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Hz250,
    Hz500,
    Hz1000,
    Hz2000,
    Hz4000,
    Hz8000,
}

impl Frequency {
    /// Feature column order
    pub const ALL: [Frequency; FEATURE_COUNT] = [
        Frequency::Hz250,
        Frequency::Hz500,
        Frequency::Hz1000,
        Frequency::Hz2000,
        Frequency::Hz4000,
        Frequency::Hz8000,
    ];

    /// Request / dataset column key
    pub fn key(self) -> &'static str {
        match self {
            Frequency::Hz250 => "250Hz",
            Frequency::Hz500 => "500Hz",
            Frequency::Hz1000 => "1000Hz",
            Frequency::Hz2000 => "2000Hz",
            Frequency::Hz4000 => "4000Hz",
            Frequency::Hz8000 => "8000Hz",
        }
    }

    /// Column position in a [`FeatureVector`]
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Keys in column order
    pub fn keys() -> [&'static str; FEATURE_COUNT] {
        Self::ALL.map(Frequency::key)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Hearing thresholds in decibels, ordered per [`Frequency::ALL`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Build from a named mapping such as a JSON request body.
    ///
    /// All six keys are required; extra keys are ignored. Values may be JSON
    /// numbers or strings holding a number. No range checks are applied.
    pub fn from_named(map: &Map<String, Value>) -> Result<Self> {
        let mut values = [0.0; FEATURE_COUNT];
        for freq in Frequency::ALL {
            let value = map
                .get(freq.key())
                .ok_or_else(|| Error::missing_key(freq.key()))?;
            values[freq.position()] = numeric(value).ok_or_else(|| Error::non_numeric(freq.key()))?;
        }
        Ok(Self(values))
    }

    pub fn get(&self, freq: Frequency) -> f64 {
        self.0[freq.position()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_array(self) -> [f64; FEATURE_COUNT] {
        self.0
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, column: usize) -> &f64 {
        &self.0[column]
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
