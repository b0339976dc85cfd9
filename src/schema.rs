use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Metric names emitted by the runner, in emission order.
pub const BUILD_TIME: &str = "Build Time";
pub const BUILD_SIZE: &str = "Build Size";
pub const RUNTIME_EXECUTION_TIME: &str = "Runtime Execution Time";
pub const MEMORY_USAGE: &str = "Memory Usage";

/// Fields a record does not model; kept so rewriting a history loses nothing.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// How a value is written. Values read from disk keep their original form.
#[derive(Debug, Clone, PartialEq)]
enum Repr {
    Text(String),
    Number(serde_json::Number),
}

/// A numeric metric value.
///
/// Freshly measured values are written as decimal strings with two
/// fractional digits; values read from a file are written back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    value: f64,
    repr: Repr,
}

impl MetricValue {
    pub fn get(&self) -> f64 {
        self.value
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue {
            value: v,
            repr: Repr::Text(format!("{v:.2}")),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Text(s) => f.write_str(s),
            Repr::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.repr {
            Repr::Text(s) => serializer.serialize_str(s),
            Repr::Number(n) => n.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricVisitor;

        impl<'de> Visitor<'de> for MetricVisitor {
            type Value = MetricValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a decimal string")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<MetricValue, E> {
                let n = serde_json::Number::from_f64(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Float(v), &self))?;
                Ok(MetricValue {
                    value: v,
                    repr: Repr::Number(n),
                })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MetricValue, E> {
                Ok(MetricValue {
                    value: v as f64,
                    repr: Repr::Number(v.into()),
                })
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MetricValue, E> {
                Ok(MetricValue {
                    value: v as f64,
                    repr: Repr::Number(v.into()),
                })
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MetricValue, E> {
                let parsed: f64 = v
                    .trim()
                    .parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))?;
                if !parsed.is_finite() {
                    return Err(E::invalid_value(de::Unexpected::Str(v), &self));
                }
                Ok(MetricValue {
                    value: parsed,
                    repr: Repr::Text(v.to_string()),
                })
            }
        }

        deserializer.deserialize_any(MetricVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: MetricValue,
    pub unit: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Measurement {
    pub fn new(name: &str, value: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            value: MetricValue::from(value),
            unit: unit.to_string(),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub email: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Person {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            extra: Extra::new(),
        }
    }
}

/// Commit metadata attached to a run.
///
/// The optional fields are not always populated by the tools that write the
/// history; an absent field stays absent when the record is written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub author: Person,
    pub committer: Person,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    pub id: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub commit: Commit,
    /// Epoch milliseconds at which the run was recorded.
    pub date: u64,
    pub tool: String,
    pub benches: Vec<Measurement>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl BenchmarkRun {
    pub fn bench(&self, name: &str) -> Option<&Measurement> {
        self.benches.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkHistory {
    pub last_update: u64,
    pub repo_url: String,
    pub entries: BTreeMap<String, Vec<BenchmarkRun>>,
    #[serde(flatten)]
    pub extra: Extra,
}
