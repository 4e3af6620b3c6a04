use serde::{Deserialize, Serialize};

use crate::fmt::fmt_fraction_percent;

/// X-axis labels for [`PredictionResult::progress_series`].
pub const CHART_LABELS: [&str; 5] = ["0%", "25%", "50%", "75%", "100%"];

/// Delay probability above which the result is flagged.
pub const HIGH_DELAY_RISK: f64 = 0.5;

/// Output of the inference service. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WirePrediction")]
pub struct PredictionResult {
    pub predicted_stage: String,
    pub estimated_progress_percent: f64,
    pub confidence: f64,
    pub delayed: bool,
    pub probability: f64,
}

impl PredictionResult {
    /// `[0, p/4, p/2, 0.75p, p]` for the progress chart. Display only.
    pub fn progress_series(&self) -> [f64; 5] {
        let p = self.estimated_progress_percent;
        [0.0, p / 4.0, p / 2.0, p * 0.75, p]
    }

    pub fn confidence_label(&self) -> String {
        fmt_fraction_percent(self.confidence)
    }

    pub fn probability_label(&self) -> String {
        fmt_fraction_percent(self.probability)
    }

    pub fn delay_status(&self) -> &'static str {
        if self.delayed {
            "Delayed"
        } else {
            "On Track"
        }
    }

    pub fn high_delay_risk(&self) -> bool {
        self.probability > HIGH_DELAY_RISK
    }
}

// The deployed service sends the stage as an integer index and `delayed` as 0/1.
#[derive(Deserialize)]
#[serde(untagged)]
enum StageValue {
    Text(String),
    Index(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Int(i64),
}

#[derive(Deserialize)]
struct WirePrediction {
    predicted_stage: StageValue,
    estimated_progress_percent: f64,
    confidence: f64,
    delayed: FlagValue,
    probability: f64,
}

fn check_range(name: &str, v: f64, lo: f64, hi: f64) -> Result<f64, String> {
    if v.is_finite() && (lo..=hi).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{name} out of range [{lo}, {hi}]"))
    }
}

impl TryFrom<WirePrediction> for PredictionResult {
    type Error = String;

    fn try_from(w: WirePrediction) -> Result<Self, Self::Error> {
        let predicted_stage = match w.predicted_stage {
            StageValue::Text(s) => s,
            StageValue::Index(i) => i.to_string(),
        };
        let delayed = match w.delayed {
            FlagValue::Bool(b) => b,
            FlagValue::Int(0) => false,
            FlagValue::Int(1) => true,
            FlagValue::Int(other) => return Err(format!("delayed must be 0 or 1, got {other}")),
        };
        Ok(Self {
            predicted_stage,
            estimated_progress_percent: check_range(
                "estimated_progress_percent",
                w.estimated_progress_percent,
                0.0,
                100.0,
            )?,
            confidence: check_range("confidence", w.confidence, 0.0, 1.0)?,
            delayed,
            probability: check_range("probability", w.probability, 0.0, 1.0)?,
        })
    }
}
