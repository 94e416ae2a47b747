//! Extraction of bounding boxes from the detection API response.
//!
//! The API answers `{ "data": [ [ { "label", "score", "bounding_box": [x1, y1, x2, y2] }, ... ] ] }`,
//! one inner list per prompt. Only the first inner list is read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AnalysisError, Result};

/// Axis-aligned box in pixel coordinates. Orientation is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Signed area; a reversed box yields a negative value.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    fn from_value(value: &Value) -> Option<Self> {
        let coords = value.as_array()?;
        let coords: Vec<f64> = coords.iter().map(Value::as_f64).collect::<Option<_>>()?;
        match coords[..] {
            [x1, y1, x2, y2] => Some(Self { x1, y1, x2, y2 }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub bounding_box: BoundingBox,
}

impl Detection {
    fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let bounding_box = BoundingBox::from_value(entry.get("bounding_box")?)?;
        Some(Self {
            label: entry.get("label").and_then(Value::as_str).map(str::to_string),
            score: entry.get("score").and_then(Value::as_f64),
            bounding_box,
        })
    }
}

/// Returns the usable detections in response order.
///
/// A missing or empty `data` is an empty result. A `data` that is present but not
/// a list of lists is reported as [`AnalysisError::UnexpectedResponse`]. Entries
/// without a four-number `bounding_box` are skipped.
pub fn parse_detections(response: &Value) -> Result<Vec<Detection>> {
    let Some(body) = response.as_object() else {
        return Err(AnalysisError::UnexpectedResponse(format!(
            "expected a JSON object, got {}",
            describe(response)
        )));
    };

    let groups = match body.get("data") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(groups)) => groups,
        Some(other) => {
            return Err(AnalysisError::UnexpectedResponse(format!(
                "`data` is {}, expected a list",
                describe(other)
            )));
        }
    };

    let entries = match groups.first() {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(AnalysisError::UnexpectedResponse(format!(
                "`data[0]` is {}, expected a list of detections",
                describe(other)
            )));
        }
    };

    let detections: Vec<Detection> = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let detection = Detection::from_value(entry);
            if detection.is_none() {
                log::debug!("skipping detection {idx}: missing or malformed bounding_box");
            }
            detection
        })
        .collect();

    if detections.len() < entries.len() {
        log::warn!(
            "{} of {} detections had no usable bounding_box",
            entries.len() - detections.len(),
            entries.len()
        );
    }

    Ok(detections)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
