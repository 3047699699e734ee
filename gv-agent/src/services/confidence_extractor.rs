//! Confidence extraction from prediction responses
//!
//! Maps an arbitrary JSON response body to a single maximum-confidence score.
//! The remote model is not pinned to one schema: detection-style responses
//! carry a `detections` array, classification-style responses a bare
//! `confidence` field or a `predictions` array.

use serde_json::Value;

/// Keys examined on each detection/prediction element, in priority order.
const CONFIDENCE_KEYS: [&str; 3] = ["confidence", "score", "probability"];

/// Extract the maximum confidence score from a prediction response.
///
/// Recognized shapes, checked in order:
/// 1. `{"detections": [..]}` - running maximum over all recognized numeric
///    fields of all object elements, never below 0.0
/// 2. `{"confidence": <number>}` - returned verbatim, negatives included
/// 3. `{"predictions": [..]}` - same accumulation as `detections`
///
/// Anything else (including non-object responses) scores 0.0. The missing
/// floor in branch 2 is a load-bearing contract with existing deployments;
/// do not "fix" it.
pub fn extract_max_confidence(response: &Value) -> f64 {
    let Some(fields) = response.as_object() else {
        return 0.0;
    };

    if let Some(detections) = fields.get("detections").and_then(|v| v.as_array()) {
        return max_over_elements(detections);
    }

    if let Some(confidence) = fields.get("confidence").and_then(|v| v.as_f64()) {
        return confidence;
    }

    if let Some(predictions) = fields.get("predictions").and_then(|v| v.as_array()) {
        return max_over_elements(predictions);
    }

    0.0
}

/// Running maximum over all recognized numeric fields of all object
/// elements. Starts at 0.0, so this never reports below zero.
fn max_over_elements(elements: &[Value]) -> f64 {
    let mut max_confidence = 0.0_f64;

    for element in elements {
        let Some(fields) = element.as_object() else {
            continue;
        };
        for key in CONFIDENCE_KEYS {
            if let Some(value) = fields.get(key).and_then(|v| v.as_f64()) {
                max_confidence = max_confidence.max(value);
            }
        }
    }

    max_confidence
}
