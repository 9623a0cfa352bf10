//! WebAssembly module for the Branch Ledger
//!
//! Provides client-side computation for:
//! - Record key generation
//! - Week windows for report headers
//! - Category/item summaries of entry forms
//! - Lenient numeric parsing of form fields

use wasm_bindgen::prelude::*;

use shared::{LineItem, RawNumber};

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn record_key(
    date: &str,
    branch: &str,
    department: &str,
    group: Option<&str>,
) -> Result<String, String> {
    let date = shared::parse_iso_date(date).map_err(|e| e.to_string())?;
    Ok(shared::generate_key(date, branch, department, group))
}

fn window_json(anchor: &str, iso: bool) -> Result<String, String> {
    let anchor = shared::parse_iso_date(anchor).map_err(|e| e.to_string())?;
    let numbering = if iso {
        shared::WeekNumbering::Iso
    } else {
        shared::WeekNumbering::Simplified
    };
    let window = shared::week_window_with(anchor, numbering);
    serde_json::to_string(&window).map_err(|e| e.to_string())
}

fn aggregate_json(lines_json: &str) -> Result<String, String> {
    let lines: Vec<LineItem> =
        serde_json::from_str(lines_json).map_err(|e| format!("Invalid entries JSON: {}", e))?;
    serde_json::to_string(&shared::aggregate(&lines)).map_err(|e| e.to_string())
}

/// Composite record key for a sheet; `group` may be omitted
#[wasm_bindgen]
pub fn generate_record_key(
    date: &str,
    branch: &str,
    department: &str,
    group: Option<String>,
) -> Result<String, JsValue> {
    record_key(date, branch, department, group.as_deref()).map_err(to_js)
}

/// Parts of a record key as JSON
#[wasm_bindgen]
pub fn parse_record_key(key: &str) -> Result<String, JsValue> {
    let parts = shared::parse_key(key).map_err(|e| to_js(e.to_string()))?;
    serde_json::to_string(&parts).map_err(|e| to_js(e.to_string()))
}

/// Monday-to-Sunday window around `anchor` as JSON
#[wasm_bindgen]
pub fn week_window(anchor: &str, iso: bool) -> Result<String, JsValue> {
    window_json(anchor, iso).map_err(to_js)
}

/// Ledger week number of a week starting on `start_date`
#[wasm_bindgen]
pub fn week_number(start_date: &str) -> Result<u32, JsValue> {
    let date = shared::parse_iso_date(start_date).map_err(|e| to_js(e.to_string()))?;
    Ok(shared::week_number(date))
}

/// Summarize a JSON array of line items by category and item
#[wasm_bindgen]
pub fn aggregate_entries(lines_json: &str) -> Result<String, JsValue> {
    aggregate_json(lines_json).map_err(to_js)
}

/// Numeric value of a form field; blanks and junk count as 0
#[wasm_bindgen]
pub fn parse_numeric(value: &str) -> f64 {
    shared::parse_numeric_or_zero(&RawNumber::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key() {
        assert_eq!(
            record_key("2025-08-04", "Mayon Branch", "Bakery", None).unwrap(),
            "2025-08-04_Mayon-Branch_Bakery"
        );
        assert!(record_key("08/04/2025", "Mayon", "Bakery", None).is_err());
    }

    #[test]
    fn test_week_window_json() {
        let json: serde_json::Value =
            serde_json::from_str(&window_json("2025-08-06", false).unwrap()).unwrap();

        assert_eq!(json["startDate"], "2025-08-04");
        assert_eq!(json["days"][6]["isoDate"], "2025-08-10");
        assert_eq!(json["days"][0]["dayName"], "Monday");
        assert_eq!(json["weekNumber"], 31);
        assert!(window_json("+262142-12-31", false).is_err());
    }

    #[test]
    fn test_aggregate_json() {
        let json: serde_json::Value = serde_json::from_str(
            &aggregate_json(
                r#"[
                    {"category": "Produce", "item": "Onion", "amount": 100},
                    {"category": "Produce", "item": "Onion", "amount": "50"}
                ]"#,
            )
            .unwrap(),
        )
        .unwrap();

        assert_eq!(json["grandTotal"], 150.0);
        assert_eq!(json["groups"][0]["groupKey"], "Produce");
        assert!(aggregate_json("not json").is_err());
        assert_eq!(aggregate_json("[]").unwrap(), r#"{"groups":[],"grandTotal":0.0}"#);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("1,250.5"), 1250.5);
        assert_eq!(parse_numeric(""), 0.0);
        assert_eq!(parse_numeric("abc"), 0.0);
    }
}
