//! Validation boundary between user-edited tables and the optimizers.
//!
//! Rows arrive with loosely typed cells. Each adapter converts what it can
//! and quarantines the rest, one [`Diagnostic`] per rejected row.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// A table cell as typed by the user: a number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Number(f64),
    Text(String),
}

impl RawCell {
    /// Numeric value, accepting thousands separators in text.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            RawCell::Number(n) => *n,
            RawCell::Text(text) => text.trim().replace(',', "").parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Positive whole number; fractional parts are truncated.
    pub fn as_positive_u32(&self) -> Option<u32> {
        let value = self.as_number()?.trunc();
        (value >= 1.0 && value <= f64::from(u32::MAX)).then_some(value as u32)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCutRow {
    #[serde(default, alias = "Length(mm)")]
    pub length: Option<RawCell>,
    #[serde(default, alias = "Qty")]
    pub quantity: Option<RawCell>,
}

/// Order line named like `EL shelf 400 coil 0.75x437(CR)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrderRow {
    pub name: String,
    /// Defaults to one strip when absent
    #[serde(default)]
    pub quantity: Option<RawCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFillerRow {
    pub name: String,
}

/// Coil stock line keyed by its lot number, e.g. `CR075 1219C12700 250401-1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCoilRow {
    #[serde(alias = "LOT_NO")]
    pub lot_no: String,
    #[serde(default)]
    pub weight: Option<RawCell>,
    #[serde(default)]
    pub vendor: String,
}

/// Records that passed validation plus one diagnostic per rejected row.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Normalized<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn reject(&mut self, row: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::InvalidRecord,
            format!("row {}", row + 1),
            message,
        ));
    }
}

pub fn normalize_cut_rows(rows: &[RawCutRow]) -> Normalized<CutRequest> {
    let mut out = Normalized::new();
    for (row, raw) in rows.iter().enumerate() {
        let length = raw.length.as_ref().and_then(RawCell::as_positive_u32);
        let quantity = raw.quantity.as_ref().and_then(RawCell::as_positive_u32);
        match (length, quantity) {
            (Some(length), Some(quantity)) => out.records.push(CutRequest::new(length, quantity)),
            (None, _) => out.reject(row, "Length is missing or not a positive number"),
            (_, None) => out.reject(row, "Quantity is missing or not a positive number"),
        }
    }
    out
}

pub fn normalize_order_rows(rows: &[RawOrderRow]) -> Normalized<WidthDemand> {
    let mut out = Normalized::new();
    for (row, raw) in rows.iter().enumerate() {
        if is_loss_line(&raw.name) {
            tracing::debug!(row = row + 1, "ignoring loss line");
            continue;
        }
        let Some((thickness_bucket, width)) = parse_product_name(&raw.name) else {
            out.reject(row, format!("No thickness x width found in '{}'", raw.name.trim()));
            continue;
        };
        let quantity = match &raw.quantity {
            None => 1,
            Some(cell) => match cell.as_positive_u32() {
                Some(quantity) => quantity,
                None => {
                    out.reject(row, "Quantity is not a positive number");
                    continue;
                }
            },
        };
        out.records.push(WidthDemand {
            thickness_bucket,
            width,
            quantity,
        });
    }
    out
}

pub fn normalize_filler_rows(rows: &[RawFillerRow]) -> Normalized<FillerWidth> {
    let mut out = Normalized::new();
    for (row, raw) in rows.iter().enumerate() {
        if is_loss_line(&raw.name) {
            continue;
        }
        match parse_product_name(&raw.name) {
            Some((thickness_bucket, width)) => out.records.push(FillerWidth {
                thickness_bucket,
                width,
            }),
            None => out.reject(row, format!("No thickness x width found in '{}'", raw.name.trim())),
        }
    }
    out
}

pub fn normalize_coil_rows(rows: &[RawCoilRow]) -> Normalized<StockUnit> {
    let mut out = Normalized::new();
    for (row, raw) in rows.iter().enumerate() {
        let Some((thickness_bucket, width)) = parse_lot_number(&raw.lot_no) else {
            out.reject(row, format!("Lot number '{}' could not be parsed", raw.lot_no.trim()));
            continue;
        };
        let weight = match &raw.weight {
            None => 0.0,
            Some(cell) => match cell.as_number() {
                Some(weight) if weight >= 0.0 => weight,
                _ => {
                    out.reject(row, "Weight is not a valid number");
                    continue;
                }
            },
        };
        out.records.push(StockUnit {
            id: raw.lot_no.trim().to_string(),
            thickness_bucket,
            width,
            weight,
            vendor: raw.vendor.trim().to_string(),
        });
    }
    out
}

fn is_loss_line(name: &str) -> bool {
    name.trim().to_uppercase().starts_with("LOSS")
}

/// Finds the first `<thickness>[T]x<width>` token, e.g. `0.75x437` or `0.8TX563`.
pub fn parse_product_name(name: &str) -> Option<(ThicknessBucket, u32)> {
    let upper = name.trim().to_uppercase();
    let chars: Vec<char> = upper.chars().collect();

    for start in 0..chars.len() {
        let at_boundary = start == 0 || !(chars[start - 1].is_ascii_digit() || chars[start - 1] == '.');
        if !at_boundary || !chars[start].is_ascii_digit() {
            continue;
        }

        let (thickness, mut pos) = read_decimal(&chars, start)?;
        if chars.get(pos) == Some(&'T') {
            pos += 1;
        }
        if !matches!(chars.get(pos), Some('X') | Some('×')) {
            continue;
        }
        let Some((width, _)) = read_decimal(&chars, pos + 1) else {
            continue;
        };

        let width = width.round();
        if thickness <= 0.0 || width < 1.0 || width > f64::from(u32::MAX) {
            return None;
        }
        return Some((ThicknessBucket::from_millimetres(thickness), width as u32));
    }
    None
}

/// Lot numbers carry material letters plus a thickness code in hundredths of a
/// millimetre, then a token whose leading digits are the coil width.
pub fn parse_lot_number(lot_no: &str) -> Option<(ThicknessBucket, u32)> {
    let upper = lot_no.trim().to_uppercase();
    let mut tokens = upper.split_whitespace();
    let grade = tokens.next()?;
    let size = tokens.next()?;

    let digits_at = grade.find(|c: char| c.is_ascii_digit())?;
    let (material, code) = grade.split_at(digits_at);
    if material.is_empty() || !material.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let code: String = code.chars().take_while(char::is_ascii_digit).collect();
    let bucket = code.parse::<u32>().ok()?.checked_mul(10)?;
    if bucket == 0 {
        return None;
    }

    let size_chars: Vec<char> = size.chars().collect();
    let mut idx = 0;
    while idx < size_chars.len() {
        let run = size_chars[idx..].iter().take_while(|c| c.is_ascii_digit()).count();
        if run >= 3 {
            let width: String = size_chars[idx..idx + run.min(4)].iter().collect();
            let width: u32 = width.parse().ok()?;
            return Some((ThicknessBucket(bucket), width));
        }
        idx += run.max(1);
    }
    None
}

fn read_decimal(chars: &[char], start: usize) -> Option<(f64, usize)> {
    let mut end = start;
    let mut seen_dot = false;
    while let Some(&c) = chars.get(end) {
        if c.is_ascii_digit() {
            end += 1;
        } else if c == '.' && !seen_dot && chars.get(end + 1).is_some_and(char::is_ascii_digit) {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    if end == start {
        return None;
    }
    let text: String = chars[start..end].iter().collect();
    text.parse().ok().map(|value| (value, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_rows_are_coerced_and_quarantined() {
        let rows = vec![
            RawCutRow {
                length: Some(3000.0.into()),
                quantity: Some(2.0.into()),
            },
            RawCutRow {
                length: Some("1,200".into()),
                quantity: Some("3".into()),
            },
            RawCutRow {
                length: Some("abc".into()),
                quantity: Some(1.0.into()),
            },
            RawCutRow {
                length: Some(500.0.into()),
                quantity: Some((-1.0).into()),
            },
            RawCutRow {
                length: None,
                quantity: Some(1.0.into()),
            },
            RawCutRow {
                length: Some(2500.7.into()),
                quantity: Some(1.0.into()),
            },
        ];
        let normalized = normalize_cut_rows(&rows);

        assert_eq!(
            normalized.records,
            vec![
                CutRequest::new(3000, 2),
                CutRequest::new(1200, 3),
                CutRequest::new(2500, 1)
            ]
        );
        let scopes: Vec<_> = normalized.diagnostics.iter().map(|d| d.scope.as_str()).collect();
        assert_eq!(scopes, vec!["row 3", "row 4", "row 5"]);
    }

    #[test]
    fn test_cut_rows_accept_table_headers() {
        let rows: Vec<RawCutRow> =
            serde_json::from_str(r#"[{"Length(mm)": 3000, "Qty": "2"}]"#).unwrap();
        let normalized = normalize_cut_rows(&rows);
        assert_eq!(normalized.records, vec![CutRequest::new(3000, 2)]);
    }

    #[test]
    fn test_product_names() {
        assert_eq!(
            parse_product_name("EL gondola shelf 400 coil 0.75x437(CR)"),
            Some((ThicknessBucket(750), 437))
        );
        assert_eq!(parse_product_name("0.8TX563"), Some((ThicknessBucket(800), 563)));
        assert_eq!(parse_product_name("1.2×1000 HR"), Some((ThicknessBucket(1200), 1000)));
        assert_eq!(parse_product_name("shelf 400 coil"), None);
    }

    #[test]
    fn test_order_rows_skip_loss_and_default_quantity() {
        let rows = vec![
            RawOrderRow {
                name: "0.75x437(CR)".to_string(),
                quantity: None,
            },
            RawOrderRow {
                name: "LOSS 0.75x100".to_string(),
                quantity: None,
            },
            RawOrderRow {
                name: "0.8x563".to_string(),
                quantity: Some(4.0.into()),
            },
            RawOrderRow {
                name: "no size here".to_string(),
                quantity: None,
            },
        ];
        let normalized = normalize_order_rows(&rows);

        assert_eq!(normalized.records.len(), 2);
        assert_eq!(normalized.records[0].quantity, 1);
        assert_eq!(normalized.records[1].quantity, 4);
        assert_eq!(normalized.diagnostics.len(), 1);
        assert_eq!(normalized.diagnostics[0].scope, "row 4");
    }

    #[test]
    fn test_lot_numbers() {
        assert_eq!(
            parse_lot_number("CR075 1219C12700 250401-1"),
            Some((ThicknessBucket(750), 1219))
        );
        assert_eq!(
            parse_lot_number("CR060 1038C11200 250306-1"),
            Some((ThicknessBucket(600), 1038))
        );
        assert_eq!(parse_lot_number("SPCC080 1250"), Some((ThicknessBucket(800), 1250)));
        assert_eq!(parse_lot_number("1250"), None);
        assert_eq!(parse_lot_number("CR075 C12"), None);
        assert_eq!(parse_lot_number("CR999999999 1000"), None);
        assert_eq!(parse_lot_number("CR99999999999 1000"), None);
    }

    #[test]
    fn test_malformed_coil_rows_are_excluded() {
        let rows = vec![
            RawCoilRow {
                lot_no: "CR075 1219C12700 250401-1".to_string(),
                weight: Some("12,500".into()),
                vendor: "POSCO".to_string(),
            },
            RawCoilRow {
                lot_no: "garbage".to_string(),
                weight: None,
                vendor: String::new(),
            },
            RawCoilRow {
                lot_no: "CR080 1250".to_string(),
                weight: Some("heavy".into()),
                vendor: String::new(),
            },
        ];
        let normalized = normalize_coil_rows(&rows);

        assert_eq!(normalized.records.len(), 1);
        let coil = &normalized.records[0];
        assert_eq!(coil.id, "CR075 1219C12700 250401-1");
        assert_eq!(coil.width, 1219);
        assert_eq!(coil.weight, 12_500.0);
        assert_eq!(normalized.diagnostics.len(), 2);
    }

    #[test]
    fn test_oversized_thickness_code_is_quarantined() {
        let rows = vec![
            RawCoilRow {
                lot_no: "CR999999999 1000C12700 250401-1".to_string(),
                weight: None,
                vendor: String::new(),
            },
            RawCoilRow {
                lot_no: "CR075 1000C12700 250401-1".to_string(),
                weight: None,
                vendor: String::new(),
            },
        ];
        let normalized = normalize_coil_rows(&rows);

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].thickness_bucket, ThicknessBucket(750));
        assert_eq!(normalized.diagnostics.len(), 1);
        assert_eq!(normalized.diagnostics[0].kind, DiagnosticKind::InvalidRecord);
        assert_eq!(normalized.diagnostics[0].scope, "row 1");
    }
}
