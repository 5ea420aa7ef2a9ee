//! CSV renderings of the result tables. Column order is fixed; downstream
//! spreadsheets read these files by position.

use crate::types::*;
use csv::Writer;
use std::io::Write;

pub const PATTERN_HEADER: &[&str] = &[
    "index",
    "occurrence_count",
    "cuts",
    "used_length",
    "remaining_length",
    "waste",
];

pub const SLITTING_HEADER: &[&str] = &["thickness_bucket", "unit_id", "pattern", "waste"];

impl PatternGroup {
    fn to_row(&self) -> Vec<String> {
        let cuts = self
            .cuts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        vec![
            self.index.to_string(),
            self.occurrence_count.to_string(),
            cuts,
            self.used_length.to_string(),
            self.remaining_length.to_string(),
            self.waste.to_string(),
        ]
    }
}

impl SlitAssignment {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.thickness_bucket.millimetres().to_string(),
            self.unit_id.clone(),
            self.pattern.clone(),
            self.waste.to_string(),
        ]
    }
}

pub fn write_pattern_table<W: Write>(patterns: &[PatternGroup], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(PATTERN_HEADER)?;
    for group in patterns {
        writer.write_record(group.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_slitting_rows<W: Write>(assignments: &[SlitAssignment], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(SLITTING_HEADER)?;
    for row in assignments {
        writer.write_record(row.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn pattern_table_csv(patterns: &[PatternGroup]) -> Result<String> {
    let mut buf = Vec::new();
    write_pattern_table(patterns, &mut buf)?;
    into_string(buf)
}

pub fn slitting_rows_csv(assignments: &[SlitAssignment]) -> Result<String> {
    let mut buf = Vec::new();
    write_slitting_rows(assignments, &mut buf)?;
    into_string(buf)
}

fn into_string(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf).map_err(|err| OptimizerError::InvalidInput(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_pattern_table_columns() {
        let patterns = vec![PatternGroup {
            index: 1,
            occurrence_count: 2,
            cuts: vec![3000, 2200],
            used_length: 5200,
            remaining_length: 500,
            waste: 800,
        }];
        let csv = pattern_table_csv(&patterns).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "index,occurrence_count,cuts,used_length,remaining_length,waste"
        );
        assert_eq!(lines[1], "1,2,\"3000, 2200\",5200,500,800");
    }

    #[test]
    fn test_slitting_rows_columns() {
        let rows = vec![SlitAssignment {
            thickness_bucket: ThicknessBucket(750),
            unit_id: "CR075 1219C12700 250401-1".to_string(),
            vendor: "POSCO".to_string(),
            weight: 4_000.0,
            unit_width: 1219,
            pattern: "437×2".to_string(),
            composition: BTreeMap::from([(437, 2)]),
            filler_total: 0,
            waste: 345,
        }];
        let csv = slitting_rows_csv(&rows).unwrap();

        assert_eq!(
            csv,
            "thickness_bucket,unit_id,pattern,waste\n0.75,CR075 1219C12700 250401-1,437×2,345\n"
        );
    }

    #[test]
    fn test_empty_tables_still_have_headers() {
        assert_eq!(pattern_table_csv(&[]).unwrap().lines().count(), 1);
        assert_eq!(slitting_rows_csv(&[]).unwrap().lines().count(), 1);
    }
}
