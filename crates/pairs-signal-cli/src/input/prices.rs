use std::io;

use chrono::NaiveDate;
use pairs_signal_core::{AlignedSeriesPair, PairsError};

use super::file::resolve_path;

/// Load two symbols from a wide price CSV (`Date` column plus one column per
/// symbol) into an aligned pair sorted by date.
pub fn read_price_pair(
    path: &str,
    asset_1: &str,
    asset_2: &str,
) -> Result<AlignedSeriesPair, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let reader = csv::Reader::from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;
    parse_price_pair(reader, asset_1, asset_2)
}

pub fn parse_price_pair<R: io::Read>(
    mut reader: csv::Reader<R>,
    asset_1: &str,
    asset_2: &str,
) -> Result<AlignedSeriesPair, Box<dyn std::error::Error>> {
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PairsError::InvalidInput {
                field: name.to_string(),
                reason: "column not found in price file".into(),
            })
    };
    let date_col = column("Date")?;
    let col_1 = column(asset_1)?;
    let col_2 = column(asset_2)?;

    let mut rows: Vec<(NaiveDate, f64, f64)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = idx + 2;
        let cell = |col: usize| record.get(col).map(str::trim).unwrap_or("");
        let date = NaiveDate::parse_from_str(cell(date_col), "%Y-%m-%d")
            .map_err(|e| format!("line {}: invalid date '{}': {}", line, cell(date_col), e))?;
        let p1 = parse_price(cell(col_1), asset_1, line)?;
        let p2 = parse_price(cell(col_2), asset_2, line)?;
        rows.push((date, p1, p2));
    }
    rows.sort_by_key(|r| r.0);

    let dates = rows.iter().map(|r| r.0).collect();
    let series_1 = rows.iter().map(|r| r.1).collect();
    let series_2 = rows.iter().map(|r| r.2).collect();
    Ok(AlignedSeriesPair::new(asset_1, asset_2, dates, series_1, series_2)?)
}

fn parse_price(raw: &str, symbol: &str, line: usize) -> Result<f64, PairsError> {
    raw.parse::<f64>().map_err(|_| PairsError::InvalidInput {
        field: symbol.to_string(),
        reason: format!("line {}: '{}' is not a price", line, raw),
    })
}
