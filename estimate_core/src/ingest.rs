//! # Takeoff Ingest
//!
//! Reads a tabular takeoff into [`TakeoffLineItem`]s.
//!
//! Expected columns: `Tag, Category, Type, Quantity, Unit, Material, Notes`.
//! Header names are matched ignoring case and surrounding whitespace, and
//! column order does not matter. A missing descriptive column reads as empty.
//!
//! A row whose `Quantity` is missing, non-numeric or negative is skipped with
//! a warning and recorded in [`TakeoffBatch::skipped`]; it never becomes a
//! zero-cost line and never aborts the batch.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::ingest::read_takeoff_csv;
//!
//! let csv = "Tag,Category,Type,Quantity,Unit,Material,Notes\n\
//!            W-1,Wall,Partition,100,SF,Drywall,\n\
//!            W-2,Wall,Partition,lots,SF,Drywall,\n";
//!
//! let batch = read_takeoff_csv(csv.as_bytes()).unwrap();
//! assert_eq!(batch.items.len(), 1);
//! assert_eq!(batch.skipped.len(), 1);
//! ```

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use crate::errors::{EstimateError, EstimateResult};
use crate::takeoff::TakeoffLineItem;
use crate::units::Quantity;

/// Lines read from one takeoff source.
#[derive(Debug, Clone, Default)]
pub struct TakeoffBatch {
    /// Rows that became line items, in source order
    pub items: Vec<TakeoffLineItem>,
    /// One `MalformedRecord` per skipped row
    pub skipped: Vec<EstimateError>,
    /// Data rows seen, valid or not
    pub records_read: usize,
}

impl TakeoffBatch {
    /// Whether no row produced a line item
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct Columns {
    tag: Option<usize>,
    category: Option<usize>,
    item_type: Option<usize>,
    quantity: Option<usize>,
    unit: Option<usize>,
    material: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut columns = Columns::default();
        for (idx, name) in headers.iter().enumerate() {
            let slot = match name.trim_start_matches('\u{feff}').trim().to_ascii_lowercase().as_str() {
                "tag" => &mut columns.tag,
                "category" => &mut columns.category,
                "type" => &mut columns.item_type,
                "quantity" => &mut columns.quantity,
                "unit" => &mut columns.unit,
                "material" => &mut columns.material,
                "notes" => &mut columns.notes,
                _ => continue,
            };
            // First occurrence wins
            slot.get_or_insert(idx);
        }
        columns
    }
}

fn field<'r>(record: &'r StringRecord, column: Option<usize>) -> &'r str {
    column.and_then(|idx| record.get(idx)).unwrap_or("").trim()
}

/// Parse one data row. `number` is 1-based, counting data rows only.
fn parse_row(record: &StringRecord, columns: &Columns, number: usize) -> EstimateResult<TakeoffLineItem> {
    if columns.quantity.is_none() {
        return Err(EstimateError::malformed_record(
            number,
            "Quantity",
            "",
            "source has no Quantity column",
        ));
    }

    let raw_quantity = field(record, columns.quantity);
    let quantity = Quantity::parse(raw_quantity)
        .map_err(|reason| EstimateError::malformed_record(number, "Quantity", raw_quantity, reason))?;

    Ok(TakeoffLineItem {
        tag: field(record, columns.tag).to_string(),
        category: field(record, columns.category).to_string(),
        item_type: field(record, columns.item_type).to_string(),
        quantity,
        unit: field(record, columns.unit).to_string(),
        material: field(record, columns.material).to_string(),
        notes: field(record, columns.notes).to_string(),
        element_count: 1,
    })
}

/// Read a CSV takeoff.
///
/// # Errors
///
/// Only a header row that cannot be read at all is fatal
/// (`SerializationError`). Row-level problems are collected in
/// [`TakeoffBatch::skipped`].
pub fn read_takeoff_csv<R: Read>(reader: R) -> EstimateResult<TakeoffBatch> {
    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| EstimateError::serialization(format!("Unreadable takeoff header: {}", e)))?
        .clone();
    let columns = Columns::from_headers(&headers);
    if columns.quantity.is_none() {
        warn!(headers = ?headers, "Takeoff has no Quantity column, every row will be skipped");
    }

    let mut batch = TakeoffBatch::default();
    for (idx, result) in csv_reader.records().enumerate() {
        let number = idx + 1;
        batch.records_read += 1;

        let parsed = result
            .map_err(|e| EstimateError::malformed_record(number, "record", "", e.to_string()))
            .and_then(|record| parse_row(&record, &columns, number));

        match parsed {
            Ok(item) => batch.items.push(item),
            Err(err) => {
                warn!(record = number, error = %err, "Skipping takeoff row");
                batch.skipped.push(err);
            }
        }
    }

    info!(
        read = batch.records_read,
        accepted = batch.items.len(),
        skipped = batch.skipped.len(),
        "Takeoff loaded"
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Tag,Category,Type,Quantity,Unit,Material,Notes\n";

    fn read(body: &str) -> TakeoffBatch {
        read_takeoff_csv(format!("{}{}", HEADER, body).as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_all_columns() {
        let batch = read("P-1,Pipe,Supply,12.5,LF,Copper,Level 1\n");
        assert_eq!(batch.records_read, 1);
        let item = &batch.items[0];
        assert_eq!(item.tag, "P-1");
        assert_eq!(item.category, "Pipe");
        assert_eq!(item.item_type, "Supply");
        assert_eq!(item.quantity, Quantity::parse("12.5").unwrap());
        assert_eq!(item.unit, "LF");
        assert_eq!(item.material, "Copper");
        assert_eq!(item.notes, "Level 1");
        assert_eq!(item.element_count, 1);
    }

    #[test]
    fn test_skips_bad_quantities_and_keeps_going() {
        let batch = read(
            "A,Wall,,100,SF,Drywall,\n\
             B,Wall,,ten,SF,Drywall,\n\
             C,Wall,,-4,SF,Drywall,\n\
             D,Wall,,,SF,Drywall,\n\
             E,Door,,2,EA,Interior,\n",
        );

        assert_eq!(batch.records_read, 5);
        let tags: Vec<_> = batch.items.iter().map(|i| i.tag.as_str()).collect();
        assert_eq!(tags, ["A", "E"]);

        let records: Vec<_> = batch
            .skipped
            .iter()
            .map(|e| match e {
                EstimateError::MalformedRecord { record, field, .. } => {
                    assert_eq!(field, "Quantity");
                    *record
                }
                other => panic!("unexpected error {:?}", other),
            })
            .collect();
        assert_eq!(records, [2, 3, 4]);
    }

    #[test]
    fn test_headers_case_and_order_insensitive() {
        let csv = " material , QUANTITY ,category\nDrywall,3,Wall\n";
        let batch = read_takeoff_csv(csv.as_bytes()).unwrap();
        let item = &batch.items[0];
        assert_eq!(item.material, "Drywall");
        assert_eq!(item.category, "Wall");
        assert_eq!(item.tag, "");
        assert_eq!(item.notes, "");
    }

    #[test]
    fn test_missing_quantity_column_skips_every_row() {
        let csv = "Tag,Category,Material\nA,Wall,Drywall\nB,Door,Interior\n";
        let batch = read_takeoff_csv(csv.as_bytes()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.skipped.len(), 2);
    }

    #[test]
    fn test_short_rows_read_as_empty() {
        let batch = read("X,Pipe,,4\n");
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].material, "");
    }

    #[test]
    fn test_quoted_fields() {
        let batch = read("\"W-1, north\",Wall,,\"1,5\",SF,Drywall,\"say \"\"hi\"\"\"\n");
        // "1,5" is not a decimal
        assert!(batch.items.is_empty());

        let batch = read("\"W-1, north\",Wall,,15,SF,Drywall,\"say \"\"hi\"\"\"\n");
        assert_eq!(batch.items[0].tag, "W-1, north");
        assert_eq!(batch.items[0].notes, "say \"hi\"");
    }

    #[test]
    fn test_empty_input() {
        let batch = read_takeoff_csv("".as_bytes()).unwrap();
        assert_eq!(batch.records_read, 0);
        assert!(batch.is_empty());

        let batch = read("");
        assert!(batch.is_empty());
        assert!(batch.skipped.is_empty());
    }
}
