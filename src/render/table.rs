use crate::model::{CANONICAL_OP_TYPES, Rates, extra_op_types};
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

const COLLECTION_HEADER: &str = "collection";

/// Column header for an op type: `query` -> `queries/sec`.
fn header_for(op: &str) -> String {
    match op {
        "query" => "queries/sec".to_string(),
        "insert" => "inserts/sec".to_string(),
        "getmore" => "getmores/sec".to_string(),
        "update" => "updates/sec".to_string(),
        "remove" => "removes/sec".to_string(),
        other => format!("{}/sec", other),
    }
}

fn format_rate(rate: f64) -> String {
    format!("{:.3}", rate)
}

/// Render rates as an ASCII table.
///
/// Columns are the collection, the five canonical op types, then any extra
/// op types seen in `rates`. Rows are ordered by collection name. Cells wrap
/// so no line is wider than `max_width`.
pub fn render_table(rates: &Rates, max_width: usize) -> String {
    let mut ops: Vec<String> = CANONICAL_OP_TYPES.iter().map(|s| s.to_string()).collect();
    ops.extend(extra_op_types(rates));

    let mut header = vec![Cell::new(COLLECTION_HEADER)];
    header.extend(ops.iter().map(|op| Cell::new(header_for(op))));

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(u16::try_from(max_width).unwrap_or(u16::MAX))
        .set_header(header);

    for (collection, row) in rates {
        let mut cells = vec![Cell::new(collection)];
        cells.extend(ops.iter().map(|op| {
            Cell::new(format_rate(row.get(op).copied().unwrap_or(0.0)))
                .set_alignment(CellAlignment::Right)
        }));
        table.add_row(cells);
    }

    format!("{}\n", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AggregateCounts, to_rates};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn rates(rows: &[(&str, &[(&str, u64)])], interval: f64) -> Rates {
        let counts: AggregateCounts = rows
            .iter()
            .map(|(coll, ops)| {
                (
                    coll.to_string(),
                    ops.iter().map(|(op, n)| (op.to_string(), *n)).collect(),
                )
            })
            .collect();
        to_rates(&counts, interval).unwrap()
    }

    fn body_rows(table: &str) -> Vec<&str> {
        table
            .lines()
            .filter(|l| l.starts_with("| ") && !l.starts_with("| collection"))
            .collect()
    }

    #[test]
    fn renders_fixed_columns_and_zero_defaults() {
        let r = rates(&[("foo", &[("query", 10), ("insert", 5)])], 5.0);
        let table = render_table(&r, 100);

        let header = table.lines().nth(1).unwrap();
        let columns: Vec<&str> = header
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        assert_eq!(
            columns,
            vec![
                "collection",
                "queries/sec",
                "inserts/sec",
                "getmores/sec",
                "updates/sec",
                "removes/sec",
            ]
        );

        let rows = body_rows(&table);
        assert_eq!(rows.len(), 1);
        let cells: Vec<&str> = rows[0].split('|').map(str::trim).collect();
        assert_eq!(cells[1..7], ["foo", "2.000", "1.000", "0.000", "0.000", "0.000"]);
    }

    #[test]
    fn rates_are_right_aligned() {
        let r = rates(&[("foo", &[("query", 10)])], 5.0);
        let table = render_table(&r, 100);
        assert!(table.contains("|       2.000 |"), "{}", table);
        assert!(table.contains("| foo        |"), "{}", table);
    }

    #[test]
    fn empty_rates_render_header_only() {
        let table = render_table(&Rates::new(), 100);
        assert!(body_rows(&table).is_empty());
        assert!(table.contains("| collection | queries/sec |"));
    }

    #[test]
    fn extra_op_types_get_their_own_column() {
        let r = rates(&[("foo", &[("command", 2)]), ("bar", &[("query", 1)])], 1.0);
        let table = render_table(&r, 200);
        let header = table.lines().nth(1).unwrap();
        assert!(header.ends_with("| removes/sec | command/sec |"), "{}", header);

        let bar = table.lines().find(|l| l.starts_with("| bar")).unwrap();
        assert!(bar.ends_with("|       0.000 |       0.000 |"), "{}", bar);
    }

    #[test]
    fn rows_sorted_by_collection() {
        let r = rates(&[("zeta", &[("query", 1)]), ("alpha", &[("query", 1)])], 1.0);
        let table = render_table(&r, 100);
        let names: Vec<&str> = body_rows(&table)
            .iter()
            .map(|l| l.split('|').nth(1).unwrap().trim())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn narrow_width_is_honored() {
        let mut r = rates(&[("b".repeat(40).as_str(), &[("query", 3), ("command", 1)])], 1.0);
        r.insert("a".repeat(80), BTreeMap::from([("query".to_string(), 1.0)]));
        for max_width in [60, 100] {
            let table = render_table(&r, max_width);
            for line in table.lines() {
                assert!(
                    line.chars().count() <= max_width,
                    "width {}: {}",
                    max_width,
                    line
                );
            }
        }
    }
}
