//! Output of the per-second rates: ASCII table or JSON.

pub mod table;

pub use table::render_table;

use crate::model::Rates;

pub fn render_json(rates: &Rates) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(rates)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_keeps_every_op_type() {
        let mut rates = Rates::new();
        rates.insert(
            "foo".to_string(),
            BTreeMap::from([("query".to_string(), 2.0), ("command".to_string(), 0.5)]),
        );
        let json = render_json(&rates).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["foo"]["query"], 2.0);
        assert_eq!(value["foo"]["command"], 0.5);
    }
}
