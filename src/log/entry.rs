use serde::Deserialize;
use std::borrow::Cow;

/// A single document from the `system.profile` capped collection.
///
/// Old servers describe the operation in a free-form `info` string
/// (`"query test.foo ntoreturn:0 ..."`). Newer ones split it into `op` and
/// `ns`. Any other profiler fields are ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawLogEntry {
    #[serde(default)]
    pub info: Option<String>,

    #[serde(default)]
    pub op: Option<String>,

    #[serde(default)]
    pub ns: Option<String>,
}

impl RawLogEntry {
    /// Text in `"<op> <db>.<collection> ..."` shape, if the entry carries one.
    ///
    /// `info` wins when present; otherwise `op` and `ns` are joined.
    pub fn description(&self) -> Option<Cow<'_, str>> {
        if let Some(info) = &self.info {
            return Some(Cow::Borrowed(info.as_str()));
        }
        match (&self.op, &self.ns) {
            (Some(op), Some(ns)) => Some(Cow::Owned(format!("{} {}", op, ns))),
            _ => None,
        }
    }
}

#[cfg(test)]
impl RawLogEntry {
    pub fn from_info(info: impl Into<String>) -> Self {
        Self {
            info: Some(info.into()),
            ..Self::default()
        }
    }

    pub fn from_op_ns(op: impl Into<String>, ns: impl Into<String>) -> Self {
        Self {
            info: None,
            op: Some(op.into()),
            ns: Some(ns.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn info_takes_precedence_over_op_and_ns() {
        let entry = RawLogEntry {
            info: Some("query test.foo".to_string()),
            op: Some("insert".to_string()),
            ns: Some("other.bar".to_string()),
        };
        assert_eq!(entry.description().as_deref(), Some("query test.foo"));
    }

    #[test]
    fn op_and_ns_are_joined() {
        let entry = RawLogEntry::from_op_ns("insert", "shop.orders");
        assert_eq!(entry.description().as_deref(), Some("insert shop.orders"));
    }

    #[test]
    fn entry_without_description() {
        let entry = RawLogEntry {
            op: Some("query".to_string()),
            ..RawLogEntry::default()
        };
        assert_eq!(entry.description(), None);
    }

    #[test]
    fn decodes_profiler_document_ignoring_extra_fields() {
        let json = r#"{"op":"update","ns":"app.users","millis":3,"ts":{"$date":"2024-01-01T00:00:00Z"}}"#;
        let entry: RawLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, RawLogEntry::from_op_ns("update", "app.users"));
    }
}
