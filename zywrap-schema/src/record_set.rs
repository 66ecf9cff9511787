use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entity collection as the API ships it.
///
/// Delta patches carry ordered lists of records that already contain their
/// key (and usually an `ordering`), while the downloadable bundle carries a
/// mapping from code to attributes. Mapping order is document order because
/// the workspace builds `serde_json` with `preserve_order`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RecordSet {
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl Default for RecordSet {
    fn default() -> Self {
        RecordSet::List(Vec::new())
    }
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::List(items) => items.len(),
            RecordSet::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picks_shape_from_json_kind() {
        let list: RecordSet = serde_json::from_value(json!([{"code": "a"}])).unwrap();
        assert!(matches!(list, RecordSet::List(ref v) if v.len() == 1));

        let map: RecordSet = serde_json::from_value(json!({"b": {}, "a": {}})).unwrap();
        let RecordSet::Map(map) = map else {
            panic!("expected map shape");
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"], "document order must survive parsing");
    }

    #[test]
    fn scalars_are_not_a_record_set() {
        assert!(serde_json::from_value::<RecordSet>(json!("nope")).is_err());
    }
}
