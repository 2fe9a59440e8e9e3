use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identity of a backend record (the host platform's object guid).
///
/// 后端记录的唯一标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl_id!(RecordId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_round_trips_through_string() {
        let id = RecordId::from("obj-1");
        assert_eq!(id.as_ref(), "obj-1");
        assert_eq!(id.to_string(), "obj-1");
        let raw: String = id.into();
        assert_eq!(raw, "obj-1");
    }
}
