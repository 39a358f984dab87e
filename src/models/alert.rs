use serde::{Deserialize, Serialize};

/// A dispatched abnormal-reading alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    /// Server time at dispatch, RFC 3339 UTC.
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub user_id: i64,
    pub message: String,
    pub timestamp: String,
}
