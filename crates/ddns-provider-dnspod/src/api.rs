//! Wire types for the dnsapi.cn JSON responses
//!
//! Every response carries a `status` object; only code `"1"` means the
//! request was carried out. Record identifiers come back as strings from
//! `Record.List` and as numbers from `Record.Modify`, so both are accepted.

use serde::{Deserialize, Deserializer};

/// Status code of a successful call
pub const STATUS_OK: &str = "1";

/// Status code `Record.List` returns for a domain without records
pub const STATUS_NO_RECORDS: &str = "10";

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }
}

/// Body of `Record.List`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordListResponse {
    pub status: Status,
    #[serde(default)]
    pub records: Vec<RecordItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub value: String,
}

/// Body of `Record.Modify`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordModifyResponse {
    pub status: Status,
    pub record: Option<ModifiedRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifiedRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub value: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
