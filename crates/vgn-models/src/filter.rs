//! Structured list filters for the Transaction and Lot stores.
//!
//! A filter arrives as a JSON document; each non-empty array becomes an
//! `IN`-style membership predicate ANDed with the others. Identifier values
//! are external and are decoded by the store before hitting the query.
//! Unknown fields are ignored so filter documents stay forward-compatible;
//! the Go-cased keys written by earlier tooling (`ID`, `TxnType`,
//! `TxnTypeNEQ`, `ParentID`, `SrcTxnID`) are accepted as aliases.

use serde::Deserialize;

/// Filter grammar for `ListTxns`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TxnFilter {
    #[serde(alias = "ID")]
    pub id: Vec<String>,
    #[serde(alias = "TxnType", alias = "txn_type")]
    pub txn_type: Vec<String>,
    #[serde(alias = "TxnTypeNEQ", alias = "txn_type_neq")]
    pub txn_type_neq: Vec<String>,
    #[serde(alias = "ParentID", alias = "parent_id")]
    pub parent_id: Vec<String>,
    #[serde(alias = "page_size")]
    pub page_size: i32,
    #[serde(alias = "page_token")]
    pub page_token: String,
}

/// Filter grammar for `ListLots`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LotFilter {
    #[serde(alias = "ID")]
    pub id: Vec<String>,
    #[serde(alias = "SrcTxnID", alias = "src_txn_id")]
    pub src_txn_id: Vec<String>,
    #[serde(alias = "page_size")]
    pub page_size: i32,
    #[serde(alias = "page_token")]
    pub page_token: String,
}

impl TxnFilter {
    /// Parse a filter document; an empty string yields the match-all filter.
    pub fn from_json(filter: &str) -> Result<Self, serde_json::Error> {
        if filter.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(filter)
    }
}

impl LotFilter {
    /// Parse a filter document; an empty string yields the match-all filter.
    pub fn from_json(filter: &str) -> Result<Self, serde_json::Error> {
        if filter.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(filter)
    }
}
