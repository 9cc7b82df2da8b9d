//! Ledger entities as they cross the service boundary.
//!
//! Identifier fields hold external ids. `Option<String>` reference fields
//! serialize as absent when `None`, mirroring the nullable columns beneath
//! them. Cross-entity cycles (lot ↔ txn, txn → parent txn) exist only as
//! stored identifiers; nothing here holds an object reference.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{TxnState, TxnSubType, TxnType};

// ---------------------------------------------------------------------------
// Reference entities (trees / DAG)
// ---------------------------------------------------------------------------

/// Organization; `parent_id` forms a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Account; `parent_id` forms a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acct {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Portfolio; `parent_id` forms a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Strategy; `parent_id` forms a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strat {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Tradable instrument. Currencies are instruments too; `proxy_inst` forms
/// a DAG, not a tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inst {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_inst: Option<String>,
}

// ---------------------------------------------------------------------------
// Txn
// ---------------------------------------------------------------------------

/// A ledger transaction: trade, income, sweep, settle, transfer, or an
/// engine-generated allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Txn {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_lot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgt_lot_id: Option<String>,
    pub txn_dt: NaiveDate,
    pub settle_dt: NaiveDate,
    pub txn_type: TxnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_sub_type: Option<TxnSubType>,
    #[serde(default)]
    pub txn_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_amt_ccy_id: Option<String>,
    #[serde(default)]
    pub trade_amt_gross: f64,
    #[serde(default)]
    pub trade_amt_net: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_amt_ccy_id: Option<String>,
    #[serde(default)]
    pub settle_amt_gross: f64,
    #[serde(default)]
    pub settle_amt_net: f64,
    #[serde(default)]
    pub state: TxnState,
}

// ---------------------------------------------------------------------------
// Lot / LotBal
// ---------------------------------------------------------------------------

/// A tax/settlement lot: a parcel of an instrument with an origination date
/// and size, tied back to the transaction that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_txn_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le_org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct_id: Option<String>,
    pub orig_dt: NaiveDate,
    #[serde(default)]
    pub orig_size: f64,
    /// Point-in-time balances. Populated by `Get(id, dt)`; a non-empty `bal`
    /// on Create/Update switches those operations into balance mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bal: Vec<LotBal>,
}

/// Daily balance snapshot for one lot. `lot_size` partitions into
/// `settled_size + unsettled_size` on every engine-written row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotBal {
    #[serde(default)]
    pub lot_id: String,
    pub lot_dt: NaiveDate,
    #[serde(default)]
    pub lot_size: f64,
    #[serde(default)]
    pub settled_size: f64,
    #[serde(default)]
    pub unsettled_size: f64,
}

impl LotBal {
    /// True when every component is zero — such rows are not rolled forward.
    pub fn is_zero(&self) -> bool {
        self.lot_size == 0.0 && self.settled_size == 0.0 && self.unsettled_size == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txn_json_uses_camel_case_and_wire_dates() {
        let txn = Txn {
            id: "txn_abc".into(),
            parent_id: None,
            inst_id: Some("inst_xyz".into()),
            src_lot_id: None,
            tgt_lot_id: None,
            txn_dt: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            settle_dt: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            txn_type: TxnType::Trade,
            txn_sub_type: Some(TxnSubType::Buy),
            txn_size: 100.0,
            trade_amt_ccy_id: None,
            trade_amt_gross: 0.0,
            trade_amt_net: 0.0,
            settle_amt_ccy_id: Some("inst_usd".into()),
            settle_amt_gross: 10_000.0,
            settle_amt_net: 10_000.0,
            state: TxnState::Open,
        };

        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["txnDt"], "2024-01-02");
        assert_eq!(json["txnType"], "trade");
        assert_eq!(json["txnSubType"], "buy");
        assert_eq!(json["settleAmtNet"], 10_000.0);
        // Absent references serialize as absent, not null.
        assert!(json.get("parentId").is_none());
    }

    #[test]
    fn lot_omits_empty_bal() {
        let lot = Lot {
            id: "lot_abc".into(),
            inst_id: Some("inst_xyz".into()),
            src_txn_id: Some("txn_abc".into()),
            le_org_id: None,
            acct_id: None,
            orig_dt: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            orig_size: 100.0,
            bal: Vec::new(),
        };
        let json = serde_json::to_value(&lot).unwrap();
        assert!(json.get("bal").is_none());
    }

    #[test]
    fn lot_bal_zero_check() {
        let mut bal = LotBal {
            lot_id: "lot_abc".into(),
            lot_dt: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            lot_size: 0.0,
            settled_size: 0.0,
            unsettled_size: 0.0,
        };
        assert!(bal.is_zero());
        bal.settled_size = 1.0;
        assert!(!bal.is_zero());
    }
}
