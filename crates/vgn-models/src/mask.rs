//! Field-mask overlay for partial updates.
//!
//! An update carrying a mask first loads the current row, overlays exactly
//! the named fields from the request body, and writes the merged row back.
//! Paths are the camelCased JSON field names; snake_case spellings are
//! normalized to the same key. A path that does not name a mutable field
//! (including `id`) is rejected rather than silently ignored.

use crate::entities::{Acct, Inst, Lot, Org, Port, Strat, Txn};

/// A mask path that names no mutable field on the target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskError {
    pub path: String,
}

impl std::fmt::Display for MaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown field mask path {:?}", self.path)
    }
}

impl std::error::Error for MaskError {}

// Normalize "parentId" / "parent_id" to "parentid" for matching.
fn norm(path: &str) -> String {
    path.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

macro_rules! overlay {
    ($fn_name:ident, $ty:ty, { $($key:literal => $field:ident),+ $(,)? }) => {
        /// Overlay the masked fields of `src` onto `dst`.
        pub fn $fn_name(dst: &mut $ty, src: &$ty, paths: &[String]) -> Result<(), MaskError> {
            for path in paths {
                match norm(path).as_str() {
                    $($key => dst.$field = src.$field.clone(),)+
                    _ => return Err(MaskError { path: path.clone() }),
                }
            }
            Ok(())
        }
    };
}

overlay!(overlay_org, Org, {
    "name" => name,
    "parentid" => parent_id,
});

overlay!(overlay_acct, Acct, {
    "name" => name,
    "parentid" => parent_id,
});

overlay!(overlay_port, Port, {
    "name" => name,
    "parentid" => parent_id,
});

overlay!(overlay_strat, Strat, {
    "name" => name,
    "parentid" => parent_id,
});

overlay!(overlay_inst, Inst, {
    "name" => name,
    "symbol" => symbol,
    "proxyinst" => proxy_inst,
});

overlay!(overlay_txn, Txn, {
    "parentid" => parent_id,
    "instid" => inst_id,
    "srclotid" => src_lot_id,
    "tgtlotid" => tgt_lot_id,
    "txndt" => txn_dt,
    "settledt" => settle_dt,
    "txntype" => txn_type,
    "txnsubtype" => txn_sub_type,
    "txnsize" => txn_size,
    "tradeamtccyid" => trade_amt_ccy_id,
    "tradeamtgross" => trade_amt_gross,
    "tradeamtnet" => trade_amt_net,
    "settleamtccyid" => settle_amt_ccy_id,
    "settleamtgross" => settle_amt_gross,
    "settleamtnet" => settle_amt_net,
    "state" => state,
});

overlay!(overlay_lot, Lot, {
    "instid" => inst_id,
    "srctxnid" => src_txn_id,
    "leorgid" => le_org_id,
    "acctid" => acct_id,
    "origdt" => orig_dt,
    "origsize" => orig_size,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::TxnState;
    use chrono::NaiveDate;

    fn txn(state: TxnState, size: f64) -> Txn {
        Txn {
            id: "txn_a".into(),
            parent_id: None,
            inst_id: None,
            src_lot_id: None,
            tgt_lot_id: None,
            txn_dt: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            settle_dt: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            txn_type: crate::enums::TxnType::Trade,
            txn_sub_type: None,
            txn_size: size,
            trade_amt_ccy_id: None,
            trade_amt_gross: 0.0,
            trade_amt_net: 0.0,
            settle_amt_ccy_id: None,
            settle_amt_gross: 0.0,
            settle_amt_net: 0.0,
            state,
        }
    }

    #[test]
    fn masked_fields_only_are_copied() {
        let mut dst = txn(TxnState::Open, 100.0);
        let src = txn(TxnState::Processed, 40.0);
        overlay_txn(&mut dst, &src, &["state".to_string()]).unwrap();
        assert_eq!(dst.state, TxnState::Processed);
        assert_eq!(dst.txn_size, 100.0, "unmasked field must not move");
    }

    #[test]
    fn snake_and_camel_paths_both_match() {
        let mut a = Org::default();
        let src = Org {
            id: "org_x".into(),
            name: "parent co".into(),
            parent_id: Some("org_p".into()),
        };
        overlay_org(&mut a, &src, &["parent_id".to_string()]).unwrap();
        assert_eq!(a.parent_id.as_deref(), Some("org_p"));

        let mut b = Org::default();
        overlay_org(&mut b, &src, &["parentId".to_string()]).unwrap();
        assert_eq!(b.parent_id.as_deref(), Some("org_p"));
    }

    #[test]
    fn unknown_path_is_rejected() {
        let mut dst = Org::default();
        let err = overlay_org(&mut dst, &Org::default(), &["nope".to_string()]).unwrap_err();
        assert_eq!(err.path, "nope");
    }

    #[test]
    fn id_is_not_a_mutable_field() {
        let src = txn(TxnState::Open, 1.0);
        let mut dst = src.clone();
        assert!(overlay_txn(&mut dst, &src, &["id".to_string()]).is_err());
    }
}
