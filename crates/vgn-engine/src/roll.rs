//! Lot-roll operator: balances persist across dates by being copied forward
//! one calendar day at a time.
//!
//! Forward rolls every balance on `dt` with any non-zero component to
//! `dt + 1 day`; rows that are zero in all three components stay behind on
//! the day they first hit zero. Back deletes the balances on `dt`.
//! Repeating a forward roll over the same source date produces the same
//! next-date set; if those rows already exist the insert fails on the
//! `(lot_id, lot_dt)` primary key — roll back first.

use chrono::NaiveDate;
use tracing::info;

use vgn_models::RollDirection;
use vgn_store::{LotStore, StoreError};

use crate::error::EngineError;

pub(crate) async fn roll_lots(
    lots: &dyn LotStore,
    dt: NaiveDate,
    direction: RollDirection,
    lot_ids: Option<&[String]>,
) -> Result<(), EngineError> {
    match direction {
        RollDirection::Back => {
            lots.delete_lot_bals(dt, lot_ids).await?;
            info!(%dt, "rolled balances back");
        }
        RollDirection::Forward => {
            let next = dt.succ_opt().ok_or_else(|| {
                StoreError::InvalidArgument(format!("roll date {dt} out of range"))
            })?;

            let bals = lots.list_lot_bals(dt, lot_ids).await?;
            let mut rolled = 0usize;
            for mut bal in bals {
                if bal.is_zero() {
                    continue;
                }
                bal.lot_dt = next;
                lots.create_lot_bal(&bal).await?;
                rolled += 1;
            }
            info!(%dt, %next, rolled, "rolled balances forward");
        }
    }

    Ok(())
}
