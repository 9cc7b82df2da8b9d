//! Wire/domain types shared by every varangian crate.
//!
//! All identifier fields on these types hold the *external* prefixed form
//! (`txn_...`, `lot_...`); translation to internal UUIDs happens inside the
//! stores, never here. JSON field names are lowerCamelCase; dates are
//! calendar dates (`YYYY-MM-DD`).

pub mod entities;
pub mod enums;
pub mod filter;
pub mod mask;

pub use entities::{Acct, Inst, Lot, LotBal, Org, Port, Strat, Txn};
pub use enums::{RollDirection, TxnState, TxnSubType, TxnType};
pub use filter::{LotFilter, TxnFilter};
pub use mask::MaskError;
