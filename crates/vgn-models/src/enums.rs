//! Closed enumerations for the transaction taxonomy and roll direction.
//!
//! The wire (and database) form of each variant is the documented string —
//! note `xfer` for transfer. Dispatch on these is exhaustive; an unknown
//! string coming out of the database is a data error, not a new variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// TxnType
// ---------------------------------------------------------------------------

/// Top-level transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Trade,
    Settle,
    Income,
    Sweep,
    #[serde(rename = "xfer")]
    Transfer,
    Allocation,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Settle => "settle",
            Self::Income => "income",
            Self::Sweep => "sweep",
            Self::Transfer => "xfer",
            Self::Allocation => "allocation",
        }
    }
}

impl FromStr for TxnType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trade" => Ok(Self::Trade),
            "settle" => Ok(Self::Settle),
            "income" => Ok(Self::Income),
            "sweep" => Ok(Self::Sweep),
            "xfer" => Ok(Self::Transfer),
            "allocation" => Ok(Self::Allocation),
            _ => Err(UnknownVariant {
                field: "txn_type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TxnSubType
// ---------------------------------------------------------------------------

/// Transaction subtype. Which subtypes are legal under which [`TxnType`] is
/// enforced by the engine's dispatch, not by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnSubType {
    Buy,
    Sell,
    Reinvest,
    Settle,
    Dividend,
    Interest,
    In,
    Out,
    #[serde(rename = "xfer")]
    Transfer,
    Allocation,
}

impl TxnSubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Reinvest => "reinvest",
            Self::Settle => "settle",
            Self::Dividend => "dividend",
            Self::Interest => "interest",
            Self::In => "in",
            Self::Out => "out",
            Self::Transfer => "xfer",
            Self::Allocation => "allocation",
        }
    }
}

impl FromStr for TxnSubType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            "reinvest" => Ok(Self::Reinvest),
            "settle" => Ok(Self::Settle),
            "dividend" => Ok(Self::Dividend),
            "interest" => Ok(Self::Interest),
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            "xfer" => Ok(Self::Transfer),
            "allocation" => Ok(Self::Allocation),
            _ => Err(UnknownVariant {
                field: "txn_sub_type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TxnSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TxnState
// ---------------------------------------------------------------------------

/// Transaction lifecycle state. Advances `open → pending → processed`;
/// never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnState {
    Open,
    Pending,
    Processed,
}

impl TxnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Processed => "processed",
        }
    }
}

impl FromStr for TxnState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            _ => Err(UnknownVariant {
                field: "state",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TxnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for TxnState {
    fn default() -> Self {
        Self::Open
    }
}

// ---------------------------------------------------------------------------
// RollDirection
// ---------------------------------------------------------------------------

/// Direction of a lot-balance roll. Defaults to forward when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollDirection {
    Forward,
    Back,
}

impl Default for RollDirection {
    fn default() -> Self {
        Self::Forward
    }
}

impl RollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Back => "back",
        }
    }
}

impl FromStr for RollDirection {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "back" => Ok(Self::Back),
            _ => Err(UnknownVariant {
                field: "direction",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// UnknownVariant
// ---------------------------------------------------------------------------

/// A string that does not name any variant of the target enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} value {:?}", self.field, self.value)
    }
}

impl std::error::Error for UnknownVariant {}
