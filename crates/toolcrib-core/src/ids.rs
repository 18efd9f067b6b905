//! Strongly typed row identifiers.
//!
//! Every entity is keyed by a `u64` allocated from the backing store's
//! sequence. Each id gets its own newtype so a unit id can never be passed
//! where a tool id is expected. Ids display with a short prefix
//! (`tool-3`, `unit-17`) and parse from either form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Display prefix used by this id type.
            pub const PREFIX: &'static str = $prefix;

            /// Get the raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix($prefix)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(s);
                digits
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| format!("invalid {} id: {s}", $prefix))
            }
        }
    };
}

define_id!(
    /// Identifier of a [`Tool`](crate::Tool).
    ToolId,
    "tool"
);
define_id!(
    /// Identifier of a [`ToolUnit`](crate::ToolUnit).
    UnitId,
    "unit"
);
define_id!(
    /// Identifier of a tool or material category.
    CategoryId,
    "cat"
);
define_id!(
    /// Identifier of a [`Material`](crate::Material).
    MaterialId,
    "mat"
);
define_id!(
    /// Identifier of a [`BorrowingTransaction`](crate::BorrowingTransaction).
    TransactionId,
    "loan"
);
define_id!(
    /// Identifier of a [`BorrowingItem`](crate::BorrowingItem).
    ItemId,
    "item"
);
define_id!(
    /// Identifier of a [`BorrowedUnit`](crate::BorrowedUnit).
    BorrowedUnitId,
    "bu"
);
define_id!(
    /// Identifier of a [`ConsumptionTransaction`](crate::ConsumptionTransaction).
    ConsumptionId,
    "use"
);
