//! Error types for strata-state operations.

use crate::Address;
use thiserror::Error;

/// Result type alias for strata-state operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Errors that can occur when binding sub-cursors into persistent state.
///
/// Conditions the library treats as ordinary outcomes (an unregistered
/// action, a read of an unset slot) never appear here; they resolve to
/// unchanged state and `None` respectively.
#[derive(Debug, Error)]
pub enum StrataError {
    /// A sub-cursor was bound to a property that holds no value and has no
    /// declared default.
    #[error("property {property} has no value and no declared default")]
    AbsentProperty {
        /// The property the cursor was bound to.
        property: String,
    },

    /// An item cursor was bound to an address that is absent from the
    /// collection, and the collection declares no default item.
    #[error("no item at {property}[{address}] and no default item declared")]
    MissingItem {
        /// The collection property.
        property: String,
        /// The address that was bound.
        address: Address,
    },

    /// A stored slot value does not convert to the requested type.
    #[error("type mismatch at {property}: stored value is not a {expected}")]
    TypeMismatch {
        /// The property whose value failed to convert.
        property: String,
        /// The requested Rust type.
        expected: &'static str,
    },
}

impl StrataError {
    /// Create an absent property error.
    #[inline]
    pub fn absent_property(property: impl Into<String>) -> Self {
        StrataError::AbsentProperty {
            property: property.into(),
        }
    }

    /// Create a missing item error.
    #[inline]
    pub fn missing_item(property: impl Into<String>, address: Address) -> Self {
        StrataError::MissingItem {
            property: property.into(),
            address,
        }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(property: impl Into<String>, expected: &'static str) -> Self {
        StrataError::TypeMismatch {
            property: property.into(),
            expected,
        }
    }
}
