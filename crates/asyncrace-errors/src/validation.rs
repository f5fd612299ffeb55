//! Local input validation errors.
//!
//! These are raised before any network call is made.

use thiserror::Error;

/// Maximum vehicle name length, in characters, after trimming.
pub const MAX_NAME_LEN: usize = 20;

/// Rejections of locally-validated vehicle input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The trimmed vehicle name is empty.
    #[error("vehicle name must not be empty")]
    EmptyName,

    /// The trimmed vehicle name exceeds [`MAX_NAME_LEN`] characters.
    #[error("vehicle name is {len} characters, the maximum is {MAX_NAME_LEN}")]
    NameTooLong {
        /// Observed length.
        len: usize,
    },

    /// The color is not a hex RGB value.
    #[error("invalid vehicle color: {value:?}")]
    InvalidColor {
        /// The rejected value.
        value: String,
    },
}
