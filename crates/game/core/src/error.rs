//! Common error infrastructure for combat-core.
//!
//! Domain errors live next to the code that raises them (`ActionError` and
//! `OpError` in [`crate::action`], `GridError` in [`crate::state`],
//! `SnapshotError` in [`crate::replay`]). They all implement [`GameError`] so
//! callers can classify a failure without matching every variant.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed later (cooldown, turn order)
/// - **Validation**: the request itself is wrong (bad target, unknown skill)
/// - **Internal**: content or state is inconsistent and should be investigated
/// - **Fatal**: the session cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates a content or engine bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Machine-readable identifier for this error variant.
    ///
    /// Presentation layers key their messages off this string.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
