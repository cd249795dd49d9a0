//! Tri-state option toggles shared by the structured option objects.

use serde::{Deserialize, Serialize};

/// Enable/disable flag that also remembers whether the caller expressed a preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionValue {
    /// No preference; the engine default applies.
    #[default]
    Unset,
    /// Explicitly enabled.
    Enabled,
    /// Explicitly disabled.
    Disabled,
}

impl OptionValue {
    /// Whether the caller expressed a preference.
    #[must_use]
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// The explicit preference, if any.
    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Self::Unset => None,
            Self::Enabled => Some(true),
            Self::Disabled => Some(false),
        }
    }

    /// Layer `newer` over `self`; an unset `newer` keeps the current value.
    #[must_use]
    pub const fn merge(self, newer: Self) -> Self {
        match newer {
            Self::Unset => self,
            explicit => explicit,
        }
    }

    /// Encoding used by the engine-created telemetry atom (`OptionalBoolean`).
    #[must_use]
    pub const fn proto_value(self) -> i32 {
        match self {
            Self::Unset => 0,
            Self::Enabled => 1,
            Self::Disabled => 2,
        }
    }
}

impl From<Option<bool>> for OptionValue {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::from(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_nullable_bool() {
        assert_eq!(OptionValue::from(None), OptionValue::Unset);
        assert_eq!(OptionValue::from(Some(true)), OptionValue::Enabled);
        assert_eq!(OptionValue::from(Some(false)), OptionValue::Disabled);
        assert_eq!(OptionValue::from(true).as_bool(), Some(true));
        assert_eq!(OptionValue::Unset.as_bool(), None);
    }

    #[test]
    fn unset_never_overwrites_explicit_values() {
        assert_eq!(
            OptionValue::Enabled.merge(OptionValue::Unset),
            OptionValue::Enabled
        );
        assert_eq!(
            OptionValue::Enabled.merge(OptionValue::Disabled),
            OptionValue::Disabled
        );
        assert_eq!(
            OptionValue::Unset.merge(OptionValue::Enabled),
            OptionValue::Enabled
        );
    }

    #[test]
    fn proto_encoding_is_stable() {
        assert_eq!(OptionValue::Unset.proto_value(), 0);
        assert_eq!(OptionValue::Enabled.proto_value(), 1);
        assert_eq!(OptionValue::Disabled.proto_value(), 2);
        assert!(!OptionValue::default().is_set());
    }
}
