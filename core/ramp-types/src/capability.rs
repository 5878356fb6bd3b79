//! The eight callback slots an extension may fill.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment stage a callback belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Comparison,
    Preflight,
    Transfer,
}

/// Which environment a callback runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Staging,
    Production,
}

/// One optional callback slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Send,
    Receive,
    PreflightSend,
    PreflightCheck,
    PreflightDisplay,
    ComparisonSend,
    ComparisonCheck,
    ComparisonSelectionRow,
}

impl Capability {
    /// All slots, in declaration order.
    pub const ALL: [Capability; 8] = [
        Capability::Send,
        Capability::Receive,
        Capability::PreflightSend,
        Capability::PreflightCheck,
        Capability::PreflightDisplay,
        Capability::ComparisonSend,
        Capability::ComparisonCheck,
        Capability::ComparisonSelectionRow,
    ];

    /// Registration-facing name of the slot.
    #[must_use]
    pub const fn callback_name(self) -> &'static str {
        match self {
            Capability::Send => "send_callback",
            Capability::Receive => "receive_callback",
            Capability::PreflightSend => "preflight_send_callback",
            Capability::PreflightCheck => "preflight_check_callback",
            Capability::PreflightDisplay => "preflight_display_callback",
            Capability::ComparisonSend => "comparison_send_callback",
            Capability::ComparisonCheck => "comparison_check_callback",
            Capability::ComparisonSelectionRow => "comparison_selection_row_callback",
        }
    }

    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            Capability::Send | Capability::Receive => Stage::Transfer,
            Capability::PreflightSend
            | Capability::PreflightCheck
            | Capability::PreflightDisplay => Stage::Preflight,
            Capability::ComparisonSend
            | Capability::ComparisonCheck
            | Capability::ComparisonSelectionRow => Stage::Comparison,
        }
    }

    #[must_use]
    pub const fn environment(self) -> Environment {
        match self {
            Capability::Receive | Capability::PreflightCheck | Capability::ComparisonCheck => {
                Environment::Production
            }
            _ => Environment::Staging,
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.callback_name())
    }
}

/// The set of slots an extension declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// No slots.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every slot.
    #[must_use]
    pub const fn all() -> Self {
        Self(u8::MAX)
    }

    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    #[must_use]
    pub const fn without(self, capability: Capability) -> Self {
        Self(self.0 & !capability.bit())
    }

    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the declared slots in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = Vec::<Capability>::deserialize(deserializer)?;
        Ok(slots.into_iter().collect())
    }
}
