use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known component group positions
///
/// Group 0 is always the transaction metadata. The notary group holds the
/// notary name, the notary key and, optionally, the time window, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentGroup {
    Metadata,
    Notary,
    Signatories,
    OutputsInfo,
    CommandsInfo,
    Unused,
    Inputs,
    References,
    Outputs,
    Commands,
}

impl ComponentGroup {
    pub const ALL: [ComponentGroup; 10] = [
        ComponentGroup::Metadata,
        ComponentGroup::Notary,
        ComponentGroup::Signatories,
        ComponentGroup::OutputsInfo,
        ComponentGroup::CommandsInfo,
        ComponentGroup::Unused,
        ComponentGroup::Inputs,
        ComponentGroup::References,
        ComponentGroup::Outputs,
        ComponentGroup::Commands,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentGroup::Metadata => "metadata",
            ComponentGroup::Notary => "notary",
            ComponentGroup::Signatories => "signatories",
            ComponentGroup::OutputsInfo => "outputs-info",
            ComponentGroup::CommandsInfo => "commands-info",
            ComponentGroup::Unused => "unused",
            ComponentGroup::Inputs => "inputs",
            ComponentGroup::References => "references",
            ComponentGroup::Outputs => "outputs",
            ComponentGroup::Commands => "commands",
        }
    }
}

impl fmt::Display for ComponentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.index())
    }
}

/// Positions inside the notary group
pub mod notary {
    pub const NAME: usize = 0;
    pub const KEY: usize = 1;
    pub const TIME_WINDOW: usize = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_stable() {
        for (i, group) in ComponentGroup::ALL.iter().enumerate() {
            assert_eq!(group.index(), i);
            assert_eq!(ComponentGroup::from_index(i), Some(*group));
        }
        assert_eq!(ComponentGroup::Metadata.index(), 0);
        assert_eq!(ComponentGroup::Outputs.index(), 8);
        assert_eq!(ComponentGroup::from_index(10), None);
    }
}
