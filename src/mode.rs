//! System mode as shown on (and read back from) the external mode selector.
//!
//! The selector has eight positions.  In auto mode the controller publishes
//! the position matching what the equipment is doing; in manual mode it
//! reads the selection and, depending on [`ManualPolicy`], constrains
//! arbitration with it.
//!
//! [`ManualPolicy`]: crate::config::ManualPolicy

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::fsm::Phase;
use crate::fsm::context::{ActiveMode, SystemState};
use crate::zone::Stage;

/// One position of the eight-way mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SystemMode {
    #[default]
    Off,
    Fan,
    CoolStage1,
    CoolStage2,
    HeatStage1,
    HeatStage2,
    PurgeHeat,
    PurgeCool,
}

impl SystemMode {
    /// All positions, in selector order.
    pub const ALL: [Self; 8] = [
        Self::Off,
        Self::Fan,
        Self::CoolStage1,
        Self::CoolStage2,
        Self::HeatStage1,
        Self::HeatStage2,
        Self::PurgeHeat,
        Self::PurgeCool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Fan => "Fan",
            Self::CoolStage1 => "Cool Stage 1",
            Self::CoolStage2 => "Cool Stage 2",
            Self::HeatStage1 => "Heat Stage 1",
            Self::HeatStage2 => "Heat Stage 2",
            Self::PurgeHeat => "Purge Heat",
            Self::PurgeCool => "Purge Cool",
        }
    }

    /// Parse a selector label.  Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == label)
    }

    /// The position matching a committed system state.
    pub fn from_state(state: &SystemState) -> Self {
        match (state.phase, state.active_mode) {
            (Phase::Purging, ActiveMode::Cool) => Self::PurgeCool,
            (Phase::Purging, _) => Self::PurgeHeat,
            (Phase::Running | Phase::Escalated, ActiveMode::Heat) => match state.active_stage {
                Stage::Stage2 => Self::HeatStage2,
                _ => Self::HeatStage1,
            },
            (Phase::Running | Phase::Escalated, ActiveMode::Cool) => match state.active_stage {
                Stage::Stage2 => Self::CoolStage2,
                _ => Self::CoolStage1,
            },
            (_, ActiveMode::FanOnly) => Self::Fan,
            _ => Self::Off,
        }
    }

    /// How a manual selection of this position constrains zone calls.
    pub fn constraint(self) -> ManualConstraint {
        match self {
            Self::Off => ManualConstraint::Off,
            Self::Fan => ManualConstraint::FanOnly,
            Self::CoolStage1 | Self::CoolStage2 => ManualConstraint::Cool,
            Self::HeatStage1 | Self::HeatStage2 => ManualConstraint::Heat,
            Self::PurgeHeat | Self::PurgeCool => ManualConstraint::None,
        }
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of a manual selection on the zone calls fed to arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualConstraint {
    /// Zones decide.
    None,
    /// Every conditioning call is treated as heat.
    Heat,
    /// Every conditioning call is treated as cool.
    Cool,
    /// Every call becomes a fan request.
    FanOnly,
    /// All calls are ignored.
    Off,
}
