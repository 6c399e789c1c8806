use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MissionStage {
    #[default]
    Connecting,
    SettingMode,
    Arming,
    TakingOff,
    Circling,
    Hovering,
    Squaring,
    Landing,
    Disarmed,
    Failed,
}

impl MissionStage {
    /// Disarmed and Failed end a mission, nothing follows them
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStage::Disarmed | MissionStage::Failed)
    }
    /// Stages where the vehicle is expected to be off the ground
    pub fn is_airborne(&self) -> bool {
        matches!(
            self,
            MissionStage::TakingOff
                | MissionStage::Circling
                | MissionStage::Hovering
                | MissionStage::Squaring
                | MissionStage::Landing
        )
    }
}

impl fmt::Display for MissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissionStage::Connecting => "connecting",
            MissionStage::SettingMode => "setting mode",
            MissionStage::Arming => "arming",
            MissionStage::TakingOff => "taking off",
            MissionStage::Circling => "circling",
            MissionStage::Hovering => "hovering",
            MissionStage::Squaring => "squaring",
            MissionStage::Landing => "landing",
            MissionStage::Disarmed => "disarmed",
            MissionStage::Failed => "failed",
        };
        f.write_str(name)
    }
}
