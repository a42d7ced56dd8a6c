use std::collections::BTreeMap;

use serde::Deserialize;

/// The vendor's dedicated off action. Off is not an operation mode on
/// the wire; it is this button.
pub const POWER_OFF_BUTTON: &str = "power-off";

/// Canonical operation modes. Declaration order is the display order:
/// off always sorts first, then auto, heat, cool, dry, fan-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AcMode {
    Off,
    Auto,
    Heat,
    Cool,
    Dry,
    FanOnly,
}

impl AcMode {
    /// Wire token for the vendor's `operation_mode` field. Off has no
    /// token: the vendor expresses it as a power-off button press.
    pub fn as_remo_str(&self) -> Option<&'static str> {
        match self {
            AcMode::Off => None,
            AcMode::Auto => Some("auto"),
            AcMode::Heat => Some("warm"),
            AcMode::Cool => Some("cool"),
            AcMode::Dry => Some("dry"),
            AcMode::FanOnly => Some("blow"),
        }
    }

    pub fn from_remo_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(AcMode::Auto),
            "warm" | "heat" => Some(AcMode::Heat),
            "cool" => Some(AcMode::Cool),
            "dry" => Some(AcMode::Dry),
            "blow" => Some(AcMode::FanOnly),
            _ => None,
        }
    }
}

/// One appliance entry from the vendor listing. Only the fields this
/// engine consumes are modeled; everything else is ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAppliance {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub appliance_type: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub aircon: Option<Aircon>,
    #[serde(default)]
    pub settings: Option<AirconSettings>,
}

impl RawAppliance {
    pub fn is_aircon(&self) -> bool {
        self.appliance_type == "AC"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Aircon {
    #[serde(default)]
    pub range: AirconRange,
    #[serde(rename = "tempUnit", default)]
    pub temp_unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AirconRange {
    #[serde(default)]
    pub modes: BTreeMap<String, ModeRange>,
    #[serde(rename = "fixedButtons", default)]
    pub fixed_buttons: Vec<String>,
}

/// Raw per-mode option lists as the vendor reports them: plain strings,
/// where a single empty string means the axis is not adjustable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModeRange {
    #[serde(default)]
    pub temp: Vec<String>,
    #[serde(default)]
    pub vol: Vec<String>,
    #[serde(default)]
    pub dir: Vec<String>,
    #[serde(default)]
    pub dirh: Vec<String>,
}

/// The control state the vendor believes the appliance is in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AirconSettings {
    #[serde(default)]
    pub temp: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub vol: String,
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub dirh: String,
    #[serde(default)]
    pub button: String,
}

impl AirconSettings {
    /// Reported mode with the power state folded in: a latched
    /// power-off button wins over whatever operation mode is stored.
    pub fn reported_mode(&self) -> Option<AcMode> {
        if self.button == POWER_OFF_BUTTON {
            return Some(AcMode::Off);
        }
        AcMode::from_remo_str(&self.mode)
    }
}

/// User-facing control state for one appliance. Mutated optimistically
/// right after a successful write and authoritatively on every poll
/// reconcile; the poll always wins.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub mode: AcMode,
    pub target_temperature: Option<f64>,
    pub fan: Option<String>,
    pub horizontal_swing: Option<String>,
    pub vertical_swing: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            mode: AcMode::Off,
            target_temperature: None,
            fan: None,
            horizontal_swing: None,
            vertical_swing: None,
        }
    }
}
