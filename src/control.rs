use tracing::{debug, warn};

use crate::Result;
use crate::capability::{CapabilityModel, ModeCapability, fallback_temp_range};
use crate::poll::Coordinator;
use crate::types::{AcMode, DisplayState, RawAppliance};

/// Mode re-issued by `turn_on` when no previous mode is known.
const DEFAULT_ON_MODE: AcMode = AcMode::Auto;

/// Per-appliance control state machine. Validates user commands against
/// the currently cached capability model, issues the write, updates the
/// display state optimistically and reconciles against the next poll.
///
/// Requested values the appliance never declared are silently ignored,
/// matching the permissive vendor control surface: no write goes out
/// and no state changes.
pub struct AcController {
    coordinator: Coordinator,
    state: DisplayState,
    last_active_mode: Option<AcMode>,
}

impl AcController {
    /// Starts inert: off, no target temperature, nothing selected.
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            state: DisplayState::default(),
            last_active_mode: None,
        }
    }

    // -- Read accessors --

    pub fn mode(&self) -> AcMode {
        self.state.mode
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.state.target_temperature
    }

    pub fn fan_setting(&self) -> Option<&str> {
        self.state.fan.as_deref()
    }

    pub fn horizontal_swing(&self) -> Option<&str> {
        self.state.horizontal_swing.as_deref()
    }

    pub fn vertical_swing(&self) -> Option<&str> {
        self.state.vertical_swing.as_deref()
    }

    pub fn display_state(&self) -> &DisplayState {
        &self.state
    }

    /// True iff the last poll cycle succeeded.
    pub fn available(&self) -> bool {
        self.coordinator.last_update_ok()
    }

    /// Selectable modes, off first.
    pub fn modes(&self) -> Vec<AcMode> {
        self.coordinator.model().mode_order.clone()
    }

    /// Temperature options of the active mode as reported; a lone
    /// `None` means the mode has no adjustable temperature.
    pub fn temperature_options(&self) -> Vec<Option<f64>> {
        let model = self.coordinator.model();
        match model.capability(self.state.mode) {
            Some(caps) => caps.temperatures.clone(),
            None => vec![None],
        }
    }

    pub fn fan_options(&self) -> Vec<String> {
        self.axis_options(|caps| caps.fan_speeds.clone())
    }

    pub fn horizontal_swing_options(&self) -> Vec<String> {
        self.axis_options(|caps| caps.horizontal_swing.clone())
    }

    pub fn vertical_swing_options(&self) -> Vec<String> {
        self.axis_options(|caps| caps.vertical_swing.clone())
    }

    /// Legal temperature bounds for the active mode. Falls back to the
    /// mode-class default when the capability list has no numbers, so
    /// the renderer always gets a range.
    pub fn min_temp(&self) -> f64 {
        self.temp_bounds().0
    }

    pub fn max_temp(&self) -> f64 {
        self.temp_bounds().1
    }

    fn temp_bounds(&self) -> (f64, f64) {
        temp_bounds_for(&self.coordinator.model(), self.state.mode)
    }

    fn axis_options(&self, pick: impl Fn(&ModeCapability) -> Vec<String>) -> Vec<String> {
        let model = self.coordinator.model();
        match model.capability(self.state.mode) {
            Some(caps) => pick(caps),
            None => vec![String::new()],
        }
    }

    // -- Commands --

    /// Switch the operation mode. Off goes out as the dedicated
    /// power-off action; every other mode as a named operation mode.
    /// The stored target temperature follows the new mode's legal range
    /// instead of being dropped.
    pub async fn set_mode(&mut self, mode: AcMode) -> Result<()> {
        let model = self.coordinator.model();
        if !model.supports(mode) {
            debug!(?mode, "requested mode not in capability model, ignoring");
            return Ok(());
        }

        let result = match mode.as_remo_str() {
            Some(token) => {
                self.coordinator
                    .api()
                    .set_operation_mode(self.coordinator.appliance_id(), token)
                    .await
            }
            None => {
                self.coordinator
                    .api()
                    .set_power_off(self.coordinator.appliance_id())
                    .await
            }
        };
        if let Err(e) = result {
            warn!(?mode, error = %e, "mode write failed");
            return Err(e);
        }

        self.state.mode = mode;
        if mode != AcMode::Off {
            self.last_active_mode = Some(mode);
            if let Some(t) = self.state.target_temperature {
                let (lo, hi) = temp_bounds_for(&model, mode);
                self.state.target_temperature = Some(round_to_half(t).clamp(lo, hi));
            }
        }
        self.finish_write().await;
        Ok(())
    }

    /// Set the target temperature for the active mode. Rounds to the
    /// nearest 0.5, clamps into the mode's legal range, and ignores the
    /// command entirely when the mode exposes no adjustable
    /// temperature.
    pub async fn set_temperature(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Ok(());
        }
        let model = self.coordinator.model();
        let Some(caps) = model.capability(self.state.mode) else {
            return Ok(());
        };
        let (Some(lo), Some(hi)) = (caps.min_temp(), caps.max_temp()) else {
            debug!(mode = ?self.state.mode, "mode has no adjustable temperature, ignoring");
            return Ok(());
        };
        let value = round_to_half(value).clamp(lo, hi);

        if let Err(e) = self
            .coordinator
            .api()
            .set_temperature(self.coordinator.appliance_id(), value)
            .await
        {
            warn!(value, error = %e, "temperature write failed");
            return Err(e);
        }
        self.state.target_temperature = Some(value);
        self.finish_write().await;
        Ok(())
    }

    /// Set the fan speed. Tokens outside the active mode's declared
    /// list are ignored.
    pub async fn set_fan(&mut self, fan: &str) -> Result<()> {
        if !self.axis_accepts(fan, |caps| &caps.fan_speeds) {
            return Ok(());
        }
        if let Err(e) = self
            .coordinator
            .api()
            .set_fan_speed(self.coordinator.appliance_id(), fan)
            .await
        {
            warn!(fan, error = %e, "fan write failed");
            return Err(e);
        }
        self.state.fan = Some(fan.to_string());
        self.finish_write().await;
        Ok(())
    }

    pub async fn set_horizontal_swing(&mut self, direction: &str) -> Result<()> {
        if !self.axis_accepts(direction, |caps| &caps.horizontal_swing) {
            return Ok(());
        }
        if let Err(e) = self
            .coordinator
            .api()
            .set_horizontal_swing(self.coordinator.appliance_id(), direction)
            .await
        {
            warn!(direction, error = %e, "horizontal swing write failed");
            return Err(e);
        }
        self.state.horizontal_swing = Some(direction.to_string());
        self.finish_write().await;
        Ok(())
    }

    pub async fn set_vertical_swing(&mut self, direction: &str) -> Result<()> {
        if !self.axis_accepts(direction, |caps| &caps.vertical_swing) {
            return Ok(());
        }
        if let Err(e) = self
            .coordinator
            .api()
            .set_vertical_swing(self.coordinator.appliance_id(), direction)
            .await
        {
            warn!(direction, error = %e, "vertical swing write failed");
            return Err(e);
        }
        self.state.vertical_swing = Some(direction.to_string());
        self.finish_write().await;
        Ok(())
    }

    /// Power off. Equivalent to selecting the off mode.
    pub async fn turn_off(&mut self) -> Result<()> {
        self.set_mode(AcMode::Off).await
    }

    /// Power on. Re-issues the last known non-off mode; an appliance
    /// with no history comes back in the default mode. There is no
    /// separate resume state beyond that single remembered mode.
    pub async fn turn_on(&mut self) -> Result<()> {
        let mode = match self.state.mode {
            AcMode::Off => self.last_active_mode.unwrap_or(DEFAULT_ON_MODE),
            current => current,
        };
        self.set_mode(mode).await
    }

    // -- Reconciliation --

    /// Pull the coordinator's current snapshot into the display state.
    /// Call after a scheduled poll completed.
    pub fn reconcile(&mut self) {
        if let Some(snapshot) = self.coordinator.snapshot() {
            self.apply_snapshot(&snapshot);
        }
    }

    /// Authoritative reconcile from a polled snapshot. The poll always
    /// wins, even against the command the user just issued.
    pub fn apply_snapshot(&mut self, raw: &RawAppliance) {
        let Some(settings) = raw.settings.as_ref() else {
            return;
        };

        if let Some(mode) = settings.reported_mode() {
            self.state.mode = mode;
            if mode != AcMode::Off {
                self.last_active_mode = Some(mode);
            }
        }
        // The vendor reports a blank temperature for modes without one;
        // the display value is kept rather than discarded, re-clamped so
        // it never leaves the reported mode's legal range.
        if let Ok(t) = settings.temp.parse::<f64>() {
            self.state.target_temperature = Some(t);
        }
        if let Some(t) = self.state.target_temperature
            && self.state.mode != AcMode::Off
        {
            let (lo, hi) = temp_bounds_for(&self.coordinator.model(), self.state.mode);
            self.state.target_temperature = Some(round_to_half(t).clamp(lo, hi));
        }
        self.state.fan = non_empty(&settings.vol);
        self.state.horizontal_swing = non_empty(&settings.dirh);
        self.state.vertical_swing = non_empty(&settings.dir);
    }

    fn axis_accepts(
        &self,
        token: &str,
        pick: impl Fn(&ModeCapability) -> &Vec<String>,
    ) -> bool {
        if token.is_empty() {
            // the placeholder entry is not a selectable value
            return false;
        }
        let model = self.coordinator.model();
        model
            .capability(self.state.mode)
            .is_some_and(|caps| pick(caps).iter().any(|v| v == token))
    }

    /// One coalesced out-of-cycle poll after a successful write. The
    /// fresh snapshot is authoritative and may override the optimistic
    /// value just stored.
    async fn finish_write(&mut self) {
        if self.coordinator.refresh().await {
            self.reconcile();
        }
    }
}

fn temp_bounds_for(model: &CapabilityModel, mode: AcMode) -> (f64, f64) {
    if let Some(caps) = model.capability(mode)
        && let (Some(lo), Some(hi)) = (caps.min_temp(), caps.max_temp())
    {
        return (lo, hi);
    }
    fallback_temp_range(mode)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Vendor precision is 0.5 degree steps.
pub(crate) fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_to_half_steps() {
        assert_eq!(round_to_half(22.3), 22.5);
        assert_eq!(round_to_half(22.1), 22.0);
        assert_eq!(round_to_half(22.25), 22.5);
        assert_eq!(round_to_half(-1.8), -2.0);
    }

    #[test]
    fn fallback_bounds_by_mode_class() {
        let model = CapabilityModel::default();
        assert_eq!(temp_bounds_for(&model, AcMode::Auto), (-2.0, 2.0));
        assert_eq!(temp_bounds_for(&model, AcMode::Heat), (15.0, 32.0));
        assert_eq!(temp_bounds_for(&model, AcMode::Cool), (15.0, 32.0));
    }
}
