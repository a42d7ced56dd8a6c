use std::collections::BTreeMap;

use tracing::trace;

use crate::types::{AcMode, ModeRange, RawAppliance};

/// Clamp range for modes whose capability document exposes no numeric
/// temperatures. The auto mode on these units takes a signed offset
/// around the unit's own base point; everything else takes an absolute
/// celsius target.
pub(crate) fn fallback_temp_range(mode: AcMode) -> (f64, f64) {
    match mode {
        AcMode::Auto => (-2.0, 2.0),
        _ => (15.0, 32.0),
    }
}

/// Option lists for one mode. String axes keep the vendor's single
/// empty-string entry when an axis is not adjustable; the temperature
/// list keeps it as a leading `None`. Lists are never empty: the
/// rendering layer always gets at least the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeCapability {
    pub temperatures: Vec<Option<f64>>,
    pub fan_speeds: Vec<String>,
    pub horizontal_swing: Vec<String>,
    pub vertical_swing: Vec<String>,
}

impl ModeCapability {
    fn placeholder() -> Self {
        Self {
            temperatures: vec![None],
            fan_speeds: vec![String::new()],
            horizontal_swing: vec![String::new()],
            vertical_swing: vec![String::new()],
        }
    }

    /// Lower bound of the numeric temperature subset, if any.
    pub fn min_temp(&self) -> Option<f64> {
        self.temperatures.iter().copied().flatten().next()
    }

    /// Upper bound of the numeric temperature subset, if any.
    pub fn max_temp(&self) -> Option<f64> {
        self.temperatures.iter().copied().flatten().last()
    }

    /// False when the temperature axis only carries the placeholder.
    pub fn has_temperatures(&self) -> bool {
        self.temperatures.iter().any(|t| t.is_some())
    }
}

/// Normalized capability snapshot for one appliance. Rebuilt from the
/// raw listing on every poll and replaced wholesale; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityModel {
    /// Selectable modes, off first, then the fixed canonical order.
    pub mode_order: Vec<AcMode>,
    modes: BTreeMap<AcMode, ModeCapability>,
}

impl Default for CapabilityModel {
    /// The model before any successful poll: only off is selectable.
    fn default() -> Self {
        normalize(&RawAppliance::default())
    }
}

impl CapabilityModel {
    pub fn capability(&self, mode: AcMode) -> Option<&ModeCapability> {
        self.modes.get(&mode)
    }

    pub fn supports(&self, mode: AcMode) -> bool {
        self.modes.contains_key(&mode)
    }
}

/// Build the normalized model from one raw appliance document.
///
/// Never fails: unknown vendor mode keys are dropped, unparsable
/// temperature entries are dropped, and missing axes degrade to the
/// not-adjustable placeholder. Off is always present and always first.
pub fn normalize(raw: &RawAppliance) -> CapabilityModel {
    let mut mode_order = vec![AcMode::Off];
    let mut modes = BTreeMap::new();
    modes.insert(AcMode::Off, ModeCapability::placeholder());

    if let Some(aircon) = raw.aircon.as_ref() {
        for (key, range) in &aircon.range.modes {
            let Some(mode) = AcMode::from_remo_str(key) else {
                trace!(%key, "unrecognized vendor mode, skipping");
                continue;
            };
            if modes.contains_key(&mode) {
                continue;
            }
            mode_order.push(mode);
            modes.insert(mode, mode_capability(range));
        }
    }

    // Fixed display order regardless of vendor iteration order.
    mode_order.sort();

    CapabilityModel { mode_order, modes }
}

fn mode_capability(range: &ModeRange) -> ModeCapability {
    ModeCapability {
        temperatures: temperature_values(&range.temp),
        fan_speeds: option_list(&range.vol),
        horizontal_swing: option_list(&range.dirh),
        vertical_swing: option_list(&range.dir),
    }
}

/// Parse, sort and dedupe the numeric entries; the vendor's empty
/// placeholder survives as a single leading `None`.
fn temperature_values(raw: &[String]) -> Vec<Option<f64>> {
    let mut has_placeholder = false;
    let mut numeric: Vec<f64> = Vec::new();
    for entry in raw {
        if entry.is_empty() {
            has_placeholder = true;
        } else if let Ok(v) = entry.parse::<f64>()
            && v.is_finite()
        {
            numeric.push(v);
        }
    }
    numeric.sort_by(f64::total_cmp);
    numeric.dedup();

    let mut values = Vec::with_capacity(numeric.len() + 1);
    if has_placeholder || numeric.is_empty() {
        values.push(None);
    }
    values.extend(numeric.into_iter().map(Some));
    values
}

fn option_list(raw: &[String]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for entry in raw {
        if !values.contains(entry) {
            values.push(entry.clone());
        }
    }
    if values.is_empty() {
        values.push(String::new());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn appliance(value: serde_json::Value) -> RawAppliance {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_document_yields_off_only() {
        let model = normalize(&RawAppliance::default());
        assert_eq!(model.mode_order, vec![AcMode::Off]);
        let off = model.capability(AcMode::Off).unwrap();
        assert_eq!(off.temperatures, vec![None]);
        assert_eq!(off.fan_speeds, vec![String::new()]);
        assert_eq!(off.horizontal_swing, vec![String::new()]);
        assert_eq!(off.vertical_swing, vec![String::new()]);
    }

    #[test]
    fn default_model_matches_empty_document() {
        assert_eq!(CapabilityModel::default(), normalize(&RawAppliance::default()));
    }

    #[test]
    fn blow_only_document() {
        let raw = appliance(json!({
            "id": "ac-1",
            "type": "AC",
            "aircon": {"range": {"modes": {
                "blow": {"temp": [""], "vol": ["auto", "1", "2"], "dir": [], "dirh": []}
            }}}
        }));
        let model = normalize(&raw);
        assert_eq!(model.mode_order, vec![AcMode::Off, AcMode::FanOnly]);
        let blow = model.capability(AcMode::FanOnly).unwrap();
        assert_eq!(blow.temperatures, vec![None]);
        assert!(!blow.has_temperatures());
        assert_eq!(blow.fan_speeds, vec!["auto", "1", "2"]);
        assert_eq!(blow.horizontal_swing, vec![String::new()]);
    }

    #[test]
    fn cool_temperatures_sorted_with_bounds() {
        let raw = appliance(json!({
            "id": "ac-1",
            "aircon": {"range": {"modes": {
                "cool": {"temp": ["20", "18", "32", "18.5", "25"], "vol": ["auto"]}
            }}}
        }));
        let model = normalize(&raw);
        let cool = model.capability(AcMode::Cool).unwrap();
        assert_eq!(
            cool.temperatures,
            vec![Some(18.0), Some(18.5), Some(20.0), Some(25.0), Some(32.0)]
        );
        assert_eq!(cool.min_temp(), Some(18.0));
        assert_eq!(cool.max_temp(), Some(32.0));
    }

    #[test]
    fn unknown_vendor_keys_dropped() {
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "cool": {"temp": ["25"], "vol": ["auto"]},
                "turbo": {"temp": ["25"], "vol": ["auto"]},
                "x-eco": {"temp": ["25"]}
            }}}
        }));
        let model = normalize(&raw);
        assert_eq!(model.mode_order, vec![AcMode::Off, AcMode::Cool]);
        assert!(!model.supports(AcMode::Heat));
    }

    #[test]
    fn unparsable_temperature_entries_discarded() {
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "warm": {"temp": ["low", "18", "??", "23"], "vol": ["1"]}
            }}}
        }));
        let heat = normalize(&raw).capability(AcMode::Heat).cloned().unwrap();
        assert_eq!(heat.temperatures, vec![Some(18.0), Some(23.0)]);
    }

    #[test]
    fn all_unparsable_degrades_to_placeholder() {
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "dry": {"temp": ["hot", "cold"]}
            }}}
        }));
        let dry = normalize(&raw).capability(AcMode::Dry).cloned().unwrap();
        assert_eq!(dry.temperatures, vec![None]);
        assert_eq!(dry.min_temp(), None);
    }

    #[test]
    fn placeholder_kept_alongside_numbers() {
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "auto": {"temp": ["", "-2", "-1", "0", "1", "2"]}
            }}}
        }));
        let auto = normalize(&raw).capability(AcMode::Auto).cloned().unwrap();
        assert_eq!(auto.temperatures[0], None);
        assert_eq!(auto.min_temp(), Some(-2.0));
        assert_eq!(auto.max_temp(), Some(2.0));
    }

    #[test]
    fn duplicate_canonical_mode_first_wins() {
        // "warm" and "heat" both map to Heat; BTreeMap iterates "heat"
        // before "warm", so its lists win.
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "heat": {"temp": ["20"], "vol": ["1"]},
                "warm": {"temp": ["25"], "vol": ["2"]}
            }}}
        }));
        let model = normalize(&raw);
        assert_eq!(model.mode_order, vec![AcMode::Off, AcMode::Heat]);
        let heat = model.capability(AcMode::Heat).unwrap();
        assert_eq!(heat.temperatures, vec![Some(20.0)]);
    }

    #[test]
    fn mode_order_follows_canonical_priority() {
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "blow": {"vol": ["auto"]},
                "cool": {"temp": ["18"]},
                "warm": {"temp": ["15"]},
                "auto": {"temp": [""]},
                "dry": {"temp": ["22"]}
            }}}
        }));
        let model = normalize(&raw);
        assert_eq!(
            model.mode_order,
            vec![
                AcMode::Off,
                AcMode::Auto,
                AcMode::Heat,
                AcMode::Cool,
                AcMode::Dry,
                AcMode::FanOnly,
            ]
        );
    }

    #[test]
    fn duplicate_option_tokens_deduped() {
        let raw = appliance(json!({
            "aircon": {"range": {"modes": {
                "cool": {"temp": ["25", "25", "24"], "vol": ["auto", "auto", "1"]}
            }}}
        }));
        let cool = normalize(&raw).capability(AcMode::Cool).cloned().unwrap();
        assert_eq!(cool.temperatures, vec![Some(24.0), Some(25.0)]);
        assert_eq!(cool.fan_speeds, vec!["auto", "1"]);
    }
}
