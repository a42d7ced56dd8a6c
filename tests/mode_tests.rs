use remo_aircon::{AcMode, AirconSettings, DisplayState, RawAppliance};

#[test]
fn mode_wire_roundtrip() {
    for mode in [
        AcMode::Auto,
        AcMode::Heat,
        AcMode::Cool,
        AcMode::Dry,
        AcMode::FanOnly,
    ] {
        let token = mode.as_remo_str().expect("every on-mode has a token");
        assert_eq!(AcMode::from_remo_str(token), Some(mode));
    }
}

#[test]
fn off_has_no_wire_token() {
    assert_eq!(AcMode::Off.as_remo_str(), None);
}

#[test]
fn heat_accepts_both_vendor_spellings() {
    assert_eq!(AcMode::from_remo_str("warm"), Some(AcMode::Heat));
    assert_eq!(AcMode::from_remo_str("heat"), Some(AcMode::Heat));
}

#[test]
fn unknown_token_maps_to_none() {
    assert_eq!(AcMode::from_remo_str("turbo"), None);
    assert_eq!(AcMode::from_remo_str(""), None);
}

#[test]
fn canonical_sort_puts_off_first() {
    let mut modes = vec![AcMode::FanOnly, AcMode::Cool, AcMode::Off, AcMode::Auto];
    modes.sort();
    assert_eq!(
        modes,
        vec![AcMode::Off, AcMode::Auto, AcMode::Cool, AcMode::FanOnly]
    );
}

#[test]
fn power_off_button_wins_over_stored_mode() {
    let settings = AirconSettings {
        mode: "cool".to_string(),
        button: "power-off".to_string(),
        ..Default::default()
    };
    assert_eq!(settings.reported_mode(), Some(AcMode::Off));

    let settings = AirconSettings {
        mode: "cool".to_string(),
        ..Default::default()
    };
    assert_eq!(settings.reported_mode(), Some(AcMode::Cool));
}

#[test]
fn unknown_reported_mode_is_none() {
    let settings = AirconSettings {
        mode: "mystery".to_string(),
        ..Default::default()
    };
    assert_eq!(settings.reported_mode(), None);
}

#[test]
fn appliance_type_filter() {
    let ac: RawAppliance =
        serde_json::from_value(serde_json::json!({"id": "a", "type": "AC"})).unwrap();
    let tv: RawAppliance =
        serde_json::from_value(serde_json::json!({"id": "b", "type": "TV"})).unwrap();
    assert!(ac.is_aircon());
    assert!(!tv.is_aircon());
}

#[test]
fn display_state_starts_inert() {
    let state = DisplayState::default();
    assert_eq!(state.mode, AcMode::Off);
    assert_eq!(state.target_temperature, None);
    assert_eq!(state.fan, None);
    assert_eq!(state.horizontal_swing, None);
    assert_eq!(state.vertical_swing, None);
}
