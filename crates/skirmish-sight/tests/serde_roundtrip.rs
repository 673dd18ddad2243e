#![cfg(feature = "serde")]

use skirmish_grid::{EntityId, FactionId, TilePos};
use skirmish_sight::{LosConfig, LosFlags, Observer, Stat, VisibilityConfig};

#[test]
fn sight_configs_roundtrip_via_serde() {
    let los = LosConfig {
        step: 0.5,
        max_steps: 200,
    };
    let json = serde_json::to_string(&los).expect("serialize los config");
    assert_eq!(
        serde_json::from_str::<LosConfig>(&json).expect("deserialize los config"),
        los
    );

    let vis: VisibilityConfig =
        serde_json::from_str(r#"{ "full_cover_concealment": 4 }"#).expect("partial config");
    assert_eq!(vis.full_cover_concealment, 4);
    assert_eq!(vis.half_cover_concealment, 1);
    assert!(vis.fog_of_war);
}

#[test]
fn observers_roundtrip_via_serde() {
    let observer = Observer::new(EntityId(4), TilePos::new(2, 3), FactionId(1), 7.0)
        .with_detection(Stat::new(2.0).with_multiplier(1.5))
        .with_see_through(LosFlags::IGNORE_SMOKE | LosFlags::IGNORE_FOLIAGE);
    let json = serde_json::to_string(&observer).expect("serialize observer");
    let back: Observer = serde_json::from_str(&json).expect("deserialize observer");
    assert_eq!(observer, back);
    assert_eq!(back.detection.value(), 3);
}
