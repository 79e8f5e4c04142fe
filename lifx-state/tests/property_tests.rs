//! Property-based tests for the registry and a polling tick
//!
//! Each property drives a scripted bulb through a random sequence of reported
//! states, one tick per state, and checks what the consumer side sees.

use proptest::prelude::*;
use std::sync::Arc;

use lifx_device::dummy::DummyBulb;
use lifx_device::{Color, Device, Power};
use lifx_state::{poll_tick, DeviceRegistry};

// ============================================================================
// Test Helpers
// ============================================================================

fn registered_bulb(power: Power, color: Color) -> (DeviceRegistry, Arc<DummyBulb>) {
    let registry = DeviceRegistry::new();
    let bulb = Arc::new(DummyBulb::new("Bulb", power, color));
    registry.register([Arc::clone(&bulb) as Arc<dyn Device>]);
    (registry, bulb)
}

/// Strategy for power levels; biased towards the two canonical values
fn power_strategy() -> impl Strategy<Value = Power> {
    prop_oneof![
        Just(Power::OFF),
        Just(Power::ON),
        any::<u16>().prop_map(Power),
    ]
}

/// Strategy for colors with a small alphabet so repeats are common
fn color_strategy() -> impl Strategy<Value = Color> {
    (0u16..3, 0u16..3, 0u16..3, prop_oneof![Just(2500u16), Just(9000u16)])
        .prop_map(|(h, s, b, k)| Color::new(h, s, b, k))
}

// ============================================================================
// Cache always holds the value just read
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cache_matches_last_read(
        initial in (power_strategy(), color_strategy()),
        reported in prop::collection::vec((power_strategy(), color_strategy()), 1..8),
        drain_every_tick in any::<bool>(),
    ) {
        let (registry, bulb) = registered_bulb(initial.0, initial.1);

        for (power, color) in reported {
            bulb.set_reported_power(power);
            bulb.set_reported_color(color);
            poll_tick(&registry, 8);

            prop_assert_eq!(registry.cached_power("Bulb").unwrap(), power);
            prop_assert_eq!(registry.cached_color("Bulb").unwrap(), color);

            if drain_every_tick {
                while registry.drain_power_queue("Bulb").unwrap().is_some() {}
                while registry.drain_color_queue("Bulb").unwrap().is_some() {}
            }
        }
    }
}

// ============================================================================
// A change queues exactly one entry; no change queues nothing
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_change_triggers_single_enqueue(
        initial in power_strategy(),
        next in power_strategy(),
        color in color_strategy(),
    ) {
        let (registry, bulb) = registered_bulb(initial, color);

        bulb.set_reported_power(next);
        poll_tick(&registry, 8);

        let expected = usize::from(initial != next);
        prop_assert_eq!(registry.pending_power_changes("Bulb").unwrap(), expected);
        prop_assert_eq!(registry.pending_color_changes("Bulb").unwrap(), 0);
    }
}

// ============================================================================
// Draining yields changes in observation order, without coalescing
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_queue_is_fifo(
        initial in color_strategy(),
        reported in prop::collection::vec(color_strategy(), 1..12),
    ) {
        let (registry, bulb) = registered_bulb(Power::ON, initial);

        let mut expected = Vec::new();
        let mut last = initial;
        for color in reported {
            bulb.set_reported_color(color);
            poll_tick(&registry, 8);
            if color != last {
                expected.push(color);
                last = color;
            }
        }

        let mut drained = Vec::new();
        while let Some(color) = registry.drain_color_queue("Bulb").unwrap() {
            drained.push(color);
        }
        prop_assert_eq!(drained, expected);
    }
}
