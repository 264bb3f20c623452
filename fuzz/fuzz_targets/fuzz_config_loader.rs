#![no_main]
use libfuzzer_sys::fuzz_target;

use gauge_core::config::{DesignCapacity, IntervalPolicy, MAX_CHARGE_UAH, MAX_ENERGY_UWH};

fuzz_target!(|data: &str| {
    // Parse and validate must reject bad input without panicking.
    let Ok(cfg) = gauge_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // Any validated config resolves to clamped design values and non-zero intervals.
    let design = DesignCapacity::from(&cfg.battery);
    assert!((1..=MAX_CHARGE_UAH).contains(&design.charge_full_design_uah()));
    assert!((1..=MAX_ENERGY_UWH).contains(&design.energy_full_design_uwh()));
    let policy = IntervalPolicy::from(&cfg.refresh);
    assert!(!policy.interval(true).is_zero());
    assert!(!policy.interval(false).is_zero());
});
