use gauge_core::GaugeError;
use gauge_core::mocks::ScriptedReader;
use gauge_core::telemetry::{
    TelemetryEngine, charge_percent_from_raw, crate_from_raw, voltage_uv_from_raw,
};
use gauge_traits::Register;
use rstest::rstest;

#[rstest]
#[case(0x0000, 0)]
#[case(0x0001, 78)]
#[case(0x0008, 625)]
#[case(53_760, 4_200_000)]
#[case(0xFFFF, 5_119_921)]
fn voltage_truncates_toward_zero(#[case] raw: u16, #[case] uv: i64) {
    assert_eq!(voltage_uv_from_raw(raw), uv);
}

#[rstest]
#[case(0, 0)]
#[case(255, 0)]
#[case(256, 1)]
#[case(50 * 256 + 255, 50)]
#[case(25_600, 100)]
#[case(25_856, 100)]
#[case(0xFFFF, 100)]
fn charge_percent_clamps_at_100(#[case] raw: u16, #[case] pct: u8) {
    assert_eq!(charge_percent_from_raw(raw), pct);
}

#[rstest]
#[case(0x0005, 5)]
#[case(0x7FFF, 32_767)]
#[case(0x8000, -32_768)]
#[case(0xFFFF, -1)]
#[case(0xFFEC, -20)]
fn crate_is_sign_extended(#[case] raw: u16, #[case] value: i16) {
    assert_eq!(crate_from_raw(raw), value);
}

#[test]
fn conversions_are_idempotent() {
    for raw in [0u16, 1, 255, 256, 25_600, 0x8000, 0xFFFF] {
        assert_eq!(voltage_uv_from_raw(raw), voltage_uv_from_raw(raw));
        assert_eq!(charge_percent_from_raw(raw), charge_percent_from_raw(raw));
        assert_eq!(crate_from_raw(raw), crate_from_raw(raw));
    }
}

#[test]
fn engine_reads_each_register_once() {
    let reader = ScriptedReader::new().with_telemetry(53_760, 96 * 256, -20);
    let probe = reader.clone();
    let mut engine = TelemetryEngine::new(reader);

    let t = engine.read_all().unwrap();
    assert_eq!(t.voltage_uv, 4_200_000);
    assert_eq!(t.charge_percent, 96);
    assert_eq!(t.crate_raw, -20);
    assert_eq!(probe.reads(Register::Vcell), 1);
    assert_eq!(probe.reads(Register::Soc), 1);
    assert_eq!(probe.reads(Register::Crate), 1);
    assert_eq!(probe.reads(Register::Status), 0);
}

#[test]
fn transport_errors_carry_the_register() {
    let reader = ScriptedReader::new().with_telemetry(53_760, 50 * 256, 0);
    reader.fail(Register::Crate, "i2c bus fault");
    let mut engine = TelemetryEngine::new(reader);

    let err = engine.read_crate().unwrap_err();
    assert_eq!(
        err,
        GaugeError::Transport {
            register: Register::Crate,
            message: "i2c bus fault".into(),
        }
    );
    // Other registers are unaffected.
    assert_eq!(engine.read_charge_percent().unwrap(), 50);
}

#[test]
fn timeouts_map_to_timeout_variant() {
    let reader = ScriptedReader::new();
    reader.fail(Register::Vcell, "read timed out");
    let mut engine = TelemetryEngine::new(reader);
    assert_eq!(
        engine.read_voltage().unwrap_err(),
        GaugeError::TransportTimeout {
            register: Register::Vcell
        }
    );
}

#[rstest]
#[case(Register::Vcell)]
#[case(Register::Soc)]
#[case(Register::Crate)]
fn read_all_fails_if_any_register_fails(#[case] failing: Register) {
    let reader = ScriptedReader::new().with_telemetry(53_760, 50 * 256, -20);
    reader.fail(failing, "nack");
    let mut engine = TelemetryEngine::new(reader);
    let err = engine.read_all().unwrap_err();
    assert_eq!(err.register(), Some(failing));
    assert!(err.is_transport());
}
