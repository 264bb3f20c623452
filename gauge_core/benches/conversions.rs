use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use gauge_core::config::DesignCapacity;
use gauge_core::estimator::Estimator;
use gauge_core::snapshot::Snapshot;
use gauge_core::telemetry::{
    Telemetry, charge_percent_from_raw, crate_from_raw, voltage_uv_from_raw,
};

// Synthetic register frames: slow discharge with a noisy C-rate.
fn synth_frames(n: usize, seed: u32) -> Vec<(u16, u16, u16)> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    (0..n)
        .map(|i| {
            let soc = (25_600 - (i % 25_600)) as u16;
            let vcell = 42_240 + (soc / 2);
            let crate_raw = -40i16 + (next() % 81) as i16;
            (vcell, soc, crate_raw as u16)
        })
        .collect()
}

pub fn bench_snapshot_pipeline(c: &mut Criterion) {
    let mut g = c.benchmark_group("snapshot_pipeline");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p gauge_core --bench conversions
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let frames = synth_frames(10_000, 0xC0FFEE);
    let estimator = Estimator::new(DesignCapacity::default());

    g.bench_function("raw_to_telemetry", |b| {
        b.iter_batched(
            || frames.clone(),
            |fs| {
                for (v, s, r) in fs {
                    let t = Telemetry {
                        voltage_uv: voltage_uv_from_raw(black_box(v)),
                        charge_percent: charge_percent_from_raw(black_box(s)),
                        crate_raw: crate_from_raw(black_box(r)),
                    };
                    black_box(t);
                }
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("raw_to_snapshot", |b| {
        b.iter_batched(
            || frames.clone(),
            |fs| {
                for (v, s, r) in fs {
                    let t = Telemetry {
                        voltage_uv: voltage_uv_from_raw(v),
                        charge_percent: charge_percent_from_raw(s),
                        crate_raw: crate_from_raw(r),
                    };
                    black_box(Snapshot::from_telemetry(black_box(t), &estimator));
                }
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(conversions, bench_snapshot_pipeline);
criterion_main!(conversions);
