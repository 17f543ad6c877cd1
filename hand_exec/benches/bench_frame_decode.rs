//! # Frame Decode Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::hand::{decode, TelemetryFrame};
use hand_lib::{
    calib::CalibStore,
    digits::Digit,
    kin_map::{finger_angles, wrist_pose, KinMap, Params},
};
use util::module::State;

fn frame_decode_benchmark(c: &mut Criterion) {
    // ---- Telemetry line as sent by the glove ----

    let line = "512,600,700,800,300,123.45,67.89,-12.5,0.01,-0.02,9.81\r\n";

    c.bench_function("decode", |b| b.iter(|| decode(black_box(line))));

    // ---- Full pipeline ----

    let calib = CalibStore::with_offsets([5, -3, 0, 12, -8]);

    let mut kin_map = KinMap::default();
    kin_map
        .init(
            Params {
                joint_counts: [3, 3, 3, 3, 2],
                ..Default::default()
            },
            None,
        )
        .unwrap();

    c.bench_function("decode_calib_map", |b| {
        b.iter(|| {
            let frame = decode(black_box(line)).unwrap();
            let frame = TelemetryFrame {
                pots: calib.apply(frame.pots),
                ..frame
            };
            kin_map.proc(&frame).unwrap()
        })
    });

    // ---- Individual mappings ----

    c.bench_function("finger_angles", |b| {
        b.iter(|| finger_angles(Digit::Index, black_box(700), black_box(3)))
    });

    c.bench_function("wrist_pose", |b| {
        b.iter(|| {
            wrist_pose(
                black_box(-56.55),
                black_box(-22.11),
                black_box(-192.5),
                [0.01, -0.02, 9.81],
            )
        })
    });
}

criterion_group!(benches, frame_decode_benchmark);
criterion_main!(benches);
