use criterion::{Criterion, black_box, criterion_group, criterion_main};
use curvex_experiment::parse_trials;

fn trial_file(rows: usize) -> String {
    let mut text = String::from(
        "n,R1,R2,width,segments,rotationSpeed,rotationDirection,arrowPointIndex,isDashed,dashSpeed,isSelfRotating,arrowDirection\n",
    );
    for i in 0..rows {
        let dashed = i % 3 != 0;
        text.push_str(&format!(
            "3,1,1.5,0.02,1000,{},{},{},{},{},True,{}\n",
            30 + i % 60,
            if i % 2 == 0 { "CW" } else { "CCW" },
            i % 1000,
            if dashed { "True" } else { "False" },
            if i % 4 < 2 { 1.5 } else { -1.5 },
            i % 2,
        ));
    }
    text
}

pub fn bench_parse(c: &mut Criterion) {
    let mut g = c.benchmark_group("parse_trials");
    for rows in [64, 1024] {
        let text = trial_file(rows);
        g.bench_function(format!("{}_rows", rows), |b| {
            b.iter(|| black_box(parse_trials(black_box(&text))))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
