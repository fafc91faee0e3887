use criterion::{criterion_group, criterion_main, Criterion};
use sealcheck_archive::{list_files, Sha256Digester};
use sealcheck_core::{digest_files, reconcile, ActualEntry, ExpectedMap};
use sealcheck_manifest::{Digest, RelativeKey};
use std::fs;
use std::sync::atomic::AtomicBool;

fn digest_for(i: usize) -> Digest {
    Digest::parse(&format!("{i:064x}")).unwrap()
}

fn key_for(i: usize) -> RelativeKey {
    RelativeKey::parse(&format!("dir{}/file_{i:05}.bin", i % 16)).unwrap()
}

fn bench_reconcile(c: &mut Criterion) {
    let expected: ExpectedMap = (0..10_000).map(|i| (key_for(i), digest_for(i))).collect();
    // Shifted window: mostly matched, some mismatched, some on one side only.
    let actual: Vec<ActualEntry> = (500..10_500)
        .map(|i| ActualEntry {
            key: key_for(i),
            size: 0,
            digest: Ok(digest_for(if i % 50 == 0 { i + 1 } else { i })),
        })
        .collect();

    c.bench_function("reconcile_10k_keys", |b| {
        b.iter(|| reconcile(&expected, &actual));
    });
}

fn bench_digest_files(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..200 {
        fs::write(
            dir.path().join(format!("file_{i:03}.bin")),
            vec![(i % 251) as u8; 16 * 1024],
        )
        .unwrap();
    }
    let files = list_files(dir.path()).unwrap();
    let cancel = AtomicBool::new(false);

    for jobs in [1, 4] {
        c.bench_function(&format!("digest_200_files_{jobs}_jobs"), |b| {
            b.iter(|| digest_files(&files, &Sha256Digester, jobs, &cancel, &|_: usize| {}).unwrap());
        });
    }
}

criterion_group!(benches, bench_reconcile, bench_digest_files);
criterion_main!(benches);
