use std::io::Write;

use fast_summary::{aggregate_file, EngineConfig, Summary};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn input(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn summarize(content: &[u8], config: &EngineConfig) -> Summary {
    let file = input(content);
    aggregate_file(file.path(), config).unwrap().summary
}

fn render(content: &[u8], workers: usize) -> String {
    let mut out = Vec::new();
    summarize(content, &EngineConfig::new(workers))
        .write_to(&mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

/// Pseudo-random but reproducible measurement file.
fn dataset(rows: usize, stations: usize, seed: u64) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut out = Vec::new();
    for _ in 0..rows {
        let station = rng.usize(..stations);
        let tenths = rng.i32(-999..=999);
        writeln!(
            out,
            "Station {:03};{}{}.{}",
            station,
            if tenths < 0 { "-" } else { "" },
            tenths.abs() / 10,
            tenths.abs() % 10
        )
        .unwrap();
    }
    out
}

#[test]
fn test_basic_scenario() {
    assert_eq!(
        render(b"A;1.0\nB;-2.5\nA;3.0\n", 1),
        "{A=1.0/2.0/3.0, B=-2.5/-2.5/-2.5}\n"
    );
}

#[test]
fn test_extremes_scenario() {
    assert_eq!(render(b"X;99.9\nX;-99.9\n", 1), "{X=-99.9/0.0/99.9}\n");
    assert_eq!(render(b"X;99.9\nX;-99.9\n", 4), "{X=-99.9/0.0/99.9}\n");
}

#[test]
fn test_empty_file() {
    assert_eq!(render(b"", 1), "{}\n");
    assert_eq!(render(b"", 8), "{}\n");
}

#[test]
fn test_repeated_key_sum_is_exact() {
    let content = "Same;10.0\n".repeat(1000);
    let summary = summarize(content.as_bytes(), &EngineConfig::new(3));
    let stats = summary.get(b"Same").unwrap();
    assert_eq!(stats.count(), 1000);
    assert_eq!(stats.sum(), 100_000);
    assert_eq!(stats.mean(), 100.0);
    assert_eq!(summary.to_string(), "{Same=10.0/10.0/10.0}");
}

#[test]
fn test_worker_count_does_not_change_result() {
    let content = dataset(20_000, 150, 7);
    let baseline = summarize(&content, &EngineConfig::new(1));
    assert_eq!(baseline.len(), 150);

    for workers in [2, 3, 5, 8, 13] {
        for block_size in [64, 1000, 1 << 20] {
            let config = EngineConfig::new(workers).with_block_size(block_size);
            assert_eq!(
                summarize(&content, &config),
                baseline,
                "workers {} block size {}",
                workers,
                block_size
            );
        }
    }
}

#[test]
fn test_every_line_counted_once_with_uneven_split() {
    let content = dataset(997, 10, 11);
    let file = input(&content);
    let run = aggregate_file(file.path(), &EngineConfig::new(7).with_block_size(37)).unwrap();
    assert_eq!(run.lines, 997);
    assert_eq!(run.skipped, 0);
    let total: u64 = run.summary.entries().map(|(_, stats)| stats.count()).sum();
    assert_eq!(total, 997);
}

#[test]
fn test_more_workers_than_lines() {
    assert_eq!(render(b"k;1.0\nk;2.0\n", 32), "{k=1.0/1.5/2.0}\n");
}

#[test]
fn test_no_trailing_newline() {
    assert_eq!(render(b"A;1.0\nB;2.0", 2), "{A=1.0/1.0/1.0, B=2.0/2.0/2.0}\n");
}

#[test]
fn test_mean_between_min_and_max() {
    let summary = summarize(&dataset(5_000, 40, 3), &EngineConfig::new(4));
    for (key, stats) in summary.entries() {
        let (min, max) = (stats.min() as f64, stats.max() as f64);
        assert!(min <= stats.mean() && stats.mean() <= max, "{:?}", key);
    }
}

#[test]
fn test_rerun_is_byte_identical() {
    let content = dataset(3_000, 25, 99);
    let file = input(&content);
    let first = aggregate_file(file.path(), &EngineConfig::new(4)).unwrap();
    let second = aggregate_file(file.path(), &EngineConfig::new(4)).unwrap();
    assert_eq!(first.summary.to_string(), second.summary.to_string());
}

#[test]
fn test_small_table_spills_without_changing_result() {
    let content = dataset(4_000, 300, 5);
    let roomy = summarize(&content, &EngineConfig::new(2));
    let cramped = summarize(&content, &EngineConfig::new(2).with_table_bits(6));
    assert_eq!(cramped, roomy);
    assert!(roomy.len() > 48);
}

#[test]
fn test_lenient_and_strict_policies() {
    let content = b"A;1.0\nA;2\nA;3.25\r\nbad line\nB;-1.0\n";
    let file = input(content);

    let lenient = aggregate_file(file.path(), &EngineConfig::new(1)).unwrap();
    assert_eq!(lenient.lines, 4);
    assert_eq!(lenient.skipped, 1);
    assert_eq!(lenient.summary.to_string(), "{A=1.0/2.1/3.3, B=-1.0/-1.0/-1.0}");

    let strict = aggregate_file(file.path(), &EngineConfig::new(1).with_strict(true)).unwrap();
    assert_eq!(strict.lines, 2);
    assert_eq!(strict.skipped, 3);
    assert_eq!(strict.summary.to_string(), "{A=1.0/1.0/1.0, B=-1.0/-1.0/-1.0}");
}

#[test]
fn test_keys_sorted_bytewise() {
    assert_eq!(
        render("b;1.0\nÅland;1.0\nB;1.0\na;1.0\n".as_bytes(), 2),
        "{B=1.0/1.0/1.0, a=1.0/1.0/1.0, b=1.0/1.0/1.0, Åland=1.0/1.0/1.0}\n"
    );
}
