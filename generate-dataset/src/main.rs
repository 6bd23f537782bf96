use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use crossbeam::{channel, thread};
use rayon::prelude::*;

/// Station names with a typical mean temperature in degrees.
const STATIONS: &[(&str, f64)] = &[
    ("Abha", 18.0),
    ("Abidjan", 26.0),
    ("Accra", 26.4),
    ("Addis Ababa", 16.0),
    ("Adelaide", 17.3),
    ("Alexandria", 20.0),
    ("Anchorage", 2.8),
    ("Ankara", 12.0),
    ("Bangkok", 28.6),
    ("Bergen", 7.7),
    ("Bulawayo", 18.9),
    ("Cairo", 21.4),
    ("Chihuahua", 18.6),
    ("Dakar", 24.0),
    ("Dikson", -11.1),
    ("Djibouti", 29.9),
    ("Dushanbe", 14.7),
    ("Hamburg", 9.7),
    ("Honiara", 26.5),
    ("Istanbul", 13.9),
    ("Jakarta", 26.7),
    ("Kuopio", 3.4),
    ("La Paz", 23.7),
    ("Lhasa", 7.6),
    ("Mogadishu", 27.1),
    ("Oslo", 5.7),
    ("Palembang", 27.3),
    ("Petropavlovsk-Kamchatsky", 1.9),
    ("Reykjavík", 4.3),
    ("St. John's", 5.0),
    ("São Paulo", 19.6),
    ("Tórshavn", 6.2),
    ("Ürümqi", 7.4),
    ("Vostok", -55.4),
    ("Yellowknife", -4.3),
    ("Zürich", 9.3),
];

#[derive(Parser, Debug)]
#[command(name = "generate-dataset")]
#[command(about = "Write a synthetic `<station>;<value>` measurement file")]
struct Args {
    /// Output file
    output: PathBuf,

    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    rows: u64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 100_000)]
    chunk_rows: u64,

    #[arg(long, help = "Use only the first N stations")]
    stations: Option<usize>,
}

fn render_chunk(
    index: u64,
    rows: u64,
    seed: u64,
    stations: &[(&str, f64)],
) -> io::Result<Vec<u8>> {
    let mut rng = fastrand::Rng::with_seed(seed ^ index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    let mut buf = Vec::with_capacity(rows as usize * 16);
    for _ in 0..rows {
        let (name, mean) = stations[rng.usize(..stations.len())];
        let noise = (rng.f64() + rng.f64() + rng.f64() - 1.5) * 20.0;
        let tenths = ((mean + noise) * 10.0).round().clamp(-999.0, 999.0) as i32;
        let sign = if tenths < 0 { "-" } else { "" };
        writeln!(buf, "{};{}{}.{}", name, sign, tenths.abs() / 10, tenths.abs() % 10)?;
    }
    Ok(buf)
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let stations = match args.stations {
        Some(n) if n > 0 => &STATIONS[..n.min(STATIONS.len())],
        _ => STATIONS,
    };
    let chunk_rows = args.chunk_rows.max(1);
    let chunks = args.rows.div_ceil(chunk_rows);
    let batch = rayon::current_num_threads() as u64 * 2;

    let file = File::create(&args.output)?;
    let (tx, rx) = channel::bounded::<Vec<u8>>(batch as usize);

    let written = thread::scope(|s| -> io::Result<u64> {
        let writer = s.spawn(move |_| -> io::Result<u64> {
            let mut out = BufWriter::with_capacity(8 * 1024 * 1024, file);
            let mut written = 0u64;
            for buf in rx {
                out.write_all(&buf)?;
                written += buf.len() as u64;
            }
            out.flush()?;
            Ok(written)
        });

        let mut start = 0;
        'batches: while start < chunks {
            let end = (start + batch).min(chunks);
            let bufs: Vec<Vec<u8>> = (start..end)
                .into_par_iter()
                .map(|index| {
                    let rows = chunk_rows.min(args.rows - index * chunk_rows);
                    render_chunk(index, rows, args.seed, stations)
                })
                .collect::<io::Result<_>>()?;
            for buf in bufs {
                // The writer only hangs up after an I/O error, reported on join.
                if tx.send(buf).is_err() {
                    break 'batches;
                }
            }
            start = end;
        }
        drop(tx);

        writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "writer thread panicked")))
    })
    .map_err(|_| io::Error::new(io::ErrorKind::Other, "Thread error"))??;

    eprintln!(
        "wrote {} rows ({} bytes) to {}",
        args.rows,
        written,
        args.output.display()
    );
    Ok(())
}
