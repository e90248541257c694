use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const HEADER: [&str; 9] = [
    "object_id",
    "object_lat",
    "object_lon",
    "acq_local_datetime",
    "acq_imaged_volume",
    "sample_dilution_factor",
    "sample_concentrated_sample_volume",
    "sample_total_volume",
    "object_area",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// One sampling station: where, when and how it was sampled.
struct Station {
    name: &'static str,
    lat: f64,
    lon: f64,
    datetime: &'static str,
    objects: usize,
}

/// Render one sample as a TSV export with the `[t]`/`[f]` type row.
fn sample_tsv(station: &Station, rng: &mut SimpleRng) -> Result<Vec<u8>> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    out.write_record(HEADER)?;
    out.write_record(["[t]", "[f]", "[f]", "[t]", "[f]", "[f]", "[f]", "[f]", "[f]"])?;

    let imaged_volume = format!("{:.3}", rng.range(0.5, 5.0));
    let dilution = if rng.next_f64() < 0.3 { "0".to_string() } else { "1".to_string() };
    let concentrated = format!("{:.1}", rng.range(10.0, 100.0));
    let total = format!("{:.1}", rng.range(500.0, 5000.0));

    for i in 0..station.objects {
        out.write_record([
            format!("{}_{i:04}", station.name),
            format!("{:.4}", station.lat),
            format!("{:.4}", station.lon),
            station.datetime.to_string(),
            imaged_volume.clone(),
            dilution.clone(),
            concentrated.clone(),
            total.clone(),
            format!("{:.2}", rng.range(50.0, 5000.0)),
        ])?;
    }

    out.into_inner()
        .map_err(|e| anyhow::anyhow!("flushing TSV buffer: {}", e.error()))
}

fn write_archive(path: &Path, members: &[(String, Vec<u8>)]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, bytes) in members {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_export"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let stations = [
        Station {
            name: "villefranche",
            lat: 43.6845,
            lon: 7.3153,
            datetime: "2023-07-04T10:15:00",
            objects: 420,
        },
        Station {
            name: "roscoff",
            lat: 48.7261,
            lon: -3.9853,
            datetime: "2023-07-12 08:30:00",
            objects: 250,
        },
        Station {
            name: "naples",
            lat: 40.8083,
            lon: 14.2500,
            datetime: "20230801",
            objects: 610,
        },
        Station {
            name: "bergen",
            lat: 60.3913,
            lon: 5.3221,
            datetime: "2023-08-15T06:00:00",
            objects: 180,
        },
        Station {
            name: "tara_oceans",
            lat: -17.5516,
            lon: -149.5585,
            datetime: "2023-09-02T21:45:00",
            objects: 95,
        },
    ];

    let mut rng = SimpleRng::new(42);
    let mut samples = Vec::with_capacity(stations.len());
    for station in &stations {
        samples.push((format!("{}.tsv", station.name), sample_tsv(station, &mut rng)?));
    }

    // First two stations loose on disk, the rest bundled in an archive.
    for (name, bytes) in &samples[..2] {
        fs::write(out_dir.join(name), bytes)?;
    }
    write_archive(&out_dir.join("cruise_2023.zip"), &samples[2..])?;

    // Re-export of the first station: identical record, dropped at assembly.
    write_archive(&out_dir.join("reexport.zip"), &samples[..1])?;

    println!(
        "Wrote {} samples (plus one duplicate) to {}",
        samples.len(),
        out_dir.display()
    );
    Ok(())
}
