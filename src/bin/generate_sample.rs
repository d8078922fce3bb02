use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Buoys on the lake: (name, longitude, latitude).
const BUOYS: [(&str, f64, f64); 3] = [
    ("north", -95.3712, 38.9301),
    ("dam", -95.3530, 38.9215),
    ("west", -95.3865, 38.9142),
];

/// Depths the buoys report, deliberately wider than the viewer's allow-list.
const DEPTHS: [i64; 6] = [0, 1, 2, 4, 7, 9];

const DAYS: i64 = 14;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Surface water warms through the fortnight; each metre down is cooler.
fn water_temp(day: i64, depth: i64, rng: &mut SimpleRng) -> f64 {
    let surface = 22.0 + 0.25 * day as f64;
    let t = surface - 0.6 * depth as f64 + rng.gauss(0.0, 0.3);
    (t * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).context("invalid start date")?;

    let output_path = "sample_buoy_data.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;

    // Padded headers, as in the exports the viewer reads.
    writer.write_record(["Date", " Buoy", " Appr_depth", " Longitude", " Latitude", " Temp "])?;

    let mut rows = 0;
    for day in 0..DAYS {
        let date = start + Duration::days(day);
        for (name, lon, lat) in BUOYS {
            for depth in DEPTHS {
                // Every so often a sensor drops out.
                let temp = if rng.next_f64() < 0.03 {
                    String::new()
                } else {
                    water_temp(day, depth, &mut rng).to_string()
                };
                writer.write_record([
                    date.format("%Y-%m-%d").to_string(),
                    name.to_string(),
                    depth.to_string(),
                    lon.to_string(),
                    lat.to_string(),
                    temp,
                ])?;
                rows += 1;
            }
        }
    }
    writer.flush()?;

    println!("Wrote {rows} readings ({DAYS} days, {} buoys) to {output_path}", BUOYS.len());
    Ok(())
}
