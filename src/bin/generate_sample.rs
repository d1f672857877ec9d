use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick an index with probability proportional to `weights`.
    fn weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut target = self.next_f64() * total;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                return i;
            }
            target -= w;
        }
        weights.len() - 1
    }
}

/// (genre, popularity weight, typical price, typical rating)
const GENRES: [(&str, f64, f64, f64); 7] = [
    ("SciFi/Fantasy", 0.30, 11.0, 4.3),
    ("Mystery", 0.20, 10.0, 4.2),
    ("Romance", 0.18, 9.0, 4.4),
    ("Children", 0.12, 7.5, 4.6),
    ("Memoir", 0.07, 16.0, 4.0),
    ("Nonfiction", 0.08, 18.0, 3.7),
    ("Poetry", 0.05, 12.0, 4.1),
];

#[derive(Serialize)]
struct SaleRow {
    order_id: u64,
    genre_desc: &'static str,
    price: f64,
    discount: f64,
    sale_date: String,
}

#[derive(Serialize)]
struct RatingRow {
    genre_desc: &'static str,
    price: f64,
    rating: u8,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let weights: Vec<f64> = GENRES.iter().map(|g| g.1).collect();
    let year_start = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid start date")?;

    // ---- Sales ----
    let sales_path = out_dir.join("df.csv");
    let mut writer = csv::Writer::from_path(&sales_path)
        .with_context(|| format!("creating {}", sales_path.display()))?;
    let mut written = 0usize;
    for order_id in 1..=2000u64 {
        let (genre, _, typical_price, _) = GENRES[rng.weighted(&weights)];
        let price = round2(rng.gauss(typical_price, typical_price * 0.25).max(2.0));
        let discount = if rng.next_f64() < 0.35 {
            round2(0.05 + rng.next_f64() * 0.35)
        } else {
            0.0
        };
        // Sales cluster around mid-year.
        let day = (rng.gauss(200.0, 90.0).clamp(0.0, 364.0)) as i64;
        let date = year_start + Duration::days(day);

        let row = SaleRow {
            order_id,
            genre_desc: genre,
            price,
            discount,
            sale_date: date.format("%Y-%m-%d").to_string(),
        };
        writer.serialize(&row)?;
        written += 1;

        // Every 50th order is exported twice, as in the raw point-of-sale dump.
        if order_id % 50 == 0 {
            writer.serialize(&row)?;
            written += 1;
        }
    }
    writer.flush()?;
    println!("Wrote {written} sales rows to {}", sales_path.display());

    // ---- Ratings ----
    let ratings_path = out_dir.join("book_rating_price.csv");
    let mut writer = csv::Writer::from_path(&ratings_path)
        .with_context(|| format!("creating {}", ratings_path.display()))?;
    for _ in 0..1500 {
        let (genre, _, typical_price, typical_rating) = GENRES[rng.weighted(&weights)];
        let price = round2(rng.gauss(typical_price, typical_price * 0.3).max(2.0));
        // Cheaper books rate slightly higher.
        let rating = rng.gauss(typical_rating - (price - typical_price) * 0.03, 0.9);
        writer.serialize(RatingRow {
            genre_desc: genre,
            price,
            rating: rating.round().clamp(1.0, 5.0) as u8,
        })?;
    }
    writer.flush()?;
    println!("Wrote 1500 rating rows to {}", ratings_path.display());

    Ok(())
}
