//! Fleet Telemetry Simulation
//!
//! Generates realistic vehicle sensor readings and posts them to a running
//! Fleet Sentinel instance. Simulates nominal urban driving with occasional
//! degradation bursts (hot motor + collapsing battery) to exercise the
//! failure and anomaly paths.
//!
//! # Usage
//! ```bash
//! ./simulation --url http://localhost:8080 --vehicles 1,2,3 --interval-ms 1000
//! ```

use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::time::Duration;

use fleet_sentinel::types::ReadingPayload;

// ============================================================================
// Driving Constants
// ============================================================================

/// Baseline cruise speed (km/h)
const BASE_SPEED: f64 = 45.0;
/// Baseline motor temperature (degrees C)
const BASE_TEMP: f64 = 55.0;
/// Battery drain per reading (%)
const BATTERY_DRAIN: f64 = 0.02;
/// Probability of entering a degradation burst per reading
const ANOMALY_PROB: f64 = 0.05;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleet-simulation")]
#[command(about = "Synthetic telemetry producer for Fleet Sentinel testing")]
#[command(version = "1.0")]
struct Args {
    /// Base URL of the running service
    #[arg(long, default_value = "http://localhost:8080")]
    url: String,

    /// Comma-separated vehicle ids to simulate
    #[arg(long, default_value = "1")]
    vehicles: String,

    /// Delay between readings per vehicle (milliseconds, 0 = no delay)
    #[arg(long, default_value = "1000")]
    interval_ms: u64,

    /// Total readings to send per vehicle (0 = run until interrupted)
    #[arg(long, default_value = "0")]
    count: u64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Vehicle Model
// ============================================================================

/// Per-vehicle state drifting over the run.
struct VehicleSim {
    id: u64,
    battery: f64,
    lat: f64,
    lon: f64,
    /// Readings left in the current degradation burst
    degraded_for: u32,
}

impl VehicleSim {
    fn new(id: u64, rng: &mut StdRng) -> Self {
        Self {
            id,
            battery: rng.gen_range(60.0..100.0),
            lat: 37.0 + rng.gen_range(0.0..1.0),
            lon: -122.5 + rng.gen_range(0.0..0.5),
            degraded_for: 0,
        }
    }

    fn next_reading(&mut self, rng: &mut StdRng, noise: &Noise) -> ReadingPayload {
        self.battery = (self.battery - BATTERY_DRAIN).max(0.0);
        self.lat += rng.gen_range(-0.0005..0.0005);
        self.lon += rng.gen_range(-0.0005..0.0005);

        if self.degraded_for == 0 && rng.gen_bool(ANOMALY_PROB) {
            self.degraded_for = rng.gen_range(3..10);
            eprintln!("vehicle {}: entering degradation burst", self.id);
        }

        let (temp, battery) = if self.degraded_for > 0 {
            self.degraded_for -= 1;
            (rng.gen_range(95.0..125.0), rng.gen_range(5.0..15.0))
        } else {
            (
                BASE_TEMP + rng.gen_range(-5.0..10.0),
                self.battery,
            )
        };

        ReadingPayload {
            vehicle_id: self.id,
            gps_lat: Some((self.lat * 1e6).round() / 1e6),
            gps_lon: Some((self.lon * 1e6).round() / 1e6),
            speed: Some((BASE_SPEED + noise.speed.sample(rng)).max(0.0)),
            battery: Some(battery),
            acc_x: Some(noise.accel.sample(rng)),
            acc_y: Some(noise.accel.sample(rng)),
            acc_z: Some(9.81 + noise.accel.sample(rng)),
            temp_motor: Some(temp),
            raw_payload: Some(serde_json::json!({
                "sensor_version": "v2.1.0",
                "source": "simulation",
            })),
        }
    }
}

/// Gaussian noise sources shared across vehicles.
struct Noise {
    speed: Normal<f64>,
    accel: Normal<f64>,
}

// ============================================================================
// Main Loop
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let noise = Noise {
        speed: Normal::new(0.0, 8.0)?,
        accel: Normal::new(0.0, 0.4)?,
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let vehicle_ids: Vec<u64> = args
        .vehicles
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if vehicle_ids.is_empty() {
        anyhow::bail!("--vehicles must name at least one numeric vehicle id");
    }

    let mut sims: Vec<VehicleSim> = vehicle_ids
        .iter()
        .map(|&id| VehicleSim::new(id, &mut rng))
        .collect();

    let endpoint = format!("{}/api/v1/sensor-data", args.url.trim_end_matches('/'));
    let client = reqwest::Client::new();

    eprintln!(
        "Simulating {} vehicle(s) against {} every {}ms",
        sims.len(),
        endpoint,
        args.interval_ms
    );

    let mut sent: u64 = 0;
    loop {
        for sim in &mut sims {
            let payload = sim.next_reading(&mut rng, &noise);
            match client.post(&endpoint).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => eprintln!(
                    "vehicle {}: server answered {} - is it registered? (run `fleet-sentinel seed`)",
                    sim.id,
                    resp.status()
                ),
                Err(e) => eprintln!("vehicle {}: send failed: {e}", sim.id),
            }
        }

        sent += 1;
        if args.count > 0 && sent >= args.count {
            break;
        }
        if args.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        }
    }

    eprintln!("Simulation complete: {sent} reading(s) per vehicle");
    Ok(())
}
