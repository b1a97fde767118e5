//! Synthetic OBD trip generator
//!
//! Writes a wide-format CSV log of one drive (warm-up, urban stop-and-go,
//! a highway leg) at 1 Hz, with optional injected faults for demos and
//! end-to-end checks of the analyzer.
//!
//! # Usage
//! ```bash
//! obd-simulate --minutes 20 --fault overheat --seed 7 > hot.csv
//! obdscope analyze hot.csv
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

// ============================================================================
// Vehicle Constants
// ============================================================================

/// Warm idle speed (rpm)
const IDLE_RPM: f64 = 750.0;
/// Thermostat regulated coolant temperature (°C)
const OPERATING_COOLANT_C: f64 = 90.0;
/// Coolant rise per second while warming up (°C)
const WARMUP_RATE_C_S: f64 = 0.12;
/// Charging voltage with a healthy alternator (V)
const CHARGING_V: f64 = 14.1;
/// Engine displacement proxy: MAF g/s per 1000 rpm at full load
const MAF_PER_KRPM: f64 = 9.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Fault {
    /// Coolant climbs past 110°C on the highway leg
    Overheat,
    /// Vacuum leak: positive fuel trims, low idle airflow
    Lean,
    /// Alternator not charging: voltage sags through the trip
    WeakBattery,
}

#[derive(Parser, Debug)]
#[command(name = "obd-simulate")]
#[command(about = "Synthetic OBD trip log generator")]
#[command(version)]
struct Args {
    /// Trip duration in minutes
    #[arg(short, long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..=240))]
    minutes: u32,

    /// Fault to inject (repeatable)
    #[arg(short, long, value_enum)]
    fault: Vec<Fault>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

// ============================================================================
// Drive Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// Parked, engine warming (0-10%)
    Idle,
    /// Stop-and-go city driving (10-50%)
    Urban,
    /// Steady highway cruise (50-90%)
    Highway,
    /// Slowing to a stop (90-100%)
    Arrival,
}

impl Phase {
    fn from_progress(progress: f64) -> Self {
        match progress {
            p if p < 0.10 => Self::Idle,
            p if p < 0.50 => Self::Urban,
            p if p < 0.90 => Self::Highway,
            _ => Self::Arrival,
        }
    }
}

// ============================================================================
// Simulation State
// ============================================================================

struct Vehicle {
    rng: StdRng,
    faults: Vec<Fault>,
    noise: Normal<f64>,
    speed: f64,
    coolant: f64,
    voltage: f64,
    ltft: f64,
}

/// One logged row
struct Reading {
    rpm: f64,
    speed: f64,
    load: f64,
    coolant: f64,
    iat: f64,
    maf: f64,
    stft: f64,
    ltft: f64,
    timing: f64,
    voltage: f64,
}

impl Vehicle {
    fn new(faults: Vec<Fault>, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            faults,
            noise: Normal::new(0.0, 1.0).context("noise distribution")?,
            speed: 0.0,
            coolant: 20.0,
            voltage: CHARGING_V,
            ltft: 0.0,
        })
    }

    fn has(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn jitter(&mut self, scale: f64) -> f64 {
        self.noise.sample(&mut self.rng) * scale
    }

    fn target_speed(&mut self, phase: Phase, second: u32) -> f64 {
        match phase {
            Phase::Idle => 0.0,
            // 90 s cycles: accelerate, hold, brake, wait at a light
            Phase::Urban => match second % 90 {
                0..=14 => f64::from(second % 90) * 3.2,
                15..=54 => 48.0,
                55..=69 => 48.0 - f64::from(second % 90 - 54) * 3.2,
                _ => 0.0,
            },
            Phase::Highway => 105.0 + self.jitter(3.0),
            Phase::Arrival => (self.speed - 2.5).max(0.0),
        }
    }

    fn step(&mut self, phase: Phase, second: u32) -> Reading {
        let target = self.target_speed(phase, second);
        self.speed += (target - self.speed).clamp(-4.0, 4.0);
        self.speed = self.speed.max(0.0);
        let accel = (target - self.speed).max(0.0);

        // Engine speed from a simple 5-speed gearing model
        let rpm = if self.speed < 1.0 {
            IDLE_RPM + self.jitter(15.0)
        } else {
            let gear_ratio = match self.speed {
                s if s < 20.0 => 110.0,
                s if s < 40.0 => 62.0,
                s if s < 60.0 => 42.0,
                s if s < 85.0 => 31.0,
                _ => 24.0,
            };
            (self.speed * gear_ratio).max(IDLE_RPM) + self.jitter(25.0)
        };
        let load = if self.speed < 1.0 {
            22.0 + self.jitter(1.5)
        } else {
            (30.0 + accel * 6.0 + self.speed * 0.15 + self.jitter(2.0)).clamp(15.0, 95.0)
        };

        // Cooling
        let target_coolant = if self.has(Fault::Overheat) && phase == Phase::Highway {
            118.0
        } else {
            OPERATING_COOLANT_C
        };
        if self.coolant < target_coolant {
            let rate = if target_coolant > OPERATING_COOLANT_C && self.coolant >= OPERATING_COOLANT_C {
                0.04
            } else {
                WARMUP_RATE_C_S
            };
            self.coolant = (self.coolant + rate).min(target_coolant);
        } else {
            self.coolant -= (self.coolant - target_coolant) * 0.01;
        }
        let coolant = self.coolant + self.jitter(0.3);

        // Air and fuel
        let leak = self.has(Fault::Lean);
        let mut maf = rpm / 1000.0 * MAF_PER_KRPM * load / 100.0 + self.jitter(0.15);
        if leak {
            maf *= 0.8;
            self.ltft = (self.ltft + 0.05).min(14.0);
        } else {
            self.ltft += (1.5 - self.ltft) * 0.01;
        }
        let stft = if leak { 6.0 } else { 0.0 } + self.jitter(2.5);
        let timing = if self.speed < 1.0 {
            12.0 + self.jitter(1.0)
        } else {
            (38.0 - load * 0.25 + self.jitter(1.5)).max(5.0)
        };

        // Charging
        if self.has(Fault::WeakBattery) {
            self.voltage = (self.voltage - 0.0015).max(11.4);
        } else {
            self.voltage += (CHARGING_V - self.voltage) * 0.05;
        }
        let voltage = self.voltage + self.jitter(0.04);

        Reading {
            rpm,
            speed: self.speed,
            load,
            coolant,
            iat: 25.0 + load * 0.1 + self.jitter(0.5),
            maf: maf.max(0.5),
            stft,
            ltft: self.ltft,
            timing,
            voltage,
        }
    }
}

const HEADER: &str = "Time (s),Engine RPM (rpm),Vehicle Speed (km/h),Engine Load (%),\
Coolant Temperature (°C),Intake Air Temperature (°C),MAF (g/s),\
Short Term Fuel Trim B1 (%),Long Term Fuel Trim B1 (%),Timing Advance (°),\
Control Module Voltage (V)";

fn main() -> Result<()> {
    let args = Args::parse();
    let mut vehicle = Vehicle::new(args.fault.clone(), args.seed)?;

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).with_context(|| format!("creating {}", path.display()))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    writeln!(out, "{HEADER}")?;
    let total = args.minutes * 60;
    for second in 0..total {
        let phase = Phase::from_progress(f64::from(second) / f64::from(total));
        let r = vehicle.step(phase, second);
        writeln!(
            out,
            "{second},{:.0},{:.1},{:.1},{:.1},{:.1},{:.2},{:.1},{:.1},{:.1},{:.2}",
            r.rpm, r.speed, r.load, r.coolant, r.iat, r.maf, r.stft, r.ltft, r.timing, r.voltage
        )?;
    }
    out.flush()?;

    eprintln!(
        "Generated {total} rows ({} min){}",
        args.minutes,
        if args.fault.is_empty() {
            String::new()
        } else {
            format!(", faults: {:?}", args.fault)
        }
    );
    Ok(())
}
