// Demonstration: drive the curriculum with a synthetic learner whose catch
// radius grows as it trains.
//
// Build/run from this repo root:
//   cargo run --example curriculum_demo -- --batch 256 --iterations 40 --seed 7

use std::env;
use std::path::Path;

use pursuit_curriculum::geometry::captured;
use pursuit_curriculum::{CurriculumConfig, CurriculumController, GeneratorConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let batch: usize = arg_value(&args, "--batch")
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);
    let iterations: usize = arg_value(&args, "--iterations")
        .and_then(|s| s.parse().ok())
        .unwrap_or(40);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);
    let save_dir = arg_value(&args, "--save-dir");

    let config = GeneratorConfig {
        curriculum: CurriculumConfig {
            buffer_capacity: 1000,
            ..CurriculumConfig::default()
        },
        seed,
        ..GeneratorConfig::default()
    };
    let cylinder_radius = config.arena.cylinder_radius;
    let mut controller = CurriculumController::new(config)?;

    for iteration in 0..iterations {
        // The stand-in learner catches anything within a radius that grows
        // from one to four cell widths over the run.
        let catch_radius = 0.2 + 0.6 * iteration as f64 / iterations.max(1) as f64;
        let success: Vec<f64> = controller
            .reset(batch)?
            .iter()
            .map(|task| {
                let caught = captured(
                    &task.drones(),
                    &task.target(),
                    &task.cylinders(),
                    cylinder_radius,
                    catch_radius,
                );
                if caught {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        let report = controller.report_episode(&success)?;
        println!(
            "iter {iteration:3}  success {:.3}  admitted {:>4}  ratcheted {}",
            report.success_rate,
            report.admitted.map_or_else(|| "-".to_string(), |n| n.to_string()),
            report.ratcheted
        );
    }

    println!("=== Curriculum state ===");
    println!("{}", controller.diagnostics());

    if let Some(dir) = save_dir {
        let path = controller.save_history(Path::new(dir), iterations as u64)?;
        println!("History written to {}", path.display());
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
