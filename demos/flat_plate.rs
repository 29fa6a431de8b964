//! Single scattering from a vanadium plate against the analytic result
//!
//! Usage: `flat_plate [-v]... [config.json]`

use nscatter::discus::{Detector, MultipleScatteringSimulator, Result, SimulationConfig};
use nscatter::geometry::{Cuboid, Material, Sample};
use nscatter::histogram::Histogram;
use nscatter::utils::ValueExt;

use clap::{ArgAction, Parser};
use log::info;
use nalgebra::Vector3;

use std::f64::consts::PI;
use std::path::PathBuf;

const THICKNESS: f64 = 0.001;
const WAVELENGTH: f64 = 1.0;

/// Flat plate single scattering against the analytic result
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Verbose logging, repeat for more detail
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,

    /// JSON file of simulation settings
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    stderrlog::new()
        .verbosity(cli.verbose as usize + 1)
        .init()
        .unwrap_or_else(|e| eprintln!("Unable to initialise logging: {e}"));

    let config = match &cli.config {
        Some(path) => {
            info!("Reading settings from {}", path.display());
            SimulationConfig::from_json_file(path)?
        }
        None => SimulationConfig::builder().n_scatters(2).build(),
    };

    let material = Material::new("V", 5.08, 5.1, 0.0722)?;
    let plate = Cuboid::new(Vector3::zeros(), 0.2, 0.2, THICKNESS)?;
    let sample = Sample::new(plate, material.clone());
    let s_of_q = Histogram::new(vec![0.0, 100.0], vec![1.0, 1.0])?;

    let angles = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
    let detectors = angles
        .iter()
        .enumerate()
        .map(|(i, degrees)| {
            let psi = f64::to_radians(*degrees);
            let position = Vector3::new(psi.sin(), 0.0, psi.cos()) * 1000.0;
            Detector::new(i as u64, position, vec![WAVELENGTH])
        })
        .collect::<Vec<Detector>>();

    let simulator = MultipleScatteringSimulator::new(config, sample, s_of_q)?;
    let results = simulator.run(&detectors)?;

    let Some(single) = results.scatter_order(1) else {
        return Ok(());
    };

    println!(
        "{:>8} {:>12} {:>12} {:>12} {:>6}",
        "angle", "simulated", "error", "analytic", "3σ"
    );
    for ((degrees, spectrum), psi) in angles
        .iter()
        .zip(&single.spectra)
        .zip(angles.iter().map(|a| a.to_radians()))
    {
        let analytic = mancinelli(&material, psi);
        let agrees = spectrum.y[0].approx_eq(analytic, 3.0 * spectrum.e[0]);
        println!(
            "{degrees:>8.1} {:>12} {:>12} {:>12} {:>6}",
            spectrum.y[0].sci(5, 2),
            spectrum.e[0].sci(2, 2),
            analytic.sci(5, 2),
            if agrees { "ok" } else { "off" }
        );
    }

    if let Some(summed) = results.summed() {
        println!("\n{}", summed.name);
        for (degrees, spectrum) in angles.iter().zip(&summed.spectra) {
            println!("{degrees:>8.1} {:>12}", spectrum.y[0].sci(5, 2));
        }
    }

    Ok(())
}

/// Closed form single scattering for a plate normal to the beam
fn mancinelli(material: &Material, psi: f64) -> f64 {
    let mu_t = material.attenuation_coefficient(WAVELENGTH) * THICKNESS;
    let ratio = material.scattering_xs / material.total_xs(WAVELENGTH);
    let secant = 1.0 / psi.cos();
    let integral = if (1.0 - secant).abs() < 1e-9 {
        mu_t * (-mu_t).exp()
    } else {
        ((-mu_t * secant).exp() - (-mu_t).exp()) / (1.0 - secant)
    };
    ratio * integral / (4.0 * PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_verbose_flags_are_counted() {
        let cli = Cli::try_parse_from(["flat_plate", "-vv", "-v", "settings.json"]).unwrap();
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.config, Some(PathBuf::from("settings.json")));
    }

    #[test]
    fn settings_file_is_optional() {
        let cli = Cli::try_parse_from(["flat_plate"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["flat_plate", "--threads", "4"]).is_err());
    }

    #[test]
    fn normal_incidence_has_no_singularity() {
        let material = Material::new("V", 5.08, 5.1, 0.0722).unwrap();
        let forward = mancinelli(&material, 0.0);
        let nearby = mancinelli(&material, 1e-3);
        assert!(forward > 0.0);
        assert!((forward - nearby).abs() / forward < 1e-4);
    }
}
