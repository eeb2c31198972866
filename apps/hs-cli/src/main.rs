use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use hs_core::units::constants::{G_SI, M_EARTH_KG, R_EARTH_M};
use hs_core::units::pa;
use hs_eos::Polytropic;
use hs_structure::{SolveOptions, StructureModel};

#[derive(Parser)]
#[command(name = "hs-cli")]
#[command(about = "Hydrostat CLI - polytropic planet structure tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one body and print its surface radius and mass
    Surface {
        /// Floor density [kg/m³]
        rho0: f64,
        /// Polytropic coefficient [kg/m³/Pa^n]
        c: f64,
        /// Polytropic exponent
        n: f64,
        /// Central pressure [Pa]
        central_pressure: f64,
        /// Print mass and radius in Earth units
        #[arg(long)]
        earth_units: bool,
    },
    /// Sample the interior density profile at evenly spaced radii
    Profile {
        /// Floor density [kg/m³]
        rho0: f64,
        /// Polytropic coefficient [kg/m³/Pa^n]
        c: f64,
        /// Polytropic exponent
        n: f64,
        /// Central pressure [Pa]
        central_pressure: f64,
        /// Outermost sample radius [m] (defaults to just inside the surface)
        #[arg(long)]
        r_max: Option<f64>,
        /// Number of sample radii
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a mass-radius curve from a YAML model file
    Manifold {
        /// Path to the model YAML file
        model_path: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print mass and radius in Earth units
        #[arg(long)]
        earth_units: bool,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Eos(#[from] hs_eos::EosError),
    #[error(transparent)]
    Structure(#[from] hs_structure::StructureError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Model file error: {0}")]
    Model(#[from] serde_yaml::Error),
}

type CliResult<T> = Result<T, CliError>;

/// Model file for manifold runs:
///
/// ```yaml
/// eos:
///   rho0: 1460.0
///   c: 0.00311
///   n: 0.513
/// pressures:
///   min_exponent: 8.0
///   max_exponent: 17.0
///   count: 100
/// solver:
///   rel_tol: 1.0e-6
/// ```
#[derive(Debug, Deserialize)]
struct ModelFile {
    eos: EosSpec,
    pressures: PressureRange,
    #[serde(default)]
    solver: SolverSpec,
}

/// EOS parameters section of a model file.
#[derive(Debug, Deserialize)]
struct EosSpec {
    rho0: f64,
    c: f64,
    n: f64,
}

/// Log-spaced central pressure range [Pa], base-10 exponents.
#[derive(Debug, Deserialize)]
struct PressureRange {
    min_exponent: f64,
    max_exponent: f64,
    count: usize,
}

/// Optional solver overrides; anything omitted keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SolverSpec {
    rel_tol: Option<f64>,
    abs_tol: Option<f64>,
    surface_pressure: Option<f64>,
    radius_ceiling: Option<f64>,
}

impl SolverSpec {
    fn apply(&self, mut options: SolveOptions) -> SolveOptions {
        if let Some(v) = self.rel_tol {
            options.rel_tol = v;
        }
        if let Some(v) = self.abs_tol {
            options.abs_tol = v;
        }
        if let Some(v) = self.surface_pressure {
            options.surface_pressure_pa = v;
        }
        if let Some(v) = self.radius_ceiling {
            options.radius_ceiling_m = v;
        }
        options
    }
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Surface {
            rho0,
            c,
            n,
            central_pressure,
            earth_units,
        } => cmd_surface(rho0, c, n, central_pressure, earth_units),
        Commands::Profile {
            rho0,
            c,
            n,
            central_pressure,
            r_max,
            count,
            output,
        } => cmd_profile(rho0, c, n, central_pressure, r_max, count, output.as_deref()),
        Commands::Manifold {
            model_path,
            output,
            earth_units,
        } => cmd_manifold(&model_path, output.as_deref(), earth_units),
    }
}

fn cmd_surface(rho0: f64, c: f64, n: f64, central_pressure: f64, earth_units: bool) -> CliResult<()> {
    let eos = Polytropic::new(rho0, c, n)?;
    let model = StructureModel::new(eos, G_SI);

    let pc = pa(central_pressure);
    let surface = model.solve_surface(pc.value)?;

    if earth_units {
        println!("Radius: {:.4} R_earth", surface.radius_m / R_EARTH_M);
        println!("Mass:   {:.4} M_earth", surface.mass_kg / M_EARTH_KG);
    } else {
        println!("Radius: {:.6e} m", surface.radius_m);
        println!("Mass:   {:.6e} kg", surface.mass_kg);
    }
    println!("Surface pressure: {:.3e} Pa", surface.pressure_pa);
    Ok(())
}

fn cmd_profile(
    rho0: f64,
    c: f64,
    n: f64,
    central_pressure: f64,
    r_max: Option<f64>,
    count: usize,
    output: Option<&Path>,
) -> CliResult<()> {
    let eos = Polytropic::new(rho0, c, n)?;
    let model = StructureModel::new(eos, G_SI);
    let pc = pa(central_pressure);

    let r_outer = match r_max {
        Some(r) => r,
        None => {
            // stop just inside the surface so every query stays valid
            let surface = model.solve_surface(pc.value)?;
            0.995 * surface.radius_m
        }
    };

    let radii: Vec<f64> = (1..=count)
        .map(|i| r_outer * i as f64 / count as f64)
        .collect();
    let densities = model.sample_profile(pc.value, &radii)?;

    let mut csv = String::from("radius_m,density_kg_m3\n");
    for (r, rho) in radii.iter().zip(&densities) {
        csv.push_str(&format!("{r:.9e},{rho:.9e}\n"));
    }
    write_output(output, &csv)?;
    Ok(())
}

fn cmd_manifold(model_path: &Path, output: Option<&Path>, earth_units: bool) -> CliResult<()> {
    let text = fs::read_to_string(model_path)?;
    let model_file: ModelFile = serde_yaml::from_str(&text)?;

    let eos = Polytropic::new(model_file.eos.rho0, model_file.eos.c, model_file.eos.n)?;
    let options = model_file.solver.apply(SolveOptions::default());
    let model = StructureModel::with_options(eos, G_SI, options);

    let pressures = logspace(
        model_file.pressures.min_exponent,
        model_file.pressures.max_exponent,
        model_file.pressures.count,
    );
    let result = model.manifold(&pressures);

    let (m_scale, r_scale, header) = if earth_units {
        (M_EARTH_KG, R_EARTH_M, "central_pressure_pa,mass_earth,radius_earth\n")
    } else {
        (1.0, 1.0, "central_pressure_pa,mass_kg,radius_m\n")
    };

    let mut csv = String::from(header);
    for (pc, outcome) in result.central_pressures_pa.iter().zip(&result.outcomes) {
        match outcome {
            Ok(surface) => csv.push_str(&format!(
                "{pc:.9e},{:.9e},{:.9e}\n",
                surface.mass_kg / m_scale,
                surface.radius_m / r_scale
            )),
            Err(err) => eprintln!("  {pc:.3e} Pa failed: {err}"),
        }
    }
    write_output(output, &csv)?;
    eprintln!(
        "✓ {} of {} integrations converged",
        result.num_converged,
        result.outcomes.len()
    );
    Ok(())
}

/// Log-spaced values 10^min_exp .. 10^max_exp, inclusive on both ends.
fn logspace(min_exp: f64, max_exp: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![10f64.powf(min_exp)];
    }
    (0..count)
        .map(|i| {
            let t = i as f64 / (count - 1) as f64;
            10f64.powf(min_exp + t * (max_exp - min_exp))
        })
        .collect()
}

fn write_output(path: Option<&Path>, contents: &str) -> io::Result<()> {
    match path {
        Some(p) => {
            fs::write(p, contents)?;
            eprintln!("Wrote {}", p.display());
            Ok(())
        }
        None => io::stdout().write_all(contents.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logspace_endpoints_and_length() {
        let v = logspace(8.0, 17.0, 100);
        assert_eq!(v.len(), 100);
        assert!((v[0] - 1.0e8).abs() / 1.0e8 < 1e-12);
        assert!((v[99] - 1.0e17).abs() / 1.0e17 < 1e-12);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn logspace_single_point() {
        assert_eq!(logspace(3.0, 9.0, 1), vec![1.0e3]);
    }

    #[test]
    fn model_file_parses_with_and_without_solver() {
        let yaml = "
eos:
  rho0: 1460.0
  c: 0.00311
  n: 0.513
pressures:
  min_exponent: 8.0
  max_exponent: 17.0
  count: 100
";
        let model_file: ModelFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(model_file.pressures.count, 100);
        assert!(model_file.solver.rel_tol.is_none());

        let yaml = "
eos: { rho0: 4260.0, c: 0.00127, n: 0.549 }
pressures: { min_exponent: 8.0, max_exponent: 17.0, count: 50 }
solver: { rel_tol: 1.0e-8, radius_ceiling: 1.0e12 }
";
        let model_file: ModelFile = serde_yaml::from_str(yaml).unwrap();
        let options = model_file.solver.apply(SolveOptions::default());
        assert_eq!(options.rel_tol, 1.0e-8);
        assert_eq!(options.radius_ceiling_m, 1.0e12);
        assert_eq!(options.surface_pressure_pa, 1.0e-2);
    }
}
