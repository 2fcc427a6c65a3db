// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{info, warn};

use lorenz_field::{
    analyze_divergence, Axis, DivergenceReport, Ensemble, EnsembleBuilder, InitialConditions, State,
    SystemParameters,
};
use lorenz_viz::{render_animation, render_interactive, RenderMode};

use crate::config::LorenzConfig;

const DEFAULT_DURATION: f64 = 15.0;
const DEFAULT_DT: f64 = 0.02;
const INTERACTIVE_CURVES: usize = 5;
const ANIMATE_CURVES: usize = 10;
const DIVERGENCE_DURATION: f64 = 40.0;
const DIVERGENCE_DT: f64 = 0.01;

#[derive(Debug, Parser)]
#[command(
    name = "lorenz",
    about = "Generate, render and export Lorenz attractor trajectory ensembles",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of ensemble members.
    #[arg(long, global = true)]
    pub curves: Option<usize>,

    /// Integration time span.
    #[arg(long, global = true)]
    pub duration: Option<f64>,

    /// Sample spacing.
    #[arg(long, global = true)]
    pub dt: Option<f64>,

    #[arg(long, global = true)]
    pub sigma: Option<f64>,

    #[arg(long, global = true)]
    pub rho: Option<f64>,

    #[arg(long, global = true)]
    pub beta: Option<f64>,

    /// Generate members on worker threads; `--parallel` alone uses every core.
    #[arg(
        long,
        global = true,
        value_name = "THREADS",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "0"
    )]
    pub parallel: Option<usize>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write an interactive 3D page of the ensemble.
    Interactive(OutputArgs),

    /// Write a page that draws the ensemble progressively, then orbits it.
    Animate(AnimateArgs),

    /// Write the ensemble as JSON (stdout when no output is given).
    Export(OutputArgs),

    /// Measure how fast two nearby trajectories separate.
    Divergence(DivergenceArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct AnimateArgs {
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Enable user orbit controls during playback.
    #[arg(long)]
    pub live: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DivergenceArgs {
    /// Offset along x between the two initial states.
    #[arg(long, default_value_t = 1e-5)]
    pub epsilon: f64,

    /// Separation that counts as diverged.
    #[arg(long, default_value_t = 1.0)]
    pub threshold: f64,

    /// Base initial state as x,y,z.
    #[arg(long, value_delimiter = ',', default_values_t = [1.0, 1.0, 1.0])]
    pub base: Vec<f64>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Default for DivergenceArgs {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            threshold: 1.0,
            base: vec![1.0, 1.0, 1.0],
            json: false,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = LorenzConfig::load_or_default(cli.global.config.as_deref())?;
    let global = &cli.global;

    match cli.command {
        Commands::Interactive(args) => {
            let ensemble = build_ensemble(global, &config, INTERACTIVE_CURVES)?;
            let html = render_interactive(&ensemble, &config.render);
            let path = args.output.unwrap_or_else(|| PathBuf::from("lorenz_interactive.html"));
            write_output(&path, &html)
        }
        Commands::Animate(args) => {
            let ensemble = build_ensemble(global, &config, ANIMATE_CURVES)?;
            let mut render = config.render.clone();
            if args.live {
                render.mode = RenderMode::Live;
            }
            let html = render_animation(&ensemble, &render, &config.animation);
            let path = args.output.unwrap_or_else(|| PathBuf::from("lorenz_animation.html"));
            write_output(&path, &html)
        }
        Commands::Export(args) => {
            let ensemble = build_ensemble(global, &config, INTERACTIVE_CURVES)?;
            let json = serde_json::to_string_pretty(&ensemble).context("failed to serialize ensemble")?;
            match args.output {
                Some(path) => write_output(&path, &json),
                None => {
                    println!("{}", json);
                    Ok(())
                }
            }
        }
        Commands::Divergence(args) => {
            let report = run_divergence(global, &config, &args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", format_report(&report));
            }
            Ok(())
        }
    }
}

fn parameters(global: &GlobalArgs, config: &LorenzConfig) -> SystemParameters {
    let base = config.parameters;
    SystemParameters::new(
        global.sigma.unwrap_or(base.sigma),
        global.rho.unwrap_or(base.rho),
        global.beta.unwrap_or(base.beta),
    )
}

fn worker_threads(requested: usize) -> usize {
    if requested == 0 {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        requested
    }
}

fn run_builder(builder: &EnsembleBuilder, threads: Option<usize>) -> Result<Ensemble> {
    let ensemble = match threads {
        Some(t) => builder.build_parallel(worker_threads(t)),
        None => builder.build(),
    };
    ensemble.context("failed to generate ensemble")
}

pub fn build_ensemble(global: &GlobalArgs, config: &LorenzConfig, default_curves: usize) -> Result<Ensemble> {
    let settings = &config.ensemble;
    let builder = EnsembleBuilder::new(global.curves.or(settings.curves).unwrap_or(default_curves))
        .with_rule(settings.initial.clone())
        .with_parameters(parameters(global, config))
        .with_duration(global.duration.or(settings.duration).unwrap_or(DEFAULT_DURATION))
        .with_dt(global.dt.or(settings.dt).unwrap_or(DEFAULT_DT))
        .with_solver_options(config.solver);
    run_builder(&builder, global.parallel.or(settings.parallel))
}

pub fn run_divergence(global: &GlobalArgs, config: &LorenzConfig, args: &DivergenceArgs) -> Result<DivergenceReport> {
    let base = match args.base.as_slice() {
        &[x, y, z] => State::new(x, y, z),
        other => bail!("--base needs exactly three values, got {}", other.len()),
    };
    let builder = EnsembleBuilder::new(2)
        .with_rule(InitialConditions::Perturbed {
            base,
            axis: Axis::X,
            epsilon: args.epsilon,
        })
        .with_parameters(parameters(global, config))
        .with_duration(global.duration.unwrap_or(DIVERGENCE_DURATION))
        .with_dt(global.dt.unwrap_or(DIVERGENCE_DT))
        .with_solver_options(config.solver);
    let pair = run_builder(&builder, global.parallel.or(config.ensemble.parallel))?;

    let report = analyze_divergence(&pair.members()[0], &pair.members()[1], args.threshold);
    match report.first_exceedance_time {
        Some(t) => info!(t, threshold = args.threshold, "trajectories diverged"),
        None => warn!(
            threshold = args.threshold,
            max = report.max_separation,
            "separation never exceeded the threshold"
        ),
    }
    Ok(report)
}

pub fn format_report(report: &DivergenceReport) -> String {
    let crossing = report
        .first_exceedance_time
        .map(|t| format!("t = {:.2}", t))
        .unwrap_or_else(|| "never".to_string());
    let growth = report
        .growth_rate
        .map(|g| format!("{:.3} per unit time", g))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "initial separation  {:.3e}\nmax separation      {:.3}\nthreshold           {}\nfirst exceedance    {}\ngrowth rate         {}\n",
        report.initial_separation, report.max_separation, report.threshold, crossing, growth,
    )
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quick() -> GlobalArgs {
        GlobalArgs {
            duration: Some(1.0),
            dt: Some(0.05),
            ..GlobalArgs::default()
        }
    }

    #[test]
    fn interactive_writes_html() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("page.html");
        run(Cli {
            global: quick(),
            command: Commands::Interactive(OutputArgs { output: Some(out.clone()) }),
        })
        .unwrap();
        let html = fs::read_to_string(&out).unwrap();
        assert!(html.contains("Curve 4"));
        assert!(!html.contains("Curve 5"));
        assert!(html.contains("Lorenz Attractor (σ=10, ρ=28"));
    }

    #[test]
    fn animate_live_enables_controls() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("anim.html");
        run(Cli {
            global: GlobalArgs {
                curves: Some(3),
                parallel: Some(2),
                ..quick()
            },
            command: Commands::Animate(AnimateArgs {
                output: Some(out.clone()),
                live: true,
            }),
        })
        .unwrap();
        let html = fs::read_to_string(&out).unwrap();
        assert!(html.contains("OrbitControls"));
        assert!(html.contains("dot_2"));
        assert!(!html.contains("dot_3"));
    }

    #[test]
    fn export_round_trips_through_json() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("ensemble.json");
        run(Cli {
            global: GlobalArgs {
                curves: Some(3),
                rho: Some(14.0),
                ..quick()
            },
            command: Commands::Export(OutputArgs { output: Some(out.clone()) }),
        })
        .unwrap();
        let ensemble: Ensemble = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(ensemble.len(), 3);
        assert_eq!(ensemble.parameters().rho, 14.0);
        assert_eq!(ensemble.members()[0].len(), 20);
        assert_eq!(ensemble.members()[2].samples()[0], State::splat(3.0));
    }

    #[test]
    fn config_file_supplies_defaults_and_flags_override() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("lorenz.toml");
        fs::write(
            &cfg_path,
            "[parameters]\nsigma = 12.0\n\n[ensemble]\ncurves = 2\nduration = 0.5\ndt = 0.1\n",
        )
        .unwrap();
        let global = GlobalArgs {
            config: Some(cfg_path.clone()),
            dt: Some(0.05),
            ..GlobalArgs::default()
        };
        let config = LorenzConfig::load(&cfg_path).unwrap();
        let ensemble = build_ensemble(&global, &config, INTERACTIVE_CURVES).unwrap();
        assert_eq!(ensemble.len(), 2);
        assert_eq!(ensemble.parameters().sigma, 12.0);
        assert_eq!(ensemble.dt(), 0.05);
        assert_eq!(ensemble.members()[0].len(), 10);
    }

    #[test]
    fn invalid_dt_is_reported_with_context() {
        let err = build_ensemble(
            &GlobalArgs {
                dt: Some(-0.1),
                ..GlobalArgs::default()
            },
            &LorenzConfig::default(),
            1,
        )
        .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("failed to generate ensemble"));
        assert!(msg.contains("invalid parameters"));
    }

    #[test]
    fn divergence_report_for_close_states() {
        let report = run_divergence(
            &GlobalArgs {
                duration: Some(30.0),
                ..GlobalArgs::default()
            },
            &LorenzConfig::default(),
            &DivergenceArgs::default(),
        )
        .unwrap();
        assert!((report.initial_separation - 1e-5).abs() < 1e-12);
        assert!(report.first_exceedance_time.is_some());
        let text = format_report(&report);
        assert!(text.contains("first exceedance    t = "));
    }

    #[test]
    fn divergence_rejects_short_base() {
        let args = DivergenceArgs {
            base: vec![1.0, 2.0],
            ..DivergenceArgs::default()
        };
        assert!(run_divergence(&quick(), &LorenzConfig::default(), &args).is_err());
    }

    #[test]
    fn missing_config_file_fails() {
        let result = run(Cli {
            global: GlobalArgs {
                config: Some(PathBuf::from("/nonexistent/lorenz.toml")),
                ..quick()
            },
            command: Commands::Export(OutputArgs::default()),
        });
        assert!(result.is_err());
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lorenz", "animate", "--live", "--curves", "4", "--rho", "99.96", "--parallel", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.curves, Some(4));
        assert_eq!(cli.global.rho, Some(99.96));
        assert_eq!(cli.global.parallel, Some(0));
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Commands::Animate(AnimateArgs { live: true, .. })));
    }

    #[test]
    fn parses_divergence_options() {
        let cli = Cli::try_parse_from([
            "lorenz", "--parallel=2", "divergence", "--epsilon", "0.001", "--base", "0,1,20",
        ])
        .unwrap();
        assert_eq!(cli.global.parallel, Some(2));
        match cli.command {
            Commands::Divergence(args) => {
                assert_eq!(args.epsilon, 0.001);
                assert_eq!(args.base, vec![0.0, 1.0, 20.0]);
                assert_eq!(args.threshold, 1.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
