use anyhow::Context;
use clap::{Parser, Subcommand};
use pose_match::analysis::run_self_test;
use pose_match::config::{load_config_or_default, Config};
use pose_match::data::{load_image, save_image, validate_points_within, PoseLibrary};
use pose_match::visualization::{draw_overlay, print_ranking, print_report};
use pose_match::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "posematch")]
#[command(about = "Match body poses against reference poses with a least-squares similarity fit")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the similarity transform between two keypoint lists
    Estimate {
        /// Keypoints to be transformed (JSON array)
        #[arg(short, long)]
        source: PathBuf,

        /// Keypoints to transform onto (JSON array)
        #[arg(short, long)]
        target: PathBuf,

        /// Output file for the fitted parameters
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decide whether the photo in a detection response matches a reference pose
    Match {
        /// Detection service response with the photo (and optionally reference) keypoints
        #[arg(short, long)]
        detection: PathBuf,

        /// Reference pose library (TOML or JSON)
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Reference pose id; with a library but no id, every pose is ranked
        #[arg(short, long)]
        pose: Option<u32>,

        /// Photo the keypoints were detected in
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Where to write the photo with keypoints and the fitted reference drawn on it
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Output file for the match report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the estimator on the worked example and random transforms
    Selftest {
        /// Number of random transforms to recover
        #[arg(short = 'n', long, default_value = "100")]
        trials: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Serialize)]
struct EstimateOutput {
    parameters: SimilarityParameters,
    scale: f64,
    signed_rotation_degrees: f64,
    legacy_rotation_degrees: f64,
    correspondences: usize,
    residual_error: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let mut config = load_config_or_default(config_path.as_deref());
    apply_verbosity(&mut config, cli.verbose);
    let _log_guard = logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Estimate { source, target, output } => {
            handle_estimate(&config, source, target, output)?;
        }
        Commands::Match { detection, library, pose, image, overlay, output } => {
            handle_match(&config, detection, library, pose, image, overlay, output)?;
        }
        Commands::Selftest { trials, seed } => {
            handle_selftest(trials, seed)?;
        }
    }

    Ok(())
}

fn apply_verbosity(config: &mut Config, verbose: u8) {
    let level = match verbose {
        0 => return,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    config.logging.global_level = level.to_string();
    config.logging.geometry_level = level.to_string();
    config.logging.matching_level = level.to_string();
    config.logging.console_output = true;
}

fn handle_estimate(
    config: &Config,
    source: PathBuf,
    target: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let source = KeypointSet::load(&source)?;
    let target = KeypointSet::load(&target)?;

    let pairs = correspond(&source, &target, config.matching.min_confidence)?;
    let params = estimate(&pairs.source, &pairs.target)?;
    let residual = similarity::error(&apply(&pairs.source, &params), &pairs.target)?;

    println!("=== Similarity Transform ===");
    println!("  Correspondences: {}", pairs.len());
    println!("  Translation: ({:.4}, {:.4})", params.translation_x(), params.translation_y());
    println!("  Scale: {:.6}", params.scale());
    println!(
        "  Rotation: {:.4}° (legacy {:.4}°)",
        params.signed_rotation_degrees(),
        params.rotation_degrees()
    );
    println!("  Residual error: {:.6}", residual);

    if let Some(output_path) = output {
        let result = EstimateOutput {
            parameters: params,
            scale: params.scale(),
            signed_rotation_degrees: params.signed_rotation_degrees(),
            legacy_rotation_degrees: params.rotation_degrees(),
            correspondences: pairs.len(),
            residual_error: residual,
        };
        std::fs::write(&output_path, serde_json::to_string_pretty(&result)?)?;
        println!("Parameters saved to {}.", output_path.display());
    }

    Ok(())
}

fn handle_match(
    config: &Config,
    detection: PathBuf,
    library: Option<PathBuf>,
    pose: Option<u32>,
    image: Option<PathBuf>,
    overlay: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    if overlay.is_some() && image.is_none() {
        anyhow::bail!("--overlay requires --image");
    }

    let correlation_id = logging::new_correlation_id();
    tracing::info!(%correlation_id, detection = %detection.display(), "starting match");

    let response = DetectionResponse::load(&detection)?;
    let matcher = PoseMatcher::new(config.matching.clone());

    let report = match (library, pose) {
        (Some(library_path), Some(id)) => {
            let library = PoseLibrary::load_from_file(&library_path)?;
            let reference = library.get(id).with_context(|| {
                format!("no reference pose {} in {}", id, library_path.display())
            })?;
            let report = matcher.match_reference(reference, &response.photo)?;
            print_report(&report);
            write_json(output.as_ref(), &report)?;
            report
        }
        (Some(library_path), None) => {
            let library = PoseLibrary::load_from_file(&library_path)?;
            let ranked = matcher.rank(&response.photo, &library);
            print_ranking(&ranked);
            write_json(output.as_ref(), &ranked)?;
            match ranked.into_iter().next() {
                Some(best) => best.report,
                None => anyhow::bail!(
                    "no reference pose in {} could be matched",
                    library_path.display()
                ),
            }
        }
        (None, Some(_)) => anyhow::bail!("--pose requires --library"),
        (None, None) => {
            if response.reference.is_empty() {
                anyhow::bail!("detection response has no reference keypoints; pass --library");
            }
            let report = matcher.match_pose(&response.reference, &response.photo)?;
            print_report(&report);
            write_json(output.as_ref(), &report)?;
            report
        }
    };

    if let (Some(image_path), Some(overlay_path)) = (image, overlay) {
        let photo = load_image(&image_path)?;
        validate_points_within(&photo, &report.photo_points)
            .with_context(|| format!("keypoints do not belong to {}", image_path.display()))?;
        let drawn = draw_overlay(&photo, &report, &config.render);
        save_image(&drawn, &overlay_path)?;
        println!("Overlay saved to {}.", overlay_path.display());
    }

    logging::clear_correlation_id();
    Ok(())
}

fn handle_selftest(trials: usize, seed: u64) -> anyhow::Result<()> {
    let summary = run_self_test(trials, seed)?;

    println!("Worked example residual: {:.3e}", summary.worked_example_residual);
    println!("Random trials: {} ({} failed)", summary.trials, summary.failures);
    println!("  Worst translation error: {:.3e}", summary.worst.translation);
    println!("  Worst relative scale error: {:.3e}", summary.worst.relative_scale);
    println!("  Worst rotation error: {:.3e}°", summary.worst.rotation_degrees);
    println!("  Mean estimate time: {:.2}µs", summary.mean_estimate_us);

    if summary.passed() {
        println!("SUCCESS");
        Ok(())
    } else {
        println!("FAIL");
        Err(anyhow::anyhow!("self test failed"))
    }
}

fn write_json<T: Serialize>(path: Option<&PathBuf>, value: &T) -> anyhow::Result<()> {
    if let Some(path) = path {
        std::fs::write(path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Results saved to {}.", path.display());
    }
    Ok(())
}
