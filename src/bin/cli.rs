//! floorplan-scale - two-point scale calibration for floor plans
//!
//! This is the CLI entry point for the floorplan-scale tool.
//! Run with: cargo run --bin floorplan-scale -- plan.png --points 100,100 100,400 --length 3

use anyhow::{bail, Context};
use floorplan_scale::calibration::{NativePoint, OverlayRenderer};
use floorplan_scale::detection::{
    DetectionClient, DetectionConfig, DetectionKind, SourceImage, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT_SECS,
};
use floorplan_scale::export::{default_file_name, save_overlays, write_json, ExportDocument};
use floorplan_scale::scale::LengthUnit;
use floorplan_scale::CalibrationSession;
use std::env;
use std::path::PathBuf;
use tokio::task::JoinSet;

const USAGE: &str = "\
Usage:
  floorplan-scale <image> --points \"x1,y1\" \"x2,y2\" --length <value> [--unit m|cm|ft]
                  [--detect rooms|roboflow|yolo|unified|hybrid|all]
                  [--annotate <out.png>] [--export <out.json>] [--overlays <dir>]
  floorplan-scale --health

Environment:
  DETECTION_BASE_URL      detection service URL (default http://localhost:8000)
  DETECTION_TIMEOUT_SECS  per-request timeout (default 120)
  LABEL_FONT_PATH         TTF/OTF font for distance labels in --annotate output";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    image: PathBuf,
    points: (NativePoint, NativePoint),
    length: String,
    unit: LengthUnit,
    detect: Vec<DetectionKind>,
    annotate: Option<PathBuf>,
    export: Option<PathBuf>,
    overlays: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Health,
    Help,
    Calibrate(Box<CliArgs>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("❌ {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let base_url = env::var("DETECTION_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let timeout_secs: u64 = env::var("DETECTION_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let config = DetectionConfig::default()
        .with_base_url(&base_url)
        .with_timeout(timeout_secs);

    match command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::Health => {
            let client = DetectionClient::new(config)?;
            match client.health().await {
                Ok(true) => println!("✅ Detection service at {} is healthy", base_url),
                Ok(false) => println!("⚠️ Detection service at {} reports not ok", base_url),
                Err(e) => bail!("Health check against {} failed: {}", base_url, e),
            }
            Ok(())
        }
        Command::Calibrate(args) => run(*args, config).await,
    }
}

async fn run(args: CliArgs, config: DetectionConfig) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    let mut session = CalibrationSession::with_wall_length(args.length.clone(), args.unit);
    session.load_image(SourceImage::new(bytes, file_name))?;

    let (first, second) = args.points;
    session.click_native(first);
    let distance = session
        .click_native(second)
        .context("Second point did not produce a measurement")?;

    println!("📐 floorplan-scale");
    println!("================================================");
    if let Some((w, h)) = session.surface().native_size() {
        println!("Image: {} ({}x{} px)", args.image.display(), w, h);
    }
    println!("Points: ({}, {}) -> ({}, {})", first.x, first.y, second.x, second.y);
    println!("Pixel distance: {:.2} px", distance);
    match session.scale().wall_length_m() {
        Some(meters) => println!(
            "Wall length: {} {} = {:.4} m",
            args.length.trim(),
            args.unit.symbol(),
            meters
        ),
        None => println!("⚠️ Wall length '{}' is not a positive number", args.length),
    }
    match session.scale().scale_m_per_px() {
        Some(scale) => println!("Scale: {:.6} m/px", scale),
        None => println!("Scale: not set"),
    }
    println!("================================================\n");

    if let Some(path) = &args.annotate {
        let renderer = match env::var("LABEL_FONT_PATH") {
            Ok(font) if !font.trim().is_empty() => OverlayRenderer::new().with_font_file(font.trim())?,
            _ => OverlayRenderer::new(),
        };
        if !renderer.has_font() {
            tracing::warn!("LABEL_FONT_PATH not set; distance label omitted from annotation");
        }
        renderer.render_to_file(session.surface(), path)?;
        println!("🖍️ Annotation written to {}", path.display());
    }

    if !args.detect.is_empty() {
        run_detections(&mut session, &args.detect, config).await?;
    }

    if let Some(path) = &args.export {
        let document = ExportDocument::from_session(&session);
        let path = if path.is_dir() {
            path.join(default_file_name(document.exported_at))
        } else {
            path.clone()
        };
        write_json(&path, &document)?;
        println!("💾 Results exported to {}", path.display());
    }

    if let Some(dir) = &args.overlays {
        let written = save_overlays(dir, session.results().ready())?;
        println!("🖼️ {} overlay(s) written to {}", written.len(), dir.display());
    }

    Ok(())
}

/// Dispatch every requested backend concurrently and record the results.
async fn run_detections(
    session: &mut CalibrationSession,
    kinds: &[DetectionKind],
    config: DetectionConfig,
) -> anyhow::Result<()> {
    let client = DetectionClient::new(config)?;
    let mut tasks = JoinSet::new();

    for &kind in kinds {
        match session.prepare_detection(kind) {
            Ok(request) => {
                println!("🔎 {} -> {}", kind, kind.endpoint());
                let client = client.clone();
                tasks.spawn(async move {
                    let outcome = client.detect(&request).await.map_err(|e| e.to_string());
                    (request.ticket, outcome)
                });
            }
            Err(e) => println!("⏭️ Skipping {}: {}", kind, e),
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (ticket, outcome) = joined.context("Detection task panicked")?;
        match &outcome {
            Ok(response) => println!("✅ {}: {}", ticket.kind, response.summary()),
            Err(e) => eprintln!("❌ {}: {}", ticket.kind, e),
        }
        session.complete_detection(ticket, outcome);
    }

    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    if args.iter().any(|a| a == "--health") {
        return Ok(Command::Health);
    }

    let mut image = None;
    let mut points = Vec::new();
    let mut length = None;
    let mut unit = LengthUnit::Meter;
    let mut detect = Vec::new();
    let mut annotate = None;
    let mut export = None;
    let mut overlays = None;

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--points" => {
                while let Some(value) = iter.next_if(|v| !v.starts_with("--")) {
                    points.push(value.parse::<NativePoint>().map_err(anyhow::Error::msg)?);
                }
            }
            "--length" => length = Some(flag_value(&mut iter, arg)?.to_string()),
            "--unit" => unit = flag_value(&mut iter, arg)?.parse()?,
            "--detect" => {
                let value = flag_value(&mut iter, arg)?;
                if value.eq_ignore_ascii_case("all") {
                    detect = DetectionKind::ALL.to_vec();
                } else {
                    for name in value.split(',') {
                        let kind = name.parse::<DetectionKind>().map_err(anyhow::Error::msg)?;
                        if !detect.contains(&kind) {
                            detect.push(kind);
                        }
                    }
                }
            }
            "--annotate" => annotate = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            "--export" => export = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            "--overlays" => overlays = Some(PathBuf::from(flag_value(&mut iter, arg)?)),
            other if other.starts_with("--") => bail!("Unknown option {}", other),
            other => {
                if image.is_some() {
                    bail!("Unexpected argument {}", other);
                }
                image = Some(PathBuf::from(other));
            }
        }
    }

    let image = image.context("Missing image path")?;
    let points = match points.as_slice() {
        [a, b] => (*a, *b),
        _ => bail!("--points expects exactly two points, got {}", points.len()),
    };
    let length = length.context("Missing --length")?;

    Ok(Command::Calibrate(Box::new(CliArgs {
        image,
        points,
        length,
        unit,
        detect,
        annotate,
        export,
        overlays,
    })))
}

fn flag_value<'a, I>(iter: &mut I, flag: &str) -> anyhow::Result<&'a str>
where
    I: Iterator<Item = &'a String>,
{
    iter.next()
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_command() {
        let command = parse_args(&args(&[
            "plan.png", "--points", "100,100", "(100, 400)", "--length", "300", "--unit", "cm",
            "--detect", "yolo,rooms", "--export", "out.json",
        ]))
        .unwrap();

        let Command::Calibrate(parsed) = command else {
            panic!("expected calibrate command");
        };
        assert_eq!(parsed.image, PathBuf::from("plan.png"));
        assert_eq!(parsed.points.1, NativePoint::new(100.0, 400.0));
        assert_eq!(parsed.length, "300");
        assert_eq!(parsed.unit, LengthUnit::Centimeter);
        assert_eq!(parsed.detect, vec![DetectionKind::Yolo, DetectionKind::Rooms]);
        assert_eq!(parsed.export, Some(PathBuf::from("out.json")));
        assert_eq!(parsed.annotate, None);
    }

    #[test]
    fn test_detect_all() {
        let command = parse_args(&args(&[
            "plan.png", "--points", "0,0", "3,4", "--length", "5", "--detect", "all",
        ]))
        .unwrap();
        let Command::Calibrate(parsed) = command else {
            panic!("expected calibrate command");
        };
        assert_eq!(parsed.detect, DetectionKind::ALL.to_vec());
    }

    #[test]
    fn test_health_and_help() {
        assert_eq!(parse_args(&args(&["--health"])).unwrap(), Command::Health);
        assert_eq!(parse_args(&[]).unwrap(), Command::Help);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse_args(&args(&["plan.png", "--points", "1,1", "--length", "3"])).is_err());
        assert!(parse_args(&args(&["plan.png", "--points", "1,1", "2,2"])).is_err());
        assert!(parse_args(&args(&["--points", "1,1", "2,2", "--length", "3"])).is_err());
        assert!(parse_args(&args(&[
            "plan.png", "--points", "1,1", "2,2", "--length", "3", "--unit", "yd"
        ]))
        .is_err());
        assert!(parse_args(&args(&[
            "plan.png", "--points", "1,1", "2,2", "--length", "3", "--detect", "walls"
        ]))
        .is_err());
    }
}
