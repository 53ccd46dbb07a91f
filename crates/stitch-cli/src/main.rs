use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, warn};

use stitch_compare::{annotate_match, compare_files};
use stitch_engine::{DetectionEngine, EngineConfig, FrameOutcome, OrderCache, SnapshotKind, SnapshotRequest};
use stitch_proto::SnapshotMeta;
use stitch_uplink::{doctor as uplink_doctor, Uplink};
use stitch_vision::camera::{self, CameraConfig};
use stitch_vision::{annotate, color, design, mask, region, DetectionConfig, Frame};

#[derive(Debug, Parser)]
#[command(name = "stitchwatch", version, about = "stitchwatch - garment detection for print facilities")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration without touching the camera.
    Doctor,
    /// Run the continuous capture/detect/upload loop.
    Run,
    /// Run the detection pipeline once on an image file and print the result.
    Detect {
        #[arg(long)]
        image: PathBuf,
    },
    /// Compare a template image against a search image.
    Compare {
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        search: PathBuf,
        /// Where to write the annotated search image.
        #[arg(long)]
        annotated_out: Option<PathBuf>,
    },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    facility: FacilityCfg,
    uplink: UplinkCfg,
    camera: Option<CameraConfig>,

    #[serde(default)]
    detection: DetectionConfig,
    #[serde(default)]
    engine: EngineConfig,
}

#[derive(Debug, serde::Deserialize)]
struct FacilityCfg {
    id: String,
}

#[derive(Debug, serde::Deserialize)]
struct UplinkCfg {
    enable: bool,
    base_url: String,
    snapshot_dir: String,
    #[serde(default = "default_refresh_interval_secs")]
    refresh_interval_secs: i64,
}

fn default_refresh_interval_secs() -> i64 {
    30
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run => run(&cfg).await?,
        Command::Detect { image } => detect_once(&cfg, &image)?,
        Command::Compare { template, search, annotated_out } => {
            compare_once(&template, &search, annotated_out.as_deref())?
        }
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    anyhow::ensure!(!cfg.facility.id.trim().is_empty(), "facility.id missing");
    uplink_doctor::check_endpoint(&cfg.uplink.base_url)?;
    uplink_doctor::check_snapshot_dir(&cfg.uplink.snapshot_dir)?;
    anyhow::ensure!(
        cfg.uplink.refresh_interval_secs > 0,
        "uplink.refresh_interval_secs must be positive"
    );

    if let Some(cam) = &cfg.camera {
        anyhow::ensure!(
            matches!(cam.mode.as_str(), "libcamera-jpeg" | "v4l2-mjpeg"),
            "unknown camera.mode: {}",
            cam.mode
        );
        anyhow::ensure!(cam.fps > 0, "camera.fps must be positive");
    }

    anyhow::ensure!(
        cfg.detection.mask_coverage_threshold > 0.0 && cfg.detection.mask_coverage_threshold < 1.0,
        "detection.mask_coverage_threshold out of range"
    );
    anyhow::ensure!(
        cfg.detection.aspect_ratio_min < cfg.detection.aspect_ratio_max,
        "detection aspect ratio bounds inverted"
    );

    info!("doctor: OK");
    Ok(())
}

const TS_FMT: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

async fn run(cfg: &Config) -> Result<()> {
    info!("run: starting");

    let cam = cfg.camera.as_ref().context("no [camera] config section")?;
    std::fs::create_dir_all(&cfg.uplink.snapshot_dir).context("create snapshot dir")?;

    let uplink = if cfg.uplink.enable {
        Some(Uplink::new(cfg.uplink.base_url.clone(), cfg.facility.id.clone()))
    } else {
        None
    };

    let mut cache = OrderCache::new(time::Duration::seconds(cfg.uplink.refresh_interval_secs));
    let mut engine = DetectionEngine::new(cfg.detection.clone(), &cfg.engine);
    let frame_interval = std::time::Duration::from_millis(1000 / cam.fps.max(1) as u64);

    loop {
        let now = OffsetDateTime::now_utc();

        if cache.needs_refresh(now) {
            if let Some(u) = &uplink {
                match u.fetch_pending_orders().await {
                    Ok(orders) => cache.install(orders, now),
                    Err(e) => warn!("order refresh failed: {:#}", e),
                }
            }
        }

        let frame = camera::capture_frame(cam).await.context("camera capture")?;
        let outcome = engine.step(&frame, cache.orders(), now);

        if let FrameOutcome::Garment { color, snapshot: Some(snap), annotated, .. } = outcome {
            info!(%color, "snapshot due");
            if let Err(e) = handle_snapshot(cfg, &uplink, &mut cache, &snap, &annotated, now).await {
                warn!("snapshot handling failed: {:#}", e);
            }
        }

        tokio::time::sleep(frame_interval).await;
    }
}

/// Persist the annotated capture locally, then upload it. The local file is
/// kept either way so a dead backend never loses a capture.
async fn handle_snapshot(
    cfg: &Config,
    uplink: &Option<Uplink>,
    cache: &mut OrderCache,
    snap: &SnapshotRequest,
    annotated: &Frame,
    now: OffsetDateTime,
) -> Result<()> {
    let ts = now.format(TS_FMT).context("format timestamp")?;
    let filename = match &snap.kind {
        SnapshotKind::Matched { order_number, .. } => {
            format!("snapshot_{}_{}_{}.jpg", order_number, snap.color, ts)
        }
        SnapshotKind::Unmatched => format!("unmatched_{}_{}.jpg", snap.color, ts),
    };
    let path = Path::new(&cfg.uplink.snapshot_dir).join(&filename);

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
        .encode_image(annotated)
        .context("encode snapshot jpeg")?;
    std::fs::write(&path, &jpeg).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "snapshot saved");

    let Some(u) = uplink else { return Ok(()) };
    let meta = SnapshotMeta {
        print_facility_id: cfg.facility.id.clone(),
        detected_color: snap.color,
        confidence: snap.confidence,
        order_item_id: match &snap.kind {
            SnapshotKind::Matched { order_item_id, .. } => Some(order_item_id.clone()),
            SnapshotKind::Unmatched => None,
        },
    };
    match &snap.kind {
        SnapshotKind::Matched { .. } => {
            let ack = u.upload_matched(&meta, jpeg, &filename).await?;
            info!(status = ack.order_status.as_deref().unwrap_or("-"), "order linked");
            // The matched item should now be gone from the pending list.
            cache.force_stale();
        }
        SnapshotKind::Unmatched => {
            u.upload_unmatched(&meta, jpeg, &filename).await?;
        }
    }
    Ok(())
}

fn detect_once(cfg: &Config, image_path: &Path) -> Result<()> {
    let frame = image::open(image_path)
        .with_context(|| format!("read {}", image_path.display()))?
        .to_rgb8();
    let (width, height) = frame.dimensions();

    let artifacts = mask::build_region_masks(&frame, &cfg.detection);
    let detection = region::detect_garment(&artifacts.candidates, width, height, &cfg.detection);
    if !detection.present {
        println!("garment=none coverage={:.4}", detection.mask.coverage());
        return Ok(());
    }

    let detected = color::classify_color(&frame, &detection.mask).context("classify color")?;
    let features =
        design::extract_design_features(&frame, &detection.mask, &artifacts.edge_mask, &cfg.detection)
            .context("extract design features")?;

    println!("garment=present color={} coverage={:.4}", detected, detection.mask.coverage());
    println!(
        "design type={} keypoints={} objects={} text_regions={} edge_density={:.4} complexity={:.1}",
        features.design_type.as_str(),
        features.keypoint_count,
        features.object_contour_count,
        features.text_region_count,
        features.edge_density,
        features.complexity_score,
    );

    let annotated = annotate::annotate_detection(&frame, &detection.mask, Some(detected));
    let out = image_path.with_extension("annotated.png");
    annotated.save(&out).with_context(|| format!("write {}", out.display()))?;
    println!("annotated={}", out.display());
    Ok(())
}

fn compare_once(template: &Path, search: &Path, annotated_out: Option<&Path>) -> Result<()> {
    let report = compare_files(template, search)?;
    println!("{}", serde_json::to_string_pretty(&report).context("serialize report")?);

    let search_img = image::open(search)
        .with_context(|| format!("read {}", search.display()))?
        .to_rgb8();
    let annotated = annotate_match(&search_img, &report);
    let out = match annotated_out {
        Some(p) => p.to_path_buf(),
        None => search.with_extension("annotated.png"),
    };
    annotated.save(&out).with_context(|| format!("write {}", out.display()))?;
    println!("annotated={}", out.display());
    Ok(())
}
