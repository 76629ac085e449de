mod settings;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use facetally_core::aggregation::aggregate::AggregationPolicy;
use facetally_core::analysis::domain::face_analyzer::FaceAnalyzer;
use facetally_core::analysis::infrastructure::confidence_gate::ConfidenceGate;
use facetally_core::analysis::infrastructure::replay_face_analyzer::ReplayFaceAnalyzer;
use facetally_core::annotation::domain::frame_annotator::FrameAnnotator;
use facetally_core::annotation::infrastructure::label_annotator::LabelAnnotator;
use facetally_core::export::result_exporter::{
    read_tables, write_rows, ExportError, ResultExporter,
};
use facetally_core::export::result_summary::ResultSummary;
use facetally_core::identity::domain::face_gallery::FaceGallery;
use facetally_core::identity::domain::identity::Identity;
use facetally_core::identity::domain::identity_resolver::IdentityResolver;
use facetally_core::identity::domain::identity_store::FaceIdentityStore;
use facetally_core::identity::infrastructure::embedding_identity_resolver::{
    self, EmbeddingIdentityResolver,
};
use facetally_core::identity::infrastructure::histogram_identity_resolver::{
    self, HistogramIdentityResolver,
};
use facetally_core::pipeline::frame_tracker::FrameTracker;
use facetally_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetally_core::pipeline::track_faces_use_case::TrackFacesUseCase;
use facetally_core::shared::constants::{EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL};
use facetally_core::shared::model_resolver;
use facetally_core::video::domain::video_reader::VideoReader;
use facetally_core::video::domain::video_transcoder::VideoTranscoder;
use facetally_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facetally_core::video::infrastructure::ffmpeg_transcoder::FfmpegTranscoder;
use facetally_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use facetally_core::video::infrastructure::image_file_writer::ImageFileWriter;

use settings::{GenderTie, ResolverKind, Settings};

const NO_FACES_EXIT_CODE: i32 = 2;

/// Track faces through a video and tally age, gender, race and emotion
/// per person.
#[derive(Parser)]
#[command(name = "facetally")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate a video and export one result row per person.
    Track(TrackArgs),
    /// Build chart data over one or more exported result tables.
    Summarize(SummarizeArgs),
}

#[derive(Args)]
struct TrackArgs {
    /// Input video file.
    input: PathBuf,

    /// Annotated output video.
    output: PathBuf,

    /// Per-frame classifier output (JSON array of frame records).
    #[arg(long)]
    analysis: PathBuf,

    /// Directory for one saved crop per person [default: faces/ next to the output].
    #[arg(long)]
    gallery: Option<PathBuf>,

    /// Per-person results table [default: output path with .csv extension].
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write chart data as JSON.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Also transcode the output to a browser-playable H.264 MP4.
    #[arg(long)]
    playable: Option<PathBuf>,

    /// Minimum face confidence (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// How faces are matched against the gallery.
    #[arg(long, value_enum)]
    resolver: Option<ResolverKind>,

    /// Match threshold for the resolver [default: resolver specific].
    #[arg(long, allow_negative_numbers = true)]
    similarity: Option<f64>,

    /// TrueType font for labels [default: built-in bitmap font].
    #[arg(long)]
    font: Option<PathBuf>,

    /// Gender reported when Man and Woman are equally frequent.
    #[arg(long, value_enum)]
    gender_tie: Option<GenderTie>,

    /// Settings file [default: <config dir>/FaceTally/settings.json].
    #[arg(long)]
    config: Option<PathBuf>,
}

impl TrackArgs {
    fn csv_path(&self) -> PathBuf {
        self.csv
            .clone()
            .unwrap_or_else(|| self.output.with_extension("csv"))
    }
}

#[derive(Args)]
struct SummarizeArgs {
    /// Result tables written by `track`, combined in the given order.
    #[arg(required = true)]
    tables: Vec<PathBuf>,

    /// Where to write the chart data.
    #[arg(long)]
    summary: PathBuf,
}

enum Outcome {
    Exported(usize),
    NoFaces,
}

fn main() {
    env_logger::init();

    let result = match Cli::parse().command {
        Command::Track(args) => track(&args),
        Command::Summarize(args) => summarize(&args),
    };

    match result {
        Ok(Outcome::Exported(people)) => log::info!("Done: {people} people tallied"),
        Ok(Outcome::NoFaces) => {
            eprintln!("No faces found");
            process::exit(NO_FACES_EXIT_CODE);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn track(cli: &TrackArgs) -> Result<Outcome, Box<dyn std::error::Error>> {
    let settings = merge(Settings::load(cli.config.as_deref())?, cli);
    validate(cli)?;
    settings.validate()?;

    let csv_path = cli.csv_path();
    let gallery_dir = cli.gallery.clone().unwrap_or_else(|| default_gallery(&cli.output));
    let policy = AggregationPolicy {
        gender_tie: settings.gender_tie.into(),
    };

    let analyzer = build_analyzer(&cli.analysis, settings.confidence)?;
    let resolver = build_resolver(&settings)?;
    let annotator = build_annotator(&settings)?;
    let gallery = FaceGallery::open(&gallery_dir, Box::new(ImageFileWriter::new()))?;
    let tracker = FrameTracker::new(
        analyzer,
        FaceIdentityStore::new(resolver, gallery),
        annotator,
        policy,
    );

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&cli.input)?;
    let total = metadata.total_frames;
    let progress: Box<dyn Fn(usize, usize) + Send> = Box::new(move |current, _| {
        if total > 0 {
            eprint!("\rProcessing frame {current}/{total}");
        } else {
            eprint!("\rProcessing frame {current}");
        }
    });

    let mut use_case = TrackFacesUseCase::new(
        reader,
        Box::new(FfmpegWriter::new()),
        tracker,
        Box::new(StdoutPipelineLogger::default()),
        Some(progress),
    );
    use_case.execute(&metadata, &cli.output)?;
    eprintln!();
    log::info!("Output written to {}", cli.output.display());

    let outcome = export(
        use_case.store().all_identities(),
        policy,
        &csv_path,
        cli.summary.as_deref(),
    )?;

    if let Some(playable) = &cli.playable {
        FfmpegTranscoder::new().transcode(&cli.output, playable)?;
        log::info!("Playable copy written to {}", playable.display());
    }

    Ok(outcome)
}

fn summarize(args: &SummarizeArgs) -> Result<Outcome, Box<dyn std::error::Error>> {
    ensure_parent_exists(&args.summary)?;
    let summary_path = resolved(&args.summary);
    if args.tables.iter().any(|t| resolved(t) == summary_path) {
        return Err("Summary must not overwrite an input table".into());
    }

    let rows = read_tables(&args.tables)?;
    if rows.is_empty() {
        return Ok(Outcome::NoFaces);
    }
    ResultSummary::from_rows(&rows).write_json(&args.summary)?;
    log::info!(
        "Summarized {} people from {} tables",
        rows.len(),
        args.tables.len()
    );
    Ok(Outcome::Exported(rows.len()))
}

/// Flag values win over the settings file.
fn merge(mut settings: Settings, cli: &TrackArgs) -> Settings {
    if let Some(c) = cli.confidence {
        settings.confidence = c;
    }
    if let Some(r) = cli.resolver {
        settings.resolver = r;
    }
    if let Some(s) = cli.similarity {
        settings.similarity = Some(s);
    }
    if let Some(f) = &cli.font {
        settings.font = Some(f.clone());
    }
    if let Some(t) = cli.gender_tie {
        settings.gender_tie = t;
    }
    settings
}

fn validate(cli: &TrackArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_file() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.analysis.is_file() {
        return Err(format!("Analysis file not found: {}", cli.analysis.display()).into());
    }
    let csv_path = cli.csv_path();
    let outputs = [
        ("output", Some(cli.output.as_path())),
        ("CSV", Some(csv_path.as_path())),
        ("summary", cli.summary.as_deref()),
        ("playable", cli.playable.as_deref()),
    ];
    for path in outputs.iter().filter_map(|(_, path)| *path) {
        ensure_parent_exists(path)?;
    }

    let mut seen = vec![("input", resolved(&cli.input))];
    for (name, path) in outputs {
        let Some(path) = path else { continue };
        let path = resolved(path);
        if let Some((other, _)) = seen.iter().find(|(_, p)| *p == path) {
            return Err(format!("The {name} path must differ from the {other} path").into());
        }
        seen.push((name, path));
    }
    Ok(())
}

fn ensure_parent_exists(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            Err(format!("Output directory not found: {}", dir.display()).into())
        }
        _ => Ok(()),
    }
}

/// Canonical form of a path whose file may not exist yet. The parent
/// directory is resolved instead and the file name appended.
fn resolved(path: &Path) -> PathBuf {
    if let Ok(path) = path.canonicalize() {
        return path;
    }
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    dir.canonicalize()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn default_gallery(output: &Path) -> PathBuf {
    output
        .parent()
        .map(|dir| dir.join("faces"))
        .unwrap_or_else(|| PathBuf::from("faces"))
}

fn build_analyzer(
    analysis: &Path,
    confidence: f64,
) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>> {
    let replay = ReplayFaceAnalyzer::from_path(analysis)?;
    Ok(Box::new(ConfidenceGate::new(Box::new(replay), confidence)?))
}

fn build_resolver(
    settings: &Settings,
) -> Result<Box<dyn IdentityResolver>, Box<dyn std::error::Error>> {
    match settings.resolver {
        ResolverKind::Histogram => Ok(Box::new(HistogramIdentityResolver::new(
            settings
                .similarity
                .unwrap_or(histogram_identity_resolver::DEFAULT_THRESHOLD),
        ))),
        ResolverKind::Embedding => {
            log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
            let model_path = model_resolver::resolve(
                EMBEDDING_MODEL_NAME,
                EMBEDDING_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            Ok(Box::new(EmbeddingIdentityResolver::new(
                &model_path,
                settings
                    .similarity
                    .unwrap_or(embedding_identity_resolver::DEFAULT_THRESHOLD),
            )?))
        }
    }
}

fn build_annotator(
    settings: &Settings,
) -> Result<Box<dyn FrameAnnotator>, Box<dyn std::error::Error>> {
    match &settings.font {
        Some(path) => Ok(Box::new(LabelAnnotator::from_font_file(path)?)),
        None => Ok(Box::new(LabelAnnotator::new())),
    }
}

fn export(
    identities: &[Identity],
    policy: AggregationPolicy,
    csv_path: &Path,
    summary_path: Option<&Path>,
) -> Result<Outcome, ExportError> {
    let rows = match ResultExporter::new(policy).rows(identities) {
        Ok(rows) => rows,
        Err(_) => return Ok(Outcome::NoFaces),
    };
    write_rows(&rows, csv_path)?;
    log::info!("Wrote {} people to {}", rows.len(), csv_path.display());

    if let Some(path) = summary_path {
        ResultSummary::from_rows(&rows).write_json(path)?;
    }
    Ok(Outcome::Exported(rows.len()))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face embedding model... {pct}%");
    } else {
        eprint!("\rDownloading face embedding model... {downloaded} bytes");
    }
}
