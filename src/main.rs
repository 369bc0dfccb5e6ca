// src/main.rs
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

use transformer_client::controllers::{
    save_image, BaselineView, ComparisonController, ImageGallery, InspectionBoard, PreviewController, Selection, TransformerDirectory, UploadForm,
};
use transformer_client::controllers::upload::read_file;
use transformer_client::input::{InputBus, InputEvent, Key};
use transformer_client::models::*;
use transformer_client::notify::{Notifier, Severity};
use transformer_client::{ApiClient, ClientConfig, TransformerApi};

#[derive(Parser)]
#[command(name = "transformer-client")]
#[command(about = "Manage transformers, inspections and thermal images")]
struct Cli {
    /// Backend origin; overrides TRANSFORMER_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List transformers, optionally filtered
    Transformers {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        region: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Create a transformer
    AddTransformer(TransformerArgs),
    /// Update a transformer
    EditTransformer {
        id: TransformerId,
        #[command(flatten)]
        fields: TransformerArgs,
    },
    /// Delete a transformer
    DeleteTransformer { id: TransformerId },
    /// List a transformer's inspections
    Inspections {
        transformer_id: TransformerId,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Record an inspection
    AddInspection {
        transformer_id: TransformerId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        inspector: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, value_enum, default_value_t = StatusArg::Open)]
        status: StatusArg,
    },
    /// List a transformer's images
    Images { transformer_id: TransformerId },
    /// Step through a transformer's images (left/right/esc on stdin, `s` saves)
    Preview {
        transformer_id: TransformerId,
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Directory that `s` saves the current image into
        #[arg(long, default_value = ".")]
        save_dir: PathBuf,
    },
    /// Upload a baseline or maintenance image
    Upload(UploadArgs),
    /// Compare the latest baseline with an inspection's maintenance images
    Compare {
        transformer_id: TransformerId,
        inspection_id: InspectionId,
        /// Also write the compared images into this directory
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Args)]
struct TransformerArgs {
    #[arg(long)]
    number: String,
    #[arg(long)]
    pole: String,
    #[arg(long)]
    region: String,
    #[arg(long, value_enum)]
    kind: KindArg,
}

#[derive(Args)]
struct UploadArgs {
    transformer_id: TransformerId,
    #[arg(long)]
    file: PathBuf,
    #[arg(long)]
    uploader: String,
    #[arg(long, default_value_t = false)]
    maintenance: bool,
    #[arg(long)]
    inspection: Option<InspectionId>,
    #[arg(long, value_enum, default_value_t = WeatherArg::Sunny)]
    weather: WeatherArg,
    #[arg(long, default_value = "")]
    temperature: String,
    #[arg(long, default_value = "")]
    humidity: String,
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Bulk,
    Distribution,
}

impl From<KindArg> for TransformerType {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Bulk => TransformerType::Bulk,
            KindArg::Distribution => TransformerType::Distribution,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Open,
    InProgress,
    Closed,
}

impl From<StatusArg> for InspectionStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Open => InspectionStatus::Open,
            StatusArg::InProgress => InspectionStatus::InProgress,
            StatusArg::Closed => InspectionStatus::Closed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WeatherArg {
    Sunny,
    Cloudy,
    Rainy,
}

impl From<WeatherArg> for Weather {
    fn from(value: WeatherArg) -> Self {
        match value {
            WeatherArg::Sunny => Weather::Sunny,
            WeatherArg::Cloudy => Weather::Cloudy,
            WeatherArg::Rainy => Weather::Rainy,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let config = match &cli.api_url {
        Some(url) => ClientConfig::with_base_url(url),
        None => ClientConfig::from_env(),
    };
    info!("Using backend at {}", config.base_url);
    let api = ApiClient::new(&config)?;

    match cli.command {
        Commands::Transformers { search, region, kind } => {
            let mut dir = TransformerDirectory::new();
            let loaded = dir.load(&api).await;
            flush(&mut dir.notifier);
            loaded?;
            dir.list.update_filter(|f| {
                f.search = search;
                f.region = region.map(Selection::Only).unwrap_or_default();
                f.kind = kind.map(|k| Selection::Only(k.into())).unwrap_or_default();
            });
            for t in dir.list.filtered() {
                println!(
                    "{:>5}  {:<12} {:<12} {:<10} {}",
                    t.id,
                    t.transformer_no,
                    t.pole_no.as_deref().unwrap_or("-"),
                    t.region.as_deref().unwrap_or("-"),
                    t.transformer_type.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string())
                );
            }
            println!("{} transformers (regions: {})", dir.list.summary(), dir.regions().join(", "));
        }
        Commands::AddTransformer(fields) => {
            let mut dir = TransformerDirectory::new();
            fill_transformer_form(&mut dir, fields);
            let saved = dir.save(&api).await;
            flush(&mut dir.notifier);
            saved?;
        }
        Commands::EditTransformer { id, fields } => {
            let mut dir = TransformerDirectory::new();
            let loaded = dir.load(&api).await;
            flush(&mut dir.notifier);
            loaded?;
            let Some(existing) = dir.list.all().iter().find(|t| t.id == id).cloned() else {
                bail!("No transformer with id {}", id);
            };
            dir.form.start_edit(&existing);
            fill_transformer_form(&mut dir, fields);
            let saved = dir.save(&api).await;
            flush(&mut dir.notifier);
            saved?;
        }
        Commands::DeleteTransformer { id } => {
            let mut dir = TransformerDirectory::new();
            let deleted = dir.delete(&api, id).await;
            flush(&mut dir.notifier);
            deleted?;
        }
        Commands::Inspections {
            transformer_id,
            search,
            status,
        } => {
            let mut board = InspectionBoard::new(transformer_id);
            let loaded = board.load(&api).await;
            flush(&mut board.notifier);
            loaded?;
            board.list.update_filter(|f| {
                f.search = search;
                f.status = status.map(|s| Selection::Only(s.into())).unwrap_or_default();
            });
            if let Some(t) = board.transformer() {
                println!("Transformer {} ({})", t.transformer_no, t.region.as_deref().unwrap_or("-"));
            }
            for i in board.list.filtered() {
                println!(
                    "{:>5}  {:<30} {:<15} {:<12} {}",
                    i.id,
                    i.title,
                    i.inspector.as_deref().unwrap_or("Unknown"),
                    i.status.label(),
                    i.created_at().map(|t| t.to_rfc3339()).unwrap_or_else(|| "Unknown".to_string())
                );
            }
            let stats = board.stats();
            println!(
                "{} inspections: {} open, {} in progress, {} closed",
                board.list.summary(),
                stats.open,
                stats.in_progress,
                stats.closed
            );
        }
        Commands::AddInspection {
            transformer_id,
            title,
            inspector,
            notes,
            status,
        } => {
            let mut board = InspectionBoard::new(transformer_id);
            board.form.title = title;
            board.form.inspector = inspector;
            board.form.notes = notes;
            board.form.status = status.into();
            let added = board.add_inspection(&api).await;
            flush(&mut board.notifier);
            added?;
        }
        Commands::Images { transformer_id } => {
            let mut gallery = ImageGallery::new();
            gallery.open(&api, transformer_id).await;
            flush(&mut gallery.notifier);
            print_images(&api, gallery.images());
        }
        Commands::Preview {
            transformer_id,
            index,
            save_dir,
        } => {
            let mut gallery = ImageGallery::new();
            gallery.open(&api, transformer_id).await;
            flush(&mut gallery.notifier);
            run_preview(&api, &gallery, index, &save_dir).await?;
        }
        Commands::Upload(args) => upload(&api, args).await?,
        Commands::Compare {
            transformer_id,
            inspection_id,
            save,
        } => {
            let inspections = api.list_inspections(transformer_id).await?;
            let Some(inspection) = inspections.into_iter().find(|i| i.id == inspection_id) else {
                bail!("No inspection {} for transformer {}", inspection_id, transformer_id);
            };
            let mut comparison = ComparisonController::default();
            comparison.load(&api, transformer_id, &inspection).await;
            print_comparison(api.base_url(), &comparison);
            if let Some(dir) = save {
                save_comparison(&api, &comparison, &dir).await?;
            }
        }
    }

    Ok(())
}

fn fill_transformer_form(dir: &mut TransformerDirectory, fields: TransformerArgs) {
    dir.form.transformer_no = fields.number;
    dir.form.pole_no = fields.pole;
    dir.form.region = fields.region;
    dir.form.transformer_type = Some(fields.kind.into());
}

async fn upload(api: &ApiClient, args: UploadArgs) -> Result<()> {
    let mut form = UploadForm::for_target(args.transformer_id, args.inspection);
    if args.maintenance {
        form.image_type = ImageType::Maintenance;
    }
    form.uploader = args.uploader;
    form.weather = Some(args.weather.into());
    form.temperature_c = args.temperature;
    form.humidity = args.humidity;
    form.location_note = args.note;

    let file = read_file(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let selected = form.select_file(file);
    flush(&mut form.notifier);
    selected?;

    let submitted = form.submit(api).await;
    flush(&mut form.notifier);
    let transformer_id = submitted?;

    let mut gallery = ImageGallery::new();
    gallery.open(api, transformer_id).await;
    flush(&mut gallery.notifier);
    print_images(api, gallery.images());
    Ok(())
}

async fn run_preview(api: &ApiClient, gallery: &ImageGallery, index: usize, save_dir: &Path) -> Result<()> {
    let bus = InputBus::new();
    let mut preview = PreviewController::new(api.base_url());
    gallery.open_preview(&mut preview, &bus, index)?;
    print_preview(&preview);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while preview.is_open() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "s" {
            if let Some(image) = preview.current() {
                let path = save_image(api, image, save_dir).await?;
                println!("Saved {}", path.display());
            }
            continue;
        }
        let key = match line.trim() {
            "l" | "left" | "p" => Key::ArrowLeft,
            "r" | "right" | "n" | "" => Key::ArrowRight,
            "q" | "esc" => Key::Escape,
            _ => Key::Other,
        };
        bus.dispatch(InputEvent::Key(key));
        if preview.pump() > 0 && preview.is_open() {
            print_preview(&preview);
        }
    }
    preview.close();
    Ok(())
}

fn print_preview(preview: &PreviewController) {
    if let Some(image) = preview.current() {
        println!(
            "[{}] {} {}",
            preview.position_label().unwrap_or_default(),
            image.filename.as_deref().unwrap_or("-"),
            preview.current_url().unwrap_or("-")
        );
        println!("    {}", image.chips().join(" | "));
        if let Some(note) = image.env_condition.as_ref().and_then(|e| e.location_note.as_deref()) {
            println!("    Note: {}", note);
        }
    }
}

fn print_images(api: &dyn TransformerApi, images: &[Image]) {
    if images.is_empty() {
        println!("No images uploaded yet");
    }
    for image in images {
        println!(
            "{:>5}  {:<12} {:<24} {}",
            image.id,
            image.image_type,
            image.filename.as_deref().unwrap_or("-"),
            api.raw_image_url(image.id)
        );
    }
}

fn describe_source(image: &Image, base_url: &str) -> String {
    match image.source(base_url) {
        ImageSource::Inline(_) => format!(
            "inline {} ({})",
            image.content_type.as_deref().unwrap_or("image"),
            image.size_label()
        ),
        ImageSource::Remote(url) => url,
    }
}

fn print_comparison(base_url: &str, comparison: &ComparisonController) {
    if let Some(message) = comparison.empty_state() {
        println!("{}", message);
        return;
    }
    match comparison.baseline() {
        BaselineView::Ready(image) => println!(
            "Baseline: #{} {} ({}) {}",
            image.id,
            image.filename.as_deref().unwrap_or("-"),
            image.created_at.as_deref().unwrap_or("undated"),
            describe_source(image, base_url)
        ),
        _ => println!("Baseline: {}", comparison.baseline_message().unwrap_or("-")),
    }
    if let Some(message) = comparison.maintenance_message() {
        println!("Maintenance: {}", message);
    }
    for (i, image) in comparison.maintenance_images().iter().enumerate() {
        println!(
            "Maintenance {}/{}: #{} {} {}",
            i + 1,
            comparison.maintenance_images().len(),
            image.id,
            image.filename.as_deref().unwrap_or("-"),
            describe_source(image, base_url)
        );
    }
}

async fn save_comparison(api: &ApiClient, comparison: &ComparisonController, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    let baseline = match comparison.baseline() {
        BaselineView::Ready(image) => Some(image),
        _ => None,
    };
    for image in baseline.into_iter().chain(comparison.maintenance_images()) {
        let path = save_image(api, image, dir).await?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn flush(notifier: &mut Notifier) {
    for n in notifier.drain() {
        match n.severity {
            Severity::Error | Severity::Warning => eprintln!("✗ {}", n.message),
            _ => eprintln!("✓ {}", n.message),
        }
    }
}
