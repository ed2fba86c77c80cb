use clap::{Parser, Subcommand};
use photo_picker::cache::ArtifactCache;
use photo_picker::config::{self, CONFIG_FILE_NAME, PickerConfig};
use photo_picker::media::MediaReference;
use photo_picker::orchestrator::Picker;
use photo_picker::output;
use photo_picker::permission::StaticPermission;
use photo_picker::source::{ScriptedHost, SelectionResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "photo-picker")]
#[command(about = "Pick, orient, resize and re-encode photos the way the picker plugin does")]
#[command(long_about = "\
Pick, orient, resize and re-encode photos the way the picker plugin does

The files given to `pick` stand in for the user's selection. Each one is
read once, decoded at a reduced sample size, turned upright from its EXIF
orientation, fitted into the requested box and re-encoded as JPEG.

Options use the same JSON as the bridge's getPictures call:

  {\"maximumImagesCount\": 5, \"width\": 800, \"height\": 800,
   \"quality\": 85, \"outputType\": 0, \"includeThumbnail\": true,
   \"thumbnailWidth\": 200, \"thumbnailHeight\": 200}

outputType 0 writes JPEGs to <cache-dir>/photo_picker_images/ and returns
file:// URIs; outputType 1 returns base64 inline.

Run 'photo-picker gen-config' to generate a documented photo-picker.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults are used when it does not exist)
    #[arg(long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Cache root that receives file-reference artifacts
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a pick with the given files as the selection
    Pick {
        /// getPictures options as a JSON object
        #[arg(long, default_value = "{}")]
        options: String,

        /// Pretend the system picker is unavailable
        #[arg(long)]
        legacy: bool,

        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,

        /// Selected images, in selection order (none = cancel)
        files: Vec<PathBuf>,
    },
    /// Print a stock photo-picker.toml with all options documented
    GenConfig,
    /// Delete every cached artifact
    CleanCache,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Pick {
            options,
            legacy,
            summary,
            files,
        } => {
            let picker_config = config::load_config_file(&cli.config)?;
            init_thread_pool(&picker_config.processing);
            let cache_root = resolve_cache_root(cli.cache_dir.as_deref());
            return run_pick(picker_config, &cache_root, &options, legacy, summary, &files);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CleanCache => {
            let picker_config = config::load_config_file(&cli.config)?;
            let cache_root = resolve_cache_root(cli.cache_dir.as_deref());
            let cache = ArtifactCache::new(
                &cache_root,
                &picker_config.cache.dir_name,
                &picker_config.cache.file_prefix,
            );
            let removed = cache.clear()?;
            output::print_clean_output(removed, cache.dir());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn run_pick(
    picker_config: PickerConfig,
    cache_root: &Path,
    options: &str,
    legacy: bool,
    summary: bool,
    files: &[PathBuf],
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let options: serde_json::Value = serde_json::from_str(options)?;
    let host = Arc::new(ScriptedHost::new().with_probe(Ok(!legacy)));

    let picker = Picker::builder(
        picker_config,
        host.clone(),
        Arc::new(StaticPermission::granted()),
    )
    .system_picker(host.clone())
    .cache_root(cache_root)
    .build();
    picker.initialize();

    let (tx, rx) = mpsc::channel();
    let started = picker.pick(
        &options,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );

    let mut selected = 0;
    if started.is_some() {
        if let Some(launch) = host.last_launch() {
            let references: Vec<MediaReference> = files
                .iter()
                .take(launch.limit as usize)
                .map(|f| MediaReference::from_path(f))
                .collect();
            selected = references.len();
            let result = if references.is_empty() {
                SelectionResult::Cancelled
            } else {
                SelectionResult::Selected(references)
            };
            picker.deliver_selection(&launch.token, result);
        }
    }

    match rx.recv()? {
        Ok(response) => {
            if summary {
                output::print_pick_output(&response, selected);
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            for line in output::format_failure(&failure) {
                eprintln!("{}", line);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can only lower it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// `--cache-dir`, or the system temp directory.
fn resolve_cache_root(cli_cache_dir: Option<&Path>) -> PathBuf {
    cli_cache_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir)
}
