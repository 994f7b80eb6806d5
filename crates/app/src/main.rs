use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use directories::ProjectDirs;
use folio_application::AppContext;
use folio_core::{Catalog, Settings, ViewMode};
use folio_storage::{AssetOrigin, Storage};
use folio_ui::Ui;

const USAGE: &str = "usage: folio [--assets <dir>] [--view scene|grid] [--log-level <level>]";
const ASSETS_ENV: &str = "FOLIO_ASSETS";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    assets: Option<PathBuf>,
    view: Option<ViewMode>,
    log_level: Option<String>,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg, None),
        };
        let mut value = |name: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .with_context(|| format!("{name} expects a value\n{USAGE}"))
        };
        match flag.as_str() {
            "--assets" => parsed.assets = Some(PathBuf::from(value("--assets")?)),
            "--view" => {
                let raw = value("--view")?;
                let view = raw
                    .parse::<ViewMode>()
                    .map_err(|err| anyhow::anyhow!("{err}: {raw}\n{USAGE}"))?;
                parsed.view = Some(view);
            }
            "--log-level" => parsed.log_level = Some(value("--log-level")?),
            "-h" | "--help" => parsed.help = true,
            other => anyhow::bail!("unknown argument {other}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn level_filter(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// The terminal belongs to the UI, so log lines go to a file.
fn init_logging(log_path: &Path, level: Option<&str>) -> anyhow::Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = level {
        builder.filter_level(level_filter(level));
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("init logger")?;
    Ok(())
}

/// `--assets`, then `FOLIO_ASSETS`, then the saved setting, then `./assets`.
fn asset_root(args: &Args, settings: &Settings, cwd: &Path) -> PathBuf {
    let chosen = args
        .assets
        .clone()
        .or_else(|| {
            std::env::var_os(ASSETS_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| settings.asset_root.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("assets"));
    if chosen.is_absolute() {
        chosen
    } else {
        cwd.join(chosen)
    }
}

fn run() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let project_dirs =
        ProjectDirs::from("dev", "xiey", "folio").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;
    let data_dir = project_dirs.data_dir();
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    init_logging(&data_dir.join("folio.log"), args.log_level.as_deref())?;

    let db_path = config_dir.join("folio.db");
    let mut storage = Storage::open(&db_path)?;
    let mut settings = storage.load_settings()?;
    if let Some(view) = args.view {
        settings.view_mode = view;
    }

    let cwd = std::env::current_dir().context("get cwd")?;
    let root = asset_root(&args, &settings, &cwd);
    log::info!("starting folio: assets at {}, db at {}", root.display(), db_path.display());

    let catalog = Catalog::builtin().context("load built-in catalog")?;
    let ctx = AppContext::new(settings, catalog);
    let outcome = {
        let mut ui = Ui::new(ctx, Arc::new(AssetOrigin::new(root)), &mut storage);
        ui.run()?
    };
    storage.save_settings(&outcome.ctx.settings)?;
    log::info!("settings saved; bye");

    Ok(())
}
