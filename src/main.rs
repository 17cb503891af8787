use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// Use the library modules
use qdata::core::config::Config;
use qdata::core::dataset::DatasetRequest;
use qdata::core::fetcher::FetchOptions;
use qdata::commands;

#[derive(Parser)]
#[clap(name = "qdata")]
#[clap(about = "Download and install prebuilt market data sets")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatasetArgs {
    /// Dataset name: qlib_data, qlib_data_simple or qlib_bin
    #[clap(long, default_value = "qlib_data")]
    name: String,
    /// Data layout version such as v1 or v2 ("none" for unversioned archives)
    #[clap(long)]
    dataset_version: Option<String>,
    /// Data frequency
    #[clap(long, default_value = "1d")]
    interval: String,
    /// Market region, e.g. cn or us
    #[clap(long, default_value = "cn")]
    region: String,
}

#[derive(Args)]
struct InstallArgs {
    /// Directory to install into (default from configuration)
    #[clap(long)]
    target_dir: Option<PathBuf>,
    /// Keep existing features/calendars/instruments directories
    #[clap(long)]
    keep_old: bool,
    /// Reuse an already downloaded archive instead of downloading again
    #[clap(long)]
    no_force: bool,
    /// Delete the downloaded archive after extraction
    #[clap(long)]
    delete_archive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a dataset and extract it into the target directory
    Fetch {
        #[clap(flatten)]
        dataset: DatasetArgs,
        #[clap(flatten)]
        install: InstallArgs,
        /// Skip everything if the target already holds a complete dataset
        #[clap(long)]
        exists_skip: bool,
    },
    /// Download an archive by file name (e.g. rl_data.zip or v2/qlib_data_cn_1d_latest.zip)
    DownloadFile {
        /// File name relative to the data URL; bare names are looked up under v0/
        file_name: String,
        #[clap(flatten)]
        install: InstallArgs,
    },
    /// Print the archive URL a fetch would use
    Url {
        #[clap(flatten)]
        dataset: DatasetArgs,
    },
    /// Check whether a directory holds a complete dataset
    Check {
        /// Directory to check (default from configuration)
        target_dir: Option<PathBuf>,
    },
    /// Show the active configuration
    Config,
}

fn request_for(dataset: DatasetArgs, target_dir: PathBuf) -> DatasetRequest {
    DatasetRequest {
        name: dataset.name,
        version: dataset.dataset_version,
        interval: dataset.interval,
        region: dataset.region,
        target_dir,
    }
}

fn options_for(install: &InstallArgs, exists_skip: bool, config: &Config) -> FetchOptions {
    FetchOptions {
        delete_old: !install.keep_old,
        exists_skip,
        force_download: !install.no_force,
        delete_archive: install.delete_archive || config.delete_archive,
    }
}

fn run(command: Commands) -> qdata::Result<()> {
    let config = Config::load()?;

    match command {
        Commands::Fetch {
            dataset,
            install,
            exists_skip,
        } => {
            let options = options_for(&install, exists_skip, &config);
            let target_dir = install
                .target_dir
                .unwrap_or_else(|| config.default_target_dir.clone());
            let request = request_for(dataset, target_dir);
            commands::fetch::fetch_dataset(config, &request, &options)
        }
        Commands::DownloadFile { file_name, install } => {
            let options = options_for(&install, false, &config);
            let target_dir = install
                .target_dir
                .unwrap_or_else(|| config.default_target_dir.clone());
            commands::fetch::fetch_file(config, &file_name, &target_dir, &options)
        }
        Commands::Url { dataset } => {
            let request = request_for(dataset, config.default_target_dir.clone());
            commands::url::show_url(config, &request)
        }
        Commands::Check { target_dir } => {
            let target_dir = target_dir.unwrap_or_else(|| config.default_target_dir.clone());
            commands::check::check_dataset(&target_dir).map(|_| ())
        }
        Commands::Config => commands::config::show_config(&config),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => Ok(()),
        Err(e) if e.is_declined() => {
            println!("Nothing was deleted. Choose another --target-dir or pass --keep-old.");
            log::info!("{e}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
