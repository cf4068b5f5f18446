//! Sheetvault CLI - ingest spreadsheets into a SQLite vault and read them back

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sheetvault::prelude::*;
use sheetvault::DEFAULT_MAX_FILE_SIZE;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetvault")]
#[command(
    author,
    version,
    about = "Store spreadsheets as sparse cells and page through them"
)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "SHEETVAULT_DB", default_value = "sheetvault.db")]
    db: PathBuf,

    /// Largest accepted upload in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a spreadsheet and store it
    Ingest {
        /// Input spreadsheet file (xlsx, xls)
        input: PathBuf,

        /// Name to store the file under (default: the input's file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List stored files, newest first
    List {
        #[arg(long, default_value = "0")]
        skip: u32,

        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show a stored file and its sheets
    Show { file_id: FileId },

    /// Print one page of a sheet as JSON
    Page {
        file_id: FileId,
        sheet_id: SheetId,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Rows per page (default: 50)
        #[arg(short = 's', long)]
        page_size: Option<u32>,
    },

    /// Write a stored file's original bytes
    Download {
        file_id: FileId,

        /// Output file (default: the stored file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write one embedded image's bytes
    Image {
        image_id: i64,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a stored file and everything parsed from it
    Delete { file_id: FileId },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = SqliteStore::open_path(&cli.db)
        .with_context(|| format!("Failed to open database '{}'", cli.db.display()))?;

    match cli.command {
        Commands::Ingest { input, name } => ingest(&store, cli.max_file_size, &input, name),
        Commands::List { skip, limit } => {
            print_json(&SheetViewer::new(&store).list_files(skip, limit)?)
        }
        Commands::Show { file_id } => print_json(&SheetViewer::new(&store).file_detail(file_id)?),
        Commands::Page {
            file_id,
            sheet_id,
            page,
            page_size,
        } => print_json(&SheetViewer::new(&store).page(file_id, sheet_id, page, page_size)?),
        Commands::Download { file_id, output } => download(&store, file_id, output.as_deref()),
        Commands::Image { image_id, output } => image(&store, image_id, output.as_deref()),
        Commands::Delete { file_id } => {
            SheetViewer::new(&store).delete_file(file_id)?;
            eprintln!("Deleted file {}", file_id);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON")?;
    writeln!(stdout).context("Failed to write to stdout")?;
    Ok(())
}

fn ingest(store: &SqliteStore, max_file_size: u64, input: &Path, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => input
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("'{}' has no usable file name", input.display()))?,
    };
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read '{}'", input.display()))?;

    let ingestor = Ingestor::with_options(store, IngestOptions { max_file_size });
    let receipt = ingestor
        .ingest(&name, bytes)
        .with_context(|| format!("Failed to ingest '{}'", input.display()))?;
    print_json(&receipt)
}

fn download(store: &SqliteStore, file_id: FileId, output: Option<&Path>) -> Result<()> {
    let download = SheetViewer::new(store).download(file_id)?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_download_path(&download.file_name)?,
    };

    std::fs::write(&path, &download.bytes)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    eprintln!(
        "Wrote {} bytes ({}) to '{}'",
        download.bytes.len(),
        download.content_type,
        path.display()
    );
    Ok(())
}

/// The stored name's last component, so a download without `--output`
/// always lands in the working directory
fn default_download_path(file_name: &str) -> Result<PathBuf> {
    Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .with_context(|| format!("Stored name '{}' has no file name, pass --output", file_name))
}

fn image(store: &SqliteStore, image_id: i64, output: Option<&Path>) -> Result<()> {
    let payload = SheetViewer::new(store).image(image_id)?;

    if let Some(path) = output {
        std::fs::write(path, &payload.bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        eprintln!("Wrote {} image to '{}'", payload.content_type, path.display());
    } else {
        io::stdout()
            .write_all(&payload.bytes)
            .context("Failed to write to stdout")?;
    }
    Ok(())
}
