use anyhow::Result;
use clap::Parser;
use vendas::{table::encoding_for, Dataset, Report, SalesTable};

use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::PathBuf,
};

#[derive(Parser)]
#[command(version, about)]
/// Reports revenue from a semicolon-delimited CSV of sales, with charts.
struct Args {
    /// Layout of the sales file
    #[arg(short, long, value_enum, default_value_t)]
    dataset: Dataset,
    /// Text encoding of the sales file
    #[arg(short, long, default_value = "latin1")]
    encoding: String,
    /// Number of groups kept in "top" rankings
    #[arg(short, long, default_value_t = 10)]
    top: usize,
    /// Don't wait for Enter after each chart
    #[arg(long)]
    no_pause: bool,
    /// Show more log output (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
    /// Path to the sales CSV file (defaults to the dataset's usual file name)
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);
    let path = args
        .path
        .unwrap_or_else(|| PathBuf::from(args.dataset.default_path()));
    log::info!("reading {} as {:?} sales", path.display(), args.dataset);
    let table = SalesTable::read_csv(&path, encoding_for(&args.encoding)?)?;
    let mut report = Report::new(&table, args.dataset)?;
    report.top = args.top;
    let interactive = !args.no_pause && io::stdin().is_terminal();
    let mut stdout = io::stdout().lock();
    report.render(&mut stdout, || {
        if interactive {
            eprint!("Pressione Enter para continuar...");
            io::stderr().flush()?;
            io::stdin().lock().read_line(&mut String::new())?;
        }
        Ok(())
    })?;
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
