mod archive;
mod driver;
mod error;
mod settings;
mod store;
mod theme;
mod tune;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use archive::TuneArchive;
use settings::Settings;
use theme::ThemeCode;

#[derive(Parser)]
#[command(name = "tunearch_scraper", about = "Tune + ABC scraper for the Traditional Tune Archive")]
struct Cli {
    /// Directory the tune files are written to
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Archive root URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape theme code by theme code into tunes-<code>.json (default)
    Codes {
        /// Start the sweep at this code
        #[arg(long)]
        from: Option<ThemeCode>,
        /// Scrape only this code
        #[arg(long, conflicts_with = "from")]
        only: Option<ThemeCode>,
    },
    /// Scrape the whole catalog page by page into tunes.json
    All,
    /// Show how many theme codes are already on disk
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    if let Some(dir) = cli.out_dir {
        settings.out_dir = dir;
    }
    if let Some(url) = cli.base_url {
        settings.base_url = url;
    }

    let archive = TuneArchive::new(settings.base_url.as_str()).with_progress(settings.progress);
    let command = cli.command.unwrap_or(Commands::Codes { from: None, only: None });

    let result = match command {
        Commands::Codes { from, only } => {
            let codes: Box<dyn Iterator<Item = ThemeCode>> = match (only, from) {
                (Some(code), _) => Box::new(std::iter::once(code)),
                (None, Some(start)) => Box::new(ThemeCode::starting_from(start)),
                (None, None) => Box::new(ThemeCode::all()),
            };
            info!(base_url = %settings.base_url, out_dir = ?settings.out_dir, "Scraping by theme code");
            let stats =
                driver::scrape_by_code(&archive, &settings.out_dir, codes, settings.paging()).await?;
            println!(
                "\nDone: {} codes ({} already on disk, {} scraped), {} tunes saved.",
                stats.codes, stats.skipped, stats.scraped, stats.tunes
            );
            Ok(())
        }
        Commands::All => {
            info!(base_url = %settings.base_url, out_dir = ?settings.out_dir, "Scraping whole catalog");
            let run = driver::scrape_all(&archive, &settings.out_dir, settings.page_size).await?;
            println!(
                "\nDone: {} pages, {} tunes fetched, {} saved to {:?}.",
                run.pages,
                run.fetched,
                run.kept,
                store::all_tunes_path(&settings.out_dir)
            );
            Ok(())
        }
        Commands::Status => {
            let s = store::status(&settings.out_dir)?;
            println!("Codes done: {}/{}", s.codes_done, theme::CODE_COUNT);
            println!("Remaining:  {}", theme::CODE_COUNT - s.codes_done);
            println!("Tunes:      {}", s.tunes);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
