use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use jmr_core::api::client::{ApiClient, DEFAULT_BASE_URL};
use jmr_core::api::types::{
    format_bytes, ComicInfo, DownloadedComic, ReadInfo, SearchQuery, SortOrder, StartOutcome,
};
use jmr_core::monitor::poller::{DownloadMonitor, MonitorConfig, MonitorOutcome};

mod terminal_observer;
use terminal_observer::TerminalProgressObserver;

#[derive(Parser)]
#[command(name = "jmr", about = "Terminal client for the JM comic reader backend")]
struct Args {
    /// Backend base URL, /api prefix included
    #[arg(long, global = true, env = "JMR_SERVER", default_value = DEFAULT_BASE_URL)]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search by JM id (all digits) or by keyword
    Search {
        query: String,
        /// Result order for keyword searches
        #[arg(long, value_enum, default_value = "desc")]
        sort: SortArg,
    },
    /// Start a download and watch it until it finishes
    Download {
        jm_id: u64,
        /// Milliseconds between progress polls, at least 1
        #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
        /// Transient-failure retries per poll before giving up
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// Watch an already-running download task
    Watch {
        download_id: String,
        #[arg(long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// Delete a downloaded comic
    Delete {
        jm_id: u64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List downloaded comics
    List,
    /// Show the chapters of a downloaded comic
    Read {
        jm_id: u64,
        /// Chapter id, defaults to the first chapter
        #[arg(long)]
        chapter: Option<String>,
    },
    /// Inspect or clear the backend's conversion cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache size and whether cleanup is due
    Status,
    /// Drop cached conversion artifacts
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Desc,
    Asc,
}

impl From<SortArg> for SortOrder {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Desc => SortOrder::Desc,
            SortArg::Asc => SortOrder::Asc,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();
    let client = Arc::new(ApiClient::new(args.server));

    match args.command {
        Command::Search { query, sort } => run_search(&client, &query, sort.into()).await,
        Command::Download {
            jm_id,
            interval_ms,
            retries,
        } => run_download(client, jm_id, interval_ms, retries).await,
        Command::Watch {
            download_id,
            interval_ms,
            retries,
        } => watch_task(client, &download_id, interval_ms, retries).await,
        Command::Delete { jm_id, yes } => run_delete(&client, jm_id, yes).await,
        Command::List => run_list(&client).await,
        Command::Read { jm_id, chapter } => run_read(&client, jm_id, chapter).await,
        Command::Cache { action } => run_cache(&client, action).await,
    }
}

async fn run_search(client: &ApiClient, raw: &str, sort: SortOrder) {
    match SearchQuery::parse(raw) {
        None => eprintln!("Nothing to search for"),
        Some(SearchQuery::Id(jm_id)) => match client.search_by_id(jm_id).await {
            Ok(comic) => print_comic(&comic),
            Err(e) => eprintln!("Search failed: {}", e),
        },
        Some(SearchQuery::Keyword(keyword)) => {
            match client.search_by_keyword(&keyword, sort).await {
                Ok(results) if results.is_empty() => println!("No results for \"{}\"", keyword),
                Ok(results) => {
                    for (i, comic) in results.iter().enumerate() {
                        println!("{:>3}. JM{}  {}", i + 1, comic.id, comic.title);
                        if !comic.author.is_empty() {
                            println!("     by {}", comic.author);
                        }
                    }
                }
                Err(e) => eprintln!("Search failed: {}", e),
            }
        }
    }
}

fn print_comic(comic: &ComicInfo) {
    println!("JM{}  {}", comic.id, comic.title);
    if !comic.author.is_empty() {
        println!("Author:    {}", comic.author);
    }
    if comic.pages > 0 {
        println!("Pages:     {}", comic.pages);
    }
    if comic.favorites > 0 {
        println!("Favorites: {}", comic.favorites);
    }
    if !comic.tags.is_empty() {
        println!("Tags:      {}", comic.tags.join(", "));
    }
    if !comic.description.is_empty() {
        println!("{}", comic.description);
    }
}

async fn run_download(client: Arc<ApiClient>, jm_id: u64, interval_ms: u64, retries: u32) {
    match client.start_download(jm_id).await {
        Ok(StartOutcome::Started {
            download_id,
            message,
        }) => {
            if message.is_empty() {
                println!("Download task {} started", download_id);
            } else {
                println!("{}", message);
            }
            watch_task(client, &download_id, interval_ms, retries).await;
        }
        Ok(StartOutcome::AlreadyDownloaded { message }) => {
            println!("{}", message);
            println!("Delete it first (jmr delete {}) to download it again.", jm_id);
        }
        Err(e) => eprintln!("Download failed: {}", e),
    }
}

/// Polls the task until it reaches a terminal status, rendering progress
/// through the terminal observer.
async fn watch_task(client: Arc<ApiClient>, download_id: &str, interval_ms: u64, retries: u32) {
    let config = MonitorConfig {
        poll_interval: Duration::from_millis(interval_ms),
        max_retries: retries,
        ..MonitorConfig::default()
    };
    let mut monitor = DownloadMonitor::with_config(client.clone(), config);
    monitor.add_observer(Box::new(TerminalProgressObserver::new(client)));

    match monitor.start(download_id).join().await {
        MonitorOutcome::Completed => {}
        MonitorOutcome::Failed(e) => eprintln!("Download failed: {}", e),
        MonitorOutcome::Cancelled => eprintln!("Monitoring stopped"),
    }
}

async fn run_delete(client: &ApiClient, jm_id: u64, yes: bool) {
    if !yes && !confirm(&format!("Delete comic JM{}? This removes its files", jm_id)) {
        println!("Aborted");
        return;
    }
    match client.delete_comic(jm_id).await {
        Ok(message) if message.is_empty() => println!("Deleted JM{}", jm_id),
        Ok(message) => println!("{}", message),
        Err(e) => eprintln!("Delete failed: {}", e),
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

async fn run_list(client: &ApiClient) {
    match client.downloaded_comics().await {
        Ok(comics) if comics.is_empty() => println!("No downloaded comics yet"),
        Ok(comics) => print_library(&comics),
        Err(e) => eprintln!("Listing failed: {}", e),
    }
}

fn print_library(comics: &[DownloadedComic]) {
    for comic in comics {
        let size = if comic.file_size > 0 {
            format_bytes(comic.file_size)
        } else {
            "-".to_string()
        };
        println!(
            "JM{:<9} {:>9}  {:>3} pages  {}",
            comic.id, size, comic.pages, comic.title
        );
    }
}

async fn run_read(client: &ApiClient, jm_id: u64, chapter: Option<String>) {
    let info = match &chapter {
        Some(chapter_id) => client.read_chapter(jm_id, chapter_id).await,
        None => client.read_info(jm_id).await,
    };
    match info {
        Ok(info) => print_read_info(&info),
        Err(e) => eprintln!("Read failed: {}", e),
    }
}

fn print_read_info(info: &ReadInfo) {
    println!(
        "{} ({} chapter{})",
        info.title,
        info.total_chapters,
        if info.total_chapters == 1 { "" } else { "s" }
    );
    for chapter in &info.chapters {
        let marker = if chapter.id == info.current_chapter {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:>3}. {}  {} pages",
            marker,
            chapter.index + 1,
            chapter.name,
            chapter.pages
        );
    }
    if info.current_chapter_pages > 0 {
        println!("Current chapter: {} pages", info.current_chapter_pages);
    }
}

async fn run_cache(client: &ApiClient, action: CacheAction) {
    match action {
        CacheAction::Status => match client.cache_status().await {
            Ok(status) => {
                println!(
                    "Cache size: {} ({:.2} MB){}",
                    format_bytes(status.cache_size),
                    status.cache_size_mb,
                    if status.need_cleanup {
                        ", cleanup recommended"
                    } else {
                        ""
                    }
                );
            }
            Err(e) => eprintln!("Cache status failed: {}", e),
        },
        CacheAction::Clear => match client.clear_cache().await {
            Ok(cleared) if cleared.message.is_empty() => {
                println!("Cleared {}", format_bytes(cleared.cleared_size));
            }
            Ok(cleared) => println!("{}", cleared.message),
            Err(e) => eprintln!("Cache clear failed: {}", e),
        },
    }
}
