use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use termcolor::{ColorChoice, StandardStream};
use tokio::sync::RwLock;

use sharkview::api::routes;
use sharkview::capture::CaptureCatalog;
use sharkview::models::config::{
    ServerConfig, ViewConfig, DEFAULT_BIND_ADDRESS, DEFAULT_MAX_PAGE_SIZE, DEFAULT_PORT,
};
use sharkview::store::{HttpPageSource, PacketStore, PageSource, DEFAULT_PAGE_SIZE};
use sharkview::utils::{display, logging};
use sharkview::view::{Direction, PacketView, SortKey};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Packet listing viewer with a paginated REST API")]
struct Args {
    /// Log level (trace, debug, info, warn, error, off)
    #[clap(long, default_value = "info", global = true)]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve capture files over the listing API
    Serve {
        /// JSON capture file to load (repeatable)
        #[clap(short, long = "capture", required = true)]
        captures: Vec<PathBuf>,

        /// Address to bind the REST API server to
        #[clap(long, default_value = DEFAULT_BIND_ADDRESS)]
        bind: String,

        /// Port for the REST API server
        #[clap(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Largest page a client may request
        #[clap(long, default_value_t = DEFAULT_MAX_PAGE_SIZE)]
        max_page_size: usize,
    },

    /// Load pages of a capture from a server and print the filtered view
    View {
        /// Base URL of the listing server
        #[clap(short, long, default_value = "http://127.0.0.1:3000")]
        server: String,

        /// Capture to open (see GET /api/files)
        #[clap(long)]
        capture_id: String,

        /// Records requested per page
        #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Additional pages to load after the first
        #[clap(long, default_value_t = 0)]
        pages: usize,

        /// Display filter, e.g. "ip.src==10.0.0.5 && tcp.port==443"
        #[clap(short, long)]
        filter: Option<String>,

        /// Highlight records containing this text
        #[clap(long)]
        search: Option<String>,

        /// Sort column (no, time, source, destination, protocol, length)
        #[clap(long)]
        sort: Option<SortKey>,

        /// Sort descending instead of ascending
        #[clap(long, requires = "sort")]
        descending: bool,

        /// Mark a record by sequence number (repeatable)
        #[clap(long = "mark")]
        marks: Vec<u64>,

        /// Only show the conversation of this sequence number
        #[clap(long)]
        follow: Option<u64>,

        /// Print the layered detail of this sequence number
        #[clap(long)]
        inspect: Option<u64>,
    },

    /// List the fields a display filter can compare against
    Fields,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger with specified level
    logging::init_logger(logging::get_log_level(&args.log_level));

    info!("Starting sharkview v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Serve {
            captures,
            bind,
            port,
            max_page_size,
        } => {
            let config = ServerConfig {
                bind_address: bind,
                port,
                max_page_size: max_page_size.max(1),
                captures,
                ..ServerConfig::default()
            };
            serve(config).await
        }
        Command::View {
            server,
            capture_id,
            page_size,
            pages,
            filter,
            search,
            sort,
            descending,
            marks,
            follow,
            inspect,
        } => {
            let direction = if descending {
                Direction::Descending
            } else {
                Direction::Ascending
            };
            let config = ViewConfig {
                server,
                capture_id,
                page_size,
                pages,
                filter,
                search,
                sort: sort.map(|key| (key, direction)),
                marks,
                follow,
                inspect,
            };
            view(config).await
        }
        Command::Fields => {
            let mut out = StandardStream::stdout(ColorChoice::Auto);
            display::print_fields(&mut out)?;
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    let mut catalog = CaptureCatalog::new(config.clone());
    for path in &config.captures {
        catalog
            .load_file(path)
            .with_context(|| format!("Failed to load capture file {}", path.display()))?;
    }

    // Create a shared state for our application
    let app_state = web::Data::new(Arc::new(RwLock::new(catalog)));

    info!(
        "Starting sharkview API server on {}:{}",
        config.bind_address, config.port
    );

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

async fn view(config: ViewConfig) -> Result<()> {
    let source = HttpPageSource::new(config.server.as_str());
    let mut store = PacketStore::open(&source, config.capture_id.as_str(), config.page_size)
        .await
        .with_context(|| format!("Failed to open capture {}", config.capture_id))?;

    for _ in 0..config.pages {
        if !store.has_more() {
            break;
        }
        if let Err(e) = store.load_more(&source).await {
            warn!("Stopped loading pages: {}", e);
            break;
        }
    }

    let mut packet_view = PacketView::new();
    packet_view.sync(&store);
    if let Some(text) = &config.filter {
        packet_view.set_filter(&store, text)?;
    }
    if let Some((key, direction)) = config.sort {
        packet_view.set_sort(&store, key, direction);
    }
    if let Some(term) = &config.search {
        packet_view.set_search(&store, term);
    }
    for &sequence_number in &config.marks {
        packet_view.marks_mut().toggle(sequence_number);
    }

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    match config.follow {
        Some(sequence_number) => {
            let anchor = store
                .find(sequence_number)
                .ok_or_else(|| anyhow!("Packet {} is not loaded", sequence_number))?;
            let stream = packet_view.follow(&store, anchor);
            display::print_rows(&mut stdout, &store, &stream, &packet_view)?;
        }
        None => display::print_view(&mut stdout, &store, &packet_view)?,
    }

    if let Some(sequence_number) = config.inspect {
        let detail = source
            .fetch_detail(store.capture_id(), sequence_number)
            .await
            .with_context(|| format!("Failed to fetch packet {}", sequence_number))?;
        display::print_detail(&mut stdout, &detail)?;
    }

    Ok(())
}
