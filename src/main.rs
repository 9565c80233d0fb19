use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use coauthor_graph_analyzer::config::Config;
use coauthor_graph_analyzer::data;
use coauthor_graph_analyzer::graph::GraphStore;
use coauthor_graph_analyzer::service::{AggregatedQuery, GraphQuery, QueryService};
use coauthor_graph_analyzer::storage;

#[derive(Parser, Debug)]
#[clap(
    name = "coauthor-graph-analyzer",
    about = "Filtered, aggregated and ranked queries over an author collaboration graph"
)]
struct Cli {
    /// Path to the authors CSV side table
    #[clap(long, default_value = "data/authors.csv")]
    authors: String,

    /// Path to the publications CSV side table
    #[clap(long, default_value = "data/publications.csv")]
    publications: String,

    /// Path to the authorship CSV side table
    #[clap(long, default_value = "data/authorship.csv")]
    authorship: String,

    /// Output directory for results
    #[clap(long, default_value = "analysis_results")]
    output_dir: String,

    /// Keep publications from this year onward
    #[clap(long)]
    year_from: Option<i32>,

    /// Keep publications up to this year
    #[clap(long)]
    year_to: Option<i32>,

    /// Keep publications whose venue contains this text
    #[clap(long)]
    venue: Option<String>,

    /// Keep only the N highest-degree nodes
    #[clap(long)]
    limit: Option<usize>,

    /// Minimum cluster size before pooling into the catch-all
    #[clap(long, default_value = "3")]
    min_cluster_size: usize,

    /// Centrality metric to rank by (degree, betweenness, closeness)
    #[clap(long, default_value = "degree")]
    metric: String,

    /// Number of entries in the centrality ranking
    #[clap(long, default_value = "50")]
    top: usize,

    /// Skip the aggregated cluster view
    #[clap(long)]
    skip_aggregation: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting coauthorship graph analysis");
    log::info!("Output: {}", args.output_dir);

    // 1. Load the ingested side tables
    let dataset = data::csv::load_dataset(&args.authors, &args.publications, &args.authorship)?;

    // 2. Build the graph store once; it is read-only from here on
    let store = Arc::new(GraphStore::from_dataset(dataset));

    let config = Config {
        min_cluster_size: args.min_cluster_size,
        centrality_top: args.top,
        ..Config::default()
    };
    let service = QueryService::new(Some(store), config.clone());

    // 3. Run the requested queries
    let stats = service.get_stats()?;
    log::info!(
        "Corpus: {} authors, {} publications; graph: {} nodes, {} edges",
        stats.total_authors,
        stats.total_publications,
        stats.graph_nodes,
        stats.graph_edges
    );

    let graph_query = GraphQuery {
        year_from: args.year_from,
        year_to: args.year_to,
        venue: args.venue.clone(),
        limit: args.limit,
    };
    let graph = match service.get_graph(&graph_query) {
        Ok(response) => {
            log::info!(
                "Filtered view: {} nodes, {} edges",
                response.stats.num_nodes,
                response.stats.num_edges
            );
            Some(response)
        }
        Err(err) if err.is_empty_result() => {
            log::warn!("Graph query matched nothing, skipping graph output");
            None
        }
        Err(err) => return Err(err.into()),
    };

    let aggregated = if args.skip_aggregation {
        None
    } else {
        let aggregated_query = AggregatedQuery {
            year_from: args.year_from,
            year_to: args.year_to,
            venue: args.venue.clone(),
            min_cluster_size: Some(args.min_cluster_size),
            limit: args.limit,
            ..Default::default()
        };
        match service.get_graph_aggregated(&aggregated_query) {
            Ok(response) => Some(response),
            Err(err) if err.is_empty_result() => {
                log::warn!("Aggregation matched nothing, skipping aggregated output");
                None
            }
            Err(err) => return Err(err.into()),
        }
    };

    let centrality = service.get_centrality(&args.metric, config.centrality_top)?;

    // 4. Save results
    storage::save_results(
        &args.output_dir,
        &stats,
        graph.as_ref(),
        aggregated.as_ref(),
        Some(&centrality),
    )?;

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
