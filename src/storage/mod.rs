//! Results persistence for the CLI host

use crate::service::{AggregatedResponse, CentralityResponse, GraphResponse, StatsResponse};
use anyhow::Result;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Save the shaped query responses to the output directory as pretty
/// JSON, one file per artifact. Responses skipped by the host (empty
/// filter matches, disabled stages) are simply absent.
pub fn save_results(
    output_dir: &str,
    stats: &StatsResponse,
    graph: Option<&GraphResponse>,
    aggregated: Option<&AggregatedResponse>,
    centrality: Option<&CentralityResponse>,
) -> Result<()> {
    log::info!("Saving results to {}", output_dir);

    fs::create_dir_all(output_dir)?;

    write_json(output_dir, "stats.json", stats)?;
    if let Some(graph) = graph {
        write_json(output_dir, "graph.json", graph)?;
    }
    if let Some(aggregated) = aggregated {
        write_json(output_dir, "graph_aggregated.json", aggregated)?;
    }
    if let Some(centrality) = centrality {
        write_json(output_dir, "centrality.json", centrality)?;
    }

    log::info!("Results saved successfully");

    Ok(())
}

fn write_json<T: Serialize>(output_dir: &str, name: &str, value: &T) -> Result<()> {
    let path = Path::new(output_dir).join(name);
    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_file_per_present_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_string_lossy().into_owned();

        let stats = StatsResponse {
            total_authors: 2,
            total_publications: 1,
            graph_nodes: 2,
            graph_edges: 1,
        };
        save_results(&output_dir, &stats, None, None, None).unwrap();

        assert!(dir.path().join("stats.json").exists());
        assert!(!dir.path().join("graph.json").exists());

        let text = fs::read_to_string(dir.path().join("stats.json")).unwrap();
        assert!(text.contains("\"total_authors\": 2"));
    }
}
