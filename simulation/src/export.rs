//! Visualization-document export.
//!
//! Serializes the computed topology and the complete, time-ordered message
//! trace log into one JSON document for the replay front-end. Field names
//! are camelCase by contract with the viewer.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use murmur_gossip::{MessageTrace, NodeId, TraceLog};

use crate::layout::{CANVAS_HEIGHT, CANVAS_WIDTH, layout_components};
use crate::topology::{PeerGraph, largest_component_index};

/// File name of the exported document.
pub const EXPORT_FILE_NAME: &str = "network_visualization.json";

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write visualization file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize visualization data: {0}")]
    Json(#[from] serde_json::Error),
}

/// One node in the visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub id: NodeId,
    pub addr: String,
    pub x: i32,
    pub y: i32,
    pub cluster_id: i32,
}

/// A directed peer edge; mirrors the peer relation and is not guaranteed
/// symmetric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub from: NodeId,
    pub to: NodeId,
}

/// One connected component with its statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInfo {
    pub id: usize,
    pub node_ids: Vec<usize>,
    pub size: usize,
    pub center_x: i32,
    pub center_y: i32,
    /// True for every component except the largest.
    pub is_isolated: bool,
}

/// The network structure for visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub nodes: Vec<NodeInfo>,
    pub edges: Vec<EdgeInfo>,
    pub clusters: Vec<ClusterInfo>,
}

/// Everything the replay front-end needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationData {
    pub topology: NetworkTopology,
    pub traces: Vec<MessageTrace>,
    pub start_time: DateTime<Utc>,
}

/// Compute layout and clustering for `graph` and assemble the export
/// document together with the trace log.
pub fn build_visualization(
    graph: &PeerGraph,
    traces: &TraceLog,
    start_time: DateTime<Utc>,
) -> VisualizationData {
    let adjacency = graph.undirected_adjacency();
    let components = graph.connected_components();
    let positions = layout_components(&adjacency, &components, CANVAS_WIDTH, CANVAS_HEIGHT);
    let largest = largest_component_index(&components);

    let mut cluster_of = vec![-1_i32; graph.node_count()];
    for (cluster_id, component) in components.iter().enumerate() {
        for &node in component {
            cluster_of[node] = cluster_id as i32;
        }
    }

    let nodes = (0..graph.node_count())
        .map(|i| {
            let id = NodeId::from_index(i);
            NodeInfo {
                id,
                addr: id.address().to_string(),
                x: positions[i].x as i32,
                y: positions[i].y as i32,
                cluster_id: cluster_of[i],
            }
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .map(|&(from, to)| EdgeInfo { from, to })
        .collect();

    let clusters = components
        .iter()
        .enumerate()
        .map(|(id, component)| {
            let (sum_x, sum_y) = component.iter().fold((0.0, 0.0), |(sx, sy), &n| {
                (sx + positions[n].x, sy + positions[n].y)
            });
            let len = component.len() as f64;
            ClusterInfo {
                id,
                node_ids: component.clone(),
                size: component.len(),
                center_x: (sum_x / len) as i32,
                center_y: (sum_y / len) as i32,
                is_isolated: id != largest,
            }
        })
        .collect();

    VisualizationData {
        topology: NetworkTopology {
            nodes,
            edges,
            clusters,
        },
        traces: traces.snapshot(),
        start_time,
    }
}

/// Write the document as pretty-printed JSON under `dir`, creating the
/// directory if needed. Returns the written path.
pub fn write_visualization(data: &VisualizationData, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    let json = serde_json::to_vec_pretty(data)?;
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> PeerGraph {
        // A triangle and a detached pair: two clusters.
        PeerGraph::new(
            5,
            vec![
                (NodeId(0), NodeId(1)),
                (NodeId(1), NodeId(2)),
                (NodeId(2), NodeId(0)),
                (NodeId(3), NodeId(4)),
            ],
        )
    }

    #[test]
    fn test_document_covers_all_nodes_and_edges() {
        let data = build_visualization(&sample_graph(), &TraceLog::new(), Utc::now());

        assert_eq!(data.topology.nodes.len(), 5);
        assert_eq!(data.topology.edges.len(), 4);
        assert_eq!(data.topology.clusters.len(), 2);

        // Every node carries its component's cluster id.
        for node in &data.topology.nodes {
            let cluster = &data.topology.clusters[node.cluster_id as usize];
            assert!(cluster.node_ids.contains(&node.id.index()));
        }
    }

    #[test]
    fn test_only_the_largest_cluster_is_not_isolated() {
        let data = build_visualization(&sample_graph(), &TraceLog::new(), Utc::now());

        let not_isolated: Vec<&ClusterInfo> = data
            .topology
            .clusters
            .iter()
            .filter(|c| !c.is_isolated)
            .collect();
        assert_eq!(not_isolated.len(), 1);
        assert_eq!(not_isolated[0].size, 3);
    }

    #[test]
    fn test_document_serializes_with_camel_case_fields() {
        let data = build_visualization(&sample_graph(), &TraceLog::new(), Utc::now());
        let json = serde_json::to_value(&data).unwrap();

        assert!(json.get("startTime").is_some());
        let node = &json["topology"]["nodes"][0];
        assert!(node.get("clusterId").is_some());
        let cluster = &json["topology"]["clusters"][0];
        assert!(cluster.get("nodeIds").is_some());
        assert!(cluster.get("centerX").is_some());
        assert!(cluster.get("isIsolated").is_some());
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out");
        let data = build_visualization(&sample_graph(), &TraceLog::new(), Utc::now());

        let path = write_visualization(&data, &target).unwrap();
        assert!(path.ends_with(EXPORT_FILE_NAME));
        let reread: VisualizationData =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(reread.topology.nodes.len(), 5);
    }
}
