//! Graph management handlers

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use linkrank_common::errors::{AppError, Result};
use linkrank_engine::{Edge, Graph, GraphArtifact};
use serde::{Deserialize, Serialize};

use crate::extract::JsonBody;
use crate::AppState;

/// Request to replace the stored graph
#[derive(Debug, Default, Deserialize)]
pub struct UploadGraphRequest {
    #[serde(default)]
    pub graph: Option<Graph>,
}

#[derive(Serialize)]
pub struct DefaultGraphResponse {
    pub status: &'static str,
    pub graph: Graph,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl_info: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct UploadGraphResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub nodes: usize,
}

#[derive(Serialize)]
pub struct NodeView<'a> {
    pub id: &'a str,
}

#[derive(Serialize)]
pub struct GraphView<'a> {
    pub nodes: Vec<NodeView<'a>>,
    pub edges: Vec<Edge<'a>>,
}

/// Load the configured artifact into the store
pub async fn default_graph(State(state): State<AppState>) -> Result<Json<DefaultGraphResponse>> {
    let path = &state.config.graph.artifact_path;
    let artifact = GraphArtifact::load(path).await?;

    state.store.set_graph(artifact.graph.clone()).await;
    tracing::info!(
        path = %path.display(),
        nodes = artifact.graph.node_count(),
        edges = artifact.graph.edge_count(),
        "Default graph loaded"
    );

    Ok(Json(DefaultGraphResponse {
        status: "ok",
        graph: artifact.graph,
        crawl_info: artifact.crawl_info,
    }))
}

/// Replace the stored graph with the request body's graph
pub async fn upload_graph(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UploadGraphRequest>,
) -> Result<Json<UploadGraphResponse>> {
    let graph = request.graph.ok_or_else(|| AppError::Validation {
        message: "graph object is required".to_string(),
        field: Some("graph".to_string()),
    })?;

    let nodes = graph.node_count();
    let edges = graph.edge_count();
    let generation = state.store.set_graph(graph).await;
    tracing::info!(nodes, edges, generation, "Graph uploaded");

    Ok(Json(UploadGraphResponse {
        status: "ok",
        message: "Graph stored",
        nodes,
    }))
}

/// Node and edge lists of the stored graph
pub async fn get_graph(State(state): State<AppState>) -> Result<Response> {
    let graph = state.store.graph().await.ok_or(AppError::GraphNotFound)?;

    let view = GraphView {
        nodes: graph.nodes().into_iter().map(|id| NodeView { id }).collect(),
        edges: graph.edges().collect(),
    };

    // Serialized here, while the view still borrows the snapshot
    Ok(Json(view).into_response())
}
