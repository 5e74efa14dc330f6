//! Axum-based HTTP server.

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use govhub_aggregator::Aggregator;

use crate::error::RpcError;
use crate::handlers;

/// State shared by every handler.
pub struct RpcState {
    pub aggregator: Arc<Aggregator>,
    pub enable_metrics: bool,
}

pub struct RpcServer {
    pub port: u16,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(port: u16, aggregator: Arc<Aggregator>, enable_metrics: bool) -> Self {
        Self {
            port,
            state: Arc::new(RpcState {
                aggregator,
                enable_metrics,
            }),
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until `shutdown_rx` fires.
    pub async fn start(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<(), RpcError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        info!("RPC server listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

pub fn router(state: Arc<RpcState>) -> Router {
    Router::new()
        .route("/chains", get(handlers::list_chains))
        .route("/chains/active", post(handlers::select_chain))
        .route("/proposals", get(handlers::list_proposals))
        .route("/refresh", post(handlers::refresh))
        .route("/snapshot", get(handlers::snapshot))
        .route("/metrics", get(handlers::metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use govhub_aggregator::AggregatorOptions;
    use govhub_client::ClientError;
    use govhub_nullables::{fixtures, NullGovQuery, NullSigner};
    use govhub_registry::ChainRegistry;
    use govhub_types::TallyResult;
    use tower::ServiceExt;

    use crate::handlers::{ChainsResponse, ProposalsResponse, RefreshResponse};

    fn app(query: Arc<NullGovQuery>, enable_metrics: bool) -> (Router, Arc<Aggregator>) {
        let registry =
            ChainRegistry::new(vec![fixtures::chain("a"), fixtures::chain("b")]).unwrap();
        let aggregator = Arc::new(Aggregator::new(
            registry,
            query,
            AggregatorOptions::default(),
        ));
        let server = RpcServer::new(0, aggregator.clone(), enable_metrics);
        (server.router(), aggregator)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn select_chain_then_list_proposals() {
        let query = Arc::new(NullGovQuery::new());
        query.set_proposals("b", vec![fixtures::proposal("4")]);
        query.set_tally("b", "4", TallyResult::new(1u32, 3u32, 0u32, 0u32));
        let (app, _) = app(query, false);

        let response = app
            .clone()
            .oneshot(post_json("/chains/active", r#"{"chain_id":"b"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let refresh: RefreshResponse = body_json(response).await;
        assert!(refresh.applied);
        assert_eq!(refresh.proposals, 1);

        let response = app
            .oneshot(Request::get("/proposals").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let proposals: ProposalsResponse = body_json(response).await;
        assert_eq!(proposals.chain_id.unwrap().as_str(), "b");
        let view = &proposals.proposals[0];
        assert_eq!(view.percentages.unwrap().no, 75);
        assert!(view.vote.is_none());
    }

    #[tokio::test]
    async fn unknown_chain_is_404() {
        let (app, _) = app(Arc::new(NullGovQuery::new()), false);
        let response = app
            .oneshot(post_json("/chains/active", r#"{"chain_id":"nope"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chains_show_activity_and_bindings() {
        let query = Arc::new(NullGovQuery::new());
        query.set_count("a", 2);
        let (app, aggregator) = app(query, false);
        aggregator
            .attach_signer(Arc::new(NullSigner::new().with_account("b", "addr-b")))
            .await;
        aggregator.connect_wallet().await.unwrap();
        aggregator.refresh_activity().await;

        let response = app
            .oneshot(Request::get("/chains").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let chains: ChainsResponse = body_json(response).await;
        assert_eq!(chains.chains.len(), 2);
        assert_eq!(chains.chains[0].active_proposals, Some(2));
        assert!(chains.chains[0].address.is_none());
        assert_eq!(chains.chains[1].address.as_ref().unwrap().as_str(), "addr-b");
    }

    #[tokio::test]
    async fn metrics_respect_enable_flag() {
        let (disabled, _) = app(Arc::new(NullGovQuery::new()), false);
        let response = disabled
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (enabled, _) = app(Arc::new(NullGovQuery::new()), true);
        let response = enabled
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("govhub_proposal_fetches_total"));
    }

    #[tokio::test]
    async fn refresh_failure_is_502() {
        let query = Arc::new(NullGovQuery::new());
        query.fail_proposals("a", ClientError::Transport("refused".into()));
        let (app, _) = app(query, false);
        let response = app
            .oneshot(Request::post("/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
