//! Server initialization for stdio and HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! storage backend, embedding provider, and query service into a running
//! server. The HTTP transport exposes both the REST API and the MCP
//! Streamable HTTP endpoint on one listener.

use crate::api;
use crate::config::MnemoConfig;
use crate::embedding;
use crate::service::MemoryService;
use crate::storage;
use crate::tools::MnemoTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: embedding provider, storage backend, query service.
fn setup_service(config: &MnemoConfig) -> Result<Arc<MemoryService>> {
    let provider = embedding::create_provider(&config.embedding)?;
    tracing::info!(
        provider = %config.embedding.provider,
        dimensions = provider.dimensions(),
        "embedding provider ready"
    );
    let embedding: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);

    let store = storage::create_storage(&config.storage, embedding)?;
    tracing::info!(
        backend = store.backend_name(),
        db = %config.storage.resolved_db_path().display(),
        "storage ready"
    );

    Ok(Arc::new(MemoryService::new(store, config.query.clone())))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MnemoConfig) -> Result<()> {
    tracing::info!("starting mnemo MCP server on stdio");

    let service = setup_service(&config)?;

    let tools = MnemoTools::new(service);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the combined HTTP server: REST API plus the MCP Streamable HTTP
/// endpoint at `/mcp`.
pub async fn serve_http(config: MnemoConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting mnemo HTTP server");

    let service = setup_service(&config)?;

    let mcp_service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        {
            let service = Arc::clone(&service);
            move || Ok(MnemoTools::new(service.clone()))
        },
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = api::router(service).nest_service("/mcp", mcp_service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        "listening — REST at http://{bind_addr}/api, MCP at http://{bind_addr}/mcp"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
