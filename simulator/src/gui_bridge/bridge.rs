use crate::gui_bridge::model::{ConfigView, HistoryView, LatestView, SectorsView};
use anyhow::Context;
use fmcwcore::model::PartialConfig;
use fmcwcore::store::SharedStateStore;
use fmcwcore::telemetry::LogManager;
use serde_json::json;
use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use warp::{http::StatusCode, Filter, Rejection, Reply};

/// HTTP surface over the shared store: read-only views plus reconfiguration intake.
#[derive(Clone)]
pub struct GuiBridge {
    store: Arc<SharedStateStore>,
}

fn with_store(
    store: Arc<SharedStateStore>,
) -> impl Filter<Extract = (Arc<SharedStateStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

impl GuiBridge {
    pub fn new(store: Arc<SharedStateStore>) -> Self {
        Self { store }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let latest = warp::path("latest")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_store(self.store.clone()))
            .map(|store: Arc<SharedStateStore>| {
                warp::reply::json(&LatestView::from(store.read_latest()))
            });

        let history = warp::path("history")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_store(self.store.clone()))
            .map(|store: Arc<SharedStateStore>| {
                warp::reply::json(&HistoryView {
                    entries: store.read_history(),
                })
            });

        let sectors = warp::path("sectors")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_store(self.store.clone()))
            .map(|store: Arc<SharedStateStore>| {
                let max_range_cm = store
                    .read_latest()
                    .applied
                    .map(|applied| applied.config.max_range_cm());
                warp::reply::json(&SectorsView {
                    max_range_cm,
                    cells: store.read_sectors(),
                })
            });

        let config = warp::path("config")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_store(self.store.clone()))
            .map(|store: Arc<SharedStateStore>| {
                warp::reply::json(&ConfigView::new(
                    store.requested_config(),
                    store.read_latest().applied,
                ))
            });

        let reconfigure = warp::path("reconfigure")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(with_store(self.store.clone()))
            .map(|partial: PartialConfig, store: Arc<SharedStateStore>| {
                match store.submit_reconfiguration(partial) {
                    Ok(requested) => warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": "accepted",
                            "requested": requested,
                        })),
                        StatusCode::ACCEPTED,
                    ),
                    Err(err) => warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": "rejected",
                            "error": err.to_string(),
                        })),
                        StatusCode::BAD_REQUEST,
                    ),
                }
            });

        latest.or(history).or(sectors).or(config).or(reconfigure)
    }

    /// Binds the listener right away. The returned future serves until
    /// `shutdown` turns true or its sender is dropped.
    pub fn bind(
        self,
        bind: SocketAddr,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
        let logger = LogManager::new("simulator::bridge");
        let (addr, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(bind, async move {
                while !*shutdown.borrow() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .with_context(|| format!("binding HTTP bridge on {}", bind))?;
        logger.record(&format!("HTTP bridge listening on http://{}", addr));
        Ok((addr, async move {
            server.await;
            logger.record("HTTP bridge stopped");
        }))
    }
}
