// src/middleware/rate_limit.rs

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;

use crate::{common::error::AppError, config::AppState, middleware::client_ip::ClientIp};

// Janela fixa por chave: o contador expira `window` depois do primeiro envio.
#[derive(Clone)]
pub struct UploadRateLimiter {
    counters: Cache<String, Arc<AtomicU32>>,
    limit: u32,
}

impl UploadRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        let counters = Cache::builder()
            .max_capacity(100_000)
            .time_to_live(window)
            .build();
        Self { counters, limit }
    }

    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        let counter = self
            .counters
            .get_with(key.to_string(), async { Arc::new(AtomicU32::new(0)) })
            .await;

        let used = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if used > self.limit {
            tracing::warn!("🚦 Limite de uploads atingido para {}", key);
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

pub async fn upload_rate_limit(
    State(app_state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = ip.map_or_else(|| "desconhecido".to_string(), |ip| ip.to_string());
    app_state.upload_limiter.check(&key).await?;
    Ok(next.run(request).await)
}
