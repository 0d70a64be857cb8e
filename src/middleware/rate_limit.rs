use std::{
    collections::{HashMap, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::{auth::client_ip, config::RateLimitConfig, error::AppError};

pub const AUTH_LIMIT_MESSAGE: &str = "Too many login attempts, please try again later";
pub const REFRESH_LIMIT_MESSAGE: &str = "Too many refresh attempts, please try again later";

const SHARD_COUNT: usize = 16;
const PRUNE_THRESHOLD: usize = 1024;
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Per-key request throttling. Implementations backed by a shared store can
/// replace the in-process limiter when running several replicas.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str) -> RateDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _key: &str) -> RateDecision {
        RateDecision::Allowed
    }
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window counter. Keys are spread over mutex-guarded shards so
/// unrelated clients rarely contend.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    shards: Vec<Mutex<HashMap<String, Window>>>,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_for(&self, key: &str) -> &Mutex<HashMap<String, Window>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut shard = self
            .shard_for(key)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if shard.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            shard.retain(|_, entry| now.duration_since(entry.started_at) < window);
        }

        let entry = shard.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        allow_within_window(entry, now, self.window, self.max_requests)
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }
}

fn allow_within_window(
    entry: &mut Window,
    now: Instant,
    window: Duration,
    max_requests: u32,
) -> RateDecision {
    let elapsed = now.duration_since(entry.started_at);
    if elapsed >= window {
        entry.started_at = now;
        entry.count = 0;
    }
    if entry.count >= max_requests {
        let retry_after = window.saturating_sub(now.duration_since(entry.started_at));
        return RateDecision::Limited { retry_after };
    }
    entry.count += 1;
    RateDecision::Allowed
}

/// Builds the limiter for one endpoint group, or a no-op one when limiting is
/// switched off.
pub fn limiter_from_config(
    cfg: &RateLimitConfig,
    window_secs: u64,
    max_requests: u32,
) -> Arc<dyn RateLimiter> {
    if !cfg.enabled {
        return Arc::new(NoopRateLimiter);
    }
    Arc::new(FixedWindowLimiter::new(
        Duration::from_secs(window_secs),
        max_requests,
    ))
}

fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<dyn RateLimiter>,
    message: Arc<str>,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<dyn RateLimiter>, message: &str) -> Self {
        Self {
            limiter,
            message: Arc::from(message),
        }
    }
}

#[derive(Clone)]
pub struct RateLimit<S> {
    inner: S,
    limiter: Arc<dyn RateLimiter>,
    message: Arc<str>,
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            limiter: Arc::clone(&self.limiter),
            message: Arc::clone(&self.message),
        }
    }
}

impl<S> Service<Request<Body>> for RateLimit<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let key = client_ip(req.headers(), req.extensions())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        let decision = self.limiter.check(&key);
        let message = Arc::clone(&self.message);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let RateDecision::Limited { retry_after } = decision {
                tracing::warn!(client = %key, "rate limit exceeded");
                return Ok(
                    AppError::too_many_requests(message.as_ref(), retry_after_secs(retry_after))
                        .into_response(),
                );
            }
            inner.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{
        FixedWindowLimiter, NoopRateLimiter, PRUNE_THRESHOLD, RateDecision, RateLimiter,
        retry_after_secs,
    };

    #[test]
    fn allows_up_to_max_then_limits() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(60), 3);
        let start = Instant::now();

        for _ in 0..3 {
            assert_eq!(limiter.check_at("10.0.0.1", start), RateDecision::Allowed);
        }
        assert_eq!(
            limiter.check_at("10.0.0.1", start + Duration::from_secs(20)),
            RateDecision::Limited {
                retry_after: Duration::from_secs(40)
            }
        );
    }

    #[test]
    fn keys_are_counted_separately() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();

        assert_eq!(limiter.check_at("a", now), RateDecision::Allowed);
        assert_eq!(limiter.check_at("b", now), RateDecision::Allowed);
        assert!(matches!(
            limiter.check_at("a", now),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();

        assert_eq!(limiter.check_at("a", start), RateDecision::Allowed);
        assert!(matches!(
            limiter.check_at("a", start + Duration::from_secs(59)),
            RateDecision::Limited { .. }
        ));
        assert_eq!(
            limiter.check_at("a", start + Duration::from_secs(60)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn stale_windows_are_pruned() {
        let limiter = FixedWindowLimiter::new(Duration::from_secs(1), 5);
        let start = Instant::now();

        for i in 0..(PRUNE_THRESHOLD * super::SHARD_COUNT) {
            limiter.check_at(&format!("client-{i}"), start);
        }
        let later = start + Duration::from_secs(5);
        for i in 0..(PRUNE_THRESHOLD * super::SHARD_COUNT) {
            limiter.check_at(&format!("fresh-{i}"), later);
        }

        assert!(limiter.tracked_keys() < 2 * PRUNE_THRESHOLD * super::SHARD_COUNT);
    }

    #[test]
    fn retry_after_rounds_up_to_whole_seconds() {
        assert_eq!(retry_after_secs(Duration::from_millis(1_500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[test]
    fn noop_rate_limiter_allows() {
        let limiter = NoopRateLimiter;
        for _ in 0..100 {
            assert_eq!(limiter.check("10.0.0.1"), RateDecision::Allowed);
        }
    }
}
