//! Network interception ledger.
//!
//! Bindings register a (method, URL glob) watch under an alias before the
//! action that should produce the traffic, then suspend on `wait_for` until
//! a matching exchange arrives or the timeout passes. One ledger exists per
//! session; it is never shared across scenarios.

use crate::{Result, SessionError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

/// One completed request/response pair as the transport observed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: serde_json::Value,
}

impl Exchange {
    pub fn new(method: &str, url: &str, status: u16, body: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            status,
            body,
        }
    }
}

/// Compiled (method, URL glob) matcher. `**` spans any run of characters,
/// `*` stays within one path segment.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    method: String,
    pattern: String,
    regex: Regex,
}

impl RouteMatcher {
    pub fn new(method: &str, pattern: &str) -> Result<Self> {
        let regex = compile_glob(pattern).map_err(|reason| SessionError::InvalidRoutePattern {
            pattern: pattern.to_string(),
            reason,
        })?;
        Ok(Self {
            method: method.to_ascii_uppercase(),
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, method: &str, url: &str) -> bool {
        self.method.eq_ignore_ascii_case(method) && self.regex.is_match(url)
    }
}

fn compile_glob(pattern: &str) -> std::result::Result<Regex, String> {
    if pattern.is_empty() {
        return Err("empty pattern".to_string());
    }
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| e.to_string())
}

struct Watch {
    alias: String,
    matcher: RouteMatcher,
    /// Matched but not yet consumed exchanges, in transport order.
    queue: VecDeque<Exchange>,
    /// Suspended `wait_for` callers, FIFO. Closed senders are skipped on
    /// delivery; they belong to waits that already timed out.
    waiters: VecDeque<oneshot::Sender<Exchange>>,
}

/// Registry of network watches for one session.
#[derive(Default)]
pub struct InterceptionLedger {
    watches: Mutex<Vec<Watch>>,
}

impl InterceptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a watch. Returns immediately; the alias must be unique among
    /// live registrations.
    pub async fn register(&self, method: &str, url_glob: &str, alias: &str) -> Result<()> {
        let matcher = RouteMatcher::new(method, url_glob)?;
        let mut watches = self.watches.lock().await;
        if watches.iter().any(|w| w.alias == alias) {
            return Err(SessionError::DuplicateAlias(alias.to_string()));
        }
        tracing::debug!(alias, method, pattern = url_glob, "registered interception");
        watches.push(Watch {
            alias: alias.to_string(),
            matcher,
            queue: VecDeque::new(),
            waiters: VecDeque::new(),
        });
        Ok(())
    }

    /// Transport-side entry point. The first registration whose matcher
    /// accepts the exchange receives it; a suspended waiter gets it
    /// directly, otherwise it queues until someone waits.
    pub async fn observe(&self, exchange: Exchange) {
        let mut watches = self.watches.lock().await;
        let Some(watch) = watches
            .iter_mut()
            .find(|w| w.matcher.matches(&exchange.method, &exchange.url))
        else {
            tracing::trace!(method = %exchange.method, url = %exchange.url, "unwatched exchange");
            return;
        };
        tracing::debug!(alias = %watch.alias, url = %exchange.url, status = exchange.status, "exchange matched");
        let mut exchange = exchange;
        while let Some(waiter) = watch.waiters.pop_front() {
            match waiter.send(exchange) {
                Ok(()) => return,
                // Receiver gave up (timed out); try the next one.
                Err(returned) => exchange = returned,
            }
        }
        watch.queue.push_back(exchange);
    }

    /// Suspend until the next unconsumed exchange for `alias`, or fail with
    /// an interception timeout naming the alias and elapsed time. Each call
    /// consumes exactly one exchange; concurrent calls queue FIFO.
    pub async fn wait_for(&self, alias: &str, timeout: Duration) -> Result<Exchange> {
        let started = Instant::now();
        let receiver = {
            let mut watches = self.watches.lock().await;
            match watches.iter_mut().find(|w| w.alias == alias) {
                Some(watch) => {
                    if let Some(ready) = watch.queue.pop_front() {
                        return Ok(ready);
                    }
                    let (tx, rx) = oneshot::channel();
                    watch.waiters.push_back(tx);
                    Some(rx)
                }
                // Nothing will ever arrive for an unknown alias; still run
                // out the clock so the caller gets the timeout error rather
                // than a different failure mode.
                None => None,
            }
        };

        match receiver {
            Some(rx) => match tokio::time::timeout(timeout, rx).await {
                Ok(Ok(exchange)) => Ok(exchange),
                Ok(Err(_)) => Err(SessionError::Transport(format!(
                    "interception watch {alias:?} dropped while waiting"
                ))),
                Err(_) => Err(self.timeout_error(alias, started)),
            },
            None => {
                tokio::time::sleep(timeout).await;
                Err(self.timeout_error(alias, started))
            }
        }
    }

    fn timeout_error(&self, alias: &str, started: Instant) -> SessionError {
        SessionError::InterceptTimeout {
            alias: alias.to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }
}
