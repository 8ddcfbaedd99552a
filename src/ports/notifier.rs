//! Outbound notification port
//!
//! Fire-and-forget: implementations log their own failures and never
//! surface them to the caller. Correctness never depends on delivery.

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn emergency_exit(&self, count: usize, reason: &str);

    async fn position_closed(&self, id: &str, name: &str, reason: &str, pnl: f64, fees: f64);
}
