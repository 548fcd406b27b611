use std::cmp::Ordering;
use std::fmt;

use billpay_vendors::ServiceCategory;
use serde::{Deserialize, Serialize};

use crate::providers::Provider;

/// Why a provider was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingReason {
    Active,
    Default,
    Failover,
}

impl fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Default => write!(f, "default"),
            Self::Failover => write!(f, "failover"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub provider: Provider,
    pub category: ServiceCategory,
    pub reason: RoutingReason,
}

/// Pick a provider for `category` from the full registry.
///
/// 1. The active provider, if it serves the category and is not down.
/// 2. The default provider, under the same conditions.
/// 3. The best remaining usable provider: healthy before degraded, then
///    higher success rate, then lower latency.
///
/// Returns `None` when every provider serving the category is down.
pub fn select_provider(
    providers: &[Provider],
    category: ServiceCategory,
) -> Option<(&Provider, RoutingReason)> {
    let candidates: Vec<&Provider> = providers.iter().filter(|p| p.serves(category)).collect();

    if let Some(active) = candidates
        .iter()
        .copied()
        .find(|p| p.is_active && p.health_status().is_usable())
    {
        return Some((active, RoutingReason::Active));
    }

    if let Some(default) = candidates
        .iter()
        .copied()
        .find(|p| p.is_default && p.health_status().is_usable())
    {
        return Some((default, RoutingReason::Default));
    }

    candidates
        .into_iter()
        .filter(|p| p.health_status().is_usable())
        .min_by(|a, b| compare_health(a, b))
        .map(|p| (p, RoutingReason::Failover))
}

/// Ordering for failover: `Less` means `a` is the better choice.
fn compare_health(a: &Provider, b: &Provider) -> Ordering {
    a.health_status()
        .rank()
        .cmp(&b.health_status().rank())
        .then_with(|| {
            b.health
                .success_rate
                .partial_cmp(&a.health.success_rate)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| {
            let latency = |p: &Provider| p.health.response_time_ms.unwrap_or(0);
            latency(a).cmp(&latency(b))
        })
        .then_with(|| a.name.cmp(&b.name))
}
