//! Runtime settings for the balancing engine, read from the environment.

use crate::logic::combinations::MAX_MEMBERS;
use serde::{Deserialize, Serialize};

/// Ceilings and thresholds for the performance balancer's hill-climb.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Main-phase iteration ceiling.
    pub max_iterations: usize,
    /// Consecutive non-improving iterations before the main phase stops.
    pub stall_limit: usize,
    /// Stop as soon as the combined loss drops below this.
    pub target_loss: f64,
    /// Run the rescue phase when the loss is still above `target_loss * rescue_factor`.
    pub rescue_factor: f64,
    pub rescue_iterations: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3000,
            stall_limit: 500,
            target_loss: 1.0,
            rescue_factor: 1.5,
            rescue_iterations: 500,
        }
    }
}

/// Pool bounds plus search settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalancerSettings {
    pub min_pool_size: usize,
    pub max_pool_size: usize,
    pub search: SearchSettings,
}

impl Default for BalancerSettings {
    fn default() -> Self {
        Self {
            min_pool_size: 8,
            max_pool_size: 18,
            search: SearchSettings::default(),
        }
    }
}

impl BalancerSettings {
    /// Defaults overridden by `BALANCER_MIN_POOL`, `BALANCER_MAX_POOL`,
    /// `BALANCER_MAX_ITERATIONS`, `BALANCER_STALL_LIMIT` and `BALANCER_TARGET_LOSS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup. Unparsable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(raw: Option<String>, key: &str, fallback: T) -> T {
            match raw {
                Some(v) => v.trim().parse().unwrap_or_else(|_| {
                    log::warn!("Ignoring unparsable {}={:?}", key, v);
                    fallback
                }),
                None => fallback,
            }
        }

        let d = Self::default();
        let mut settings = Self {
            min_pool_size: parsed(lookup("BALANCER_MIN_POOL"), "BALANCER_MIN_POOL", d.min_pool_size),
            max_pool_size: parsed(lookup("BALANCER_MAX_POOL"), "BALANCER_MAX_POOL", d.max_pool_size),
            search: SearchSettings {
                max_iterations: parsed(
                    lookup("BALANCER_MAX_ITERATIONS"),
                    "BALANCER_MAX_ITERATIONS",
                    d.search.max_iterations,
                ),
                stall_limit: parsed(
                    lookup("BALANCER_STALL_LIMIT"),
                    "BALANCER_STALL_LIMIT",
                    d.search.stall_limit,
                ),
                target_loss: parsed(
                    lookup("BALANCER_TARGET_LOSS"),
                    "BALANCER_TARGET_LOSS",
                    d.search.target_loss,
                ),
                ..d.search
            },
        };
        if settings.max_pool_size > MAX_MEMBERS {
            log::warn!(
                "BALANCER_MAX_POOL ({}) is above the searchable limit; capping at {}",
                settings.max_pool_size,
                MAX_MEMBERS
            );
            settings.max_pool_size = MAX_MEMBERS;
        }
        if settings.min_pool_size > settings.max_pool_size {
            log::warn!(
                "BALANCER_MIN_POOL ({}) exceeds BALANCER_MAX_POOL ({}); using defaults",
                settings.min_pool_size,
                settings.max_pool_size
            );
            return Self {
                min_pool_size: d.min_pool_size,
                max_pool_size: d.max_pool_size,
                ..settings
            };
        }
        settings
    }

    pub fn pool_in_bounds(&self, size: usize) -> bool {
        (self.min_pool_size..=self.max_pool_size).contains(&size)
    }
}
