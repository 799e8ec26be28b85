//! chatroute - multi-backend chat router
//!
//! Routes each chat turn to one of several remote language-model backends,
//! falling back in priority order when a backend is unconfigured, over its
//! rate budget, or failing. User feedback on responses feeds per-(backend,
//! style) performance scores, and the best-scoring backend for a style is
//! tried first on later turns.

pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod feedback;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod ratelimit;
pub mod recommend;
pub mod registry;
pub mod routing;
pub mod style;
