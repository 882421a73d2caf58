/*
 * Responsibility
 * - Shared application state attached to the Router (Clone-cheap, Arc inside)
 * - Built once from Config at startup; immutable for the process lifetime
 */
use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::routing::{PolicyError, PolicyTable, PublicPathMatcher};
use crate::services::auth::JwtVerifier;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let verifier = Arc::new(JwtVerifier::new(&config.jwt_secret));
        let public_paths = Arc::new(PublicPathMatcher::from_config(&config.public_paths));
        let policy = Arc::new(PolicyTable::parse(&config.role_rules)?);

        Ok(Self {
            pipeline: Arc::new(Pipeline::new(verifier, public_paths, policy)),
        })
    }
}
