// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::TokenVerifier;
use crate::identity::IdentityAggregator;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub aggregator: Arc<IdentityAggregator>,
    /// Cancelled on shutdown; each aggregation runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, aggregator: IdentityAggregator) -> Self {
        Self {
            verifier: Arc::new(verifier),
            aggregator: Arc::new(aggregator),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
