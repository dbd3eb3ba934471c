// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Aggregation
//!
//! Builds the caller's composite identity from two dependent lookups:
//!
//! 1. trusted subject -> workspace user (workspace-identity service)
//! 2. workspace user ID -> tenant memberships (tenant service)
//!
//! Stage two cannot start before stage one finishes. The result is either
//! complete or an error; it is rebuilt on every request.

pub mod aggregator;
pub mod directory;
pub mod error;
pub mod remote;
pub mod roles;

pub use aggregator::{IdentityAggregator, DEFAULT_AGGREGATION_TIMEOUT};
pub use directory::{LookupError, TenantDirectory, WorkspaceDirectory};
pub use error::IdentityError;
pub use remote::{RemoteTenantDirectory, RemoteWorkspaceDirectory};
pub use roles::Role;
