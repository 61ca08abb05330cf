// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-core
//!
//! Core abstractions and shared types for the vigil audit engine.
//!
//! This crate provides the foundational pieces used across all vigil
//! components:
//!
//! - **Record**: the [`AuditRecord`] event model and its builder
//! - **Validation**: field-presence and length-bound checks over records
//! - **Store**: the [`AuditStore`] persistence trait and an in-memory
//!   implementation for tests and development
//! - **Error**: unified error hierarchy
//!
//! ## Example
//!
//! ```rust,ignore
//! use vigil_core::{AuditRecord, MemoryAuditStore, AuditStore};
//!
//! let record = AuditRecord::builder("LOGIN-001", "User Login", "SECURITY")
//!     .host("app-host-01", "10.0.4.17")
//!     .application("IDP", "Identity Provider")
//!     .session_user("user-4411")
//!     .created_by("idp-frontend")
//!     .build();
//!
//! record.validate()?;
//!
//! let store = MemoryAuditStore::new();
//! store.add_audit(&record).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod record;
pub mod store;
pub mod validate;

pub use error::{
    StoreError, StoreResult, ValidationError, ValidationResult, VigilError, VigilResult, WalError,
    WalResult,
};
pub use record::{AuditRecord, AuditRecordBuilder, AuditResponse};
pub use store::{AuditStore, MemoryAuditStore};
pub use validate::validate;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
