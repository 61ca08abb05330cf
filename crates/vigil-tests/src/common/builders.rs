// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Record builders for tests.
//!
//! All builders produce records that pass validation unless stated
//! otherwise.

use vigil_core::AuditRecord;

/// Builds a valid record with the given `event_id`.
pub fn audit_record(event_id: &str) -> AuditRecord {
    AuditRecord::builder(event_id, "User Login", "SECURITY")
        .host("app-host-01", "10.0.4.17")
        .application("IDP", "Identity Provider")
        .session_user("user-4411")
        .session_user_name("Jordan Doe")
        .created_by("idp-frontend")
        .module("auth", "auth-01")
        .build()
}

/// Builds `count` valid records with ids `<prefix>1..=<prefix><count>`.
pub fn audit_records(prefix: &str, count: usize) -> Vec<AuditRecord> {
    (1..=count)
        .map(|i| audit_record(&format!("{}{}", prefix, i)))
        .collect()
}

/// Builds a record whose description has exactly `len` characters.
///
/// With `len > 2048` the record fails validation.
pub fn record_with_description_of_len(event_id: &str, len: usize) -> AuditRecord {
    let mut record = audit_record(event_id);
    record.description = Some("d".repeat(len));
    record
}
