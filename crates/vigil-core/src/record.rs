// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The audit record model.
//!
//! An [`AuditRecord`] describes who did what, when, from where, and under
//! which session. Records are serialized as compact JSON with camelCase
//! field names; this is the on-wire form used both by the write-ahead log
//! and by store implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationResult;
use crate::validate;

// =============================================================================
// Audit Record
// =============================================================================

/// A single audit event.
///
/// Timestamps round-trip as ISO-8601 UTC instants with a trailing `Z` and
/// sub-second precision preserved (e.g. `2025-08-19T07:40:49.966588424Z`),
/// so a record written to the log decodes to an equal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique event identifier (primary key at the store).
    pub event_id: String,

    /// Human-readable event name.
    pub event_name: String,

    /// Event category (e.g. `SECURITY`, `BUSINESS`).
    pub event_type: String,

    /// When the audited action occurred.
    pub action_time_stamp: DateTime<Utc>,

    /// Host where the action originated.
    pub host_name: String,

    /// IP address of the originating host.
    pub host_ip: String,

    /// Identifier of the submitting application.
    pub application_id: String,

    /// Name of the submitting application.
    pub application_name: String,

    /// Identifier of the acting session user.
    pub session_user_id: String,

    /// Display name of the acting session user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_user_name: Option<String>,

    /// Who created this record (service or operator identity).
    pub created_by: String,

    /// Business-subject identifier the event is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Type of the business-subject identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,

    /// Module in which the event occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    /// Identifier of the module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,

    /// Free-form event description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the record was persisted. Stamped by the store on insert and
    /// used by the retention sweep; producers leave it unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuditRecord {
    /// Creates a builder for constructing audit records.
    pub fn builder(
        event_id: impl Into<String>,
        event_name: impl Into<String>,
        event_type: impl Into<String>,
    ) -> AuditRecordBuilder {
        AuditRecordBuilder::new(event_id, event_name, event_type)
    }

    /// Validates this record against the field-presence and length rules.
    pub fn validate(&self) -> ValidationResult<()> {
        validate::validate(self)
    }
}

// =============================================================================
// Audit Record Builder
// =============================================================================

/// Builder for [`AuditRecord`].
///
/// `action_time_stamp` defaults to the current instant; every other field
/// defaults to empty/absent. The builder itself does not validate — call
/// [`AuditRecord::validate`] on the result.
#[derive(Debug)]
pub struct AuditRecordBuilder {
    record: AuditRecord,
}

impl AuditRecordBuilder {
    /// Creates a new builder with the identifying triple.
    pub fn new(
        event_id: impl Into<String>,
        event_name: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            record: AuditRecord {
                event_id: event_id.into(),
                event_name: event_name.into(),
                event_type: event_type.into(),
                action_time_stamp: Utc::now(),
                host_name: String::new(),
                host_ip: String::new(),
                application_id: String::new(),
                application_name: String::new(),
                session_user_id: String::new(),
                session_user_name: None,
                created_by: String::new(),
                id: None,
                id_type: None,
                module_name: None,
                module_id: None,
                description: None,
                created_at: None,
            },
        }
    }

    /// Sets when the audited action occurred.
    pub fn action_time_stamp(mut self, ts: DateTime<Utc>) -> Self {
        self.record.action_time_stamp = ts;
        self
    }

    /// Sets the originating host name and IP.
    pub fn host(mut self, name: impl Into<String>, ip: impl Into<String>) -> Self {
        self.record.host_name = name.into();
        self.record.host_ip = ip.into();
        self
    }

    /// Sets the submitting application id and name.
    pub fn application(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.record.application_id = id.into();
        self.record.application_name = name.into();
        self
    }

    /// Sets the acting session user id.
    pub fn session_user(mut self, user_id: impl Into<String>) -> Self {
        self.record.session_user_id = user_id.into();
        self
    }

    /// Sets the acting session user display name.
    pub fn session_user_name(mut self, name: impl Into<String>) -> Self {
        self.record.session_user_name = Some(name.into());
        self
    }

    /// Sets the creator identity.
    pub fn created_by(mut self, creator: impl Into<String>) -> Self {
        self.record.created_by = creator.into();
        self
    }

    /// Sets the business-subject id and its type.
    pub fn subject(mut self, id: impl Into<String>, id_type: impl Into<String>) -> Self {
        self.record.id = Some(id.into());
        self.record.id_type = Some(id_type.into());
        self
    }

    /// Sets the module name and id.
    pub fn module(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.record.module_name = Some(name.into());
        self.record.module_id = Some(id.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = Some(description.into());
        self
    }

    /// Builds the record.
    pub fn build(self) -> AuditRecord {
        self.record
    }
}

// =============================================================================
// Audit Response
// =============================================================================

/// Result of a synchronous ingestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResponse {
    /// `true` if the operation was accepted and persisted.
    pub status: bool,
}

impl AuditResponse {
    /// A successful response.
    pub fn ok() -> Self {
        Self { status: true }
    }

    /// A failed response.
    pub fn failed() -> Self {
        Self { status: false }
    }
}

// =============================================================================
// Tests
// =============================================================================
