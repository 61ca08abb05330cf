// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Audit record validation.
//!
//! Enforces field-presence and length bounds before a record is accepted for
//! ingestion. All violated rules are collected into a single
//! [`ValidationError`] so callers see the complete set in one pass.
//! Validation is pure: it never mutates the record and has no side effects.

use crate::error::{ValidationError, ValidationResult};
use crate::record::AuditRecord;

// =============================================================================
// Length Bounds
// =============================================================================

/// Maximum length of `eventId`.
pub const EVENT_ID_MAX: usize = 64;

/// Maximum length of `eventName`.
pub const EVENT_NAME_MAX: usize = 128;

/// Maximum length of `eventType`.
pub const EVENT_TYPE_MAX: usize = 64;

/// Maximum length of `hostName`.
pub const HOST_NAME_MAX: usize = 128;

/// Maximum length of `hostIp`.
pub const HOST_IP_MAX: usize = 256;

/// Maximum length of `applicationId`.
pub const APPLICATION_ID_MAX: usize = 64;

/// Maximum length of `applicationName`.
pub const APPLICATION_NAME_MAX: usize = 128;

/// Maximum length of `sessionUserId`.
pub const SESSION_USER_ID_MAX: usize = 256;

/// Maximum length of `sessionUserName`.
pub const SESSION_USER_NAME_MAX: usize = 128;

/// Maximum length of `createdBy`.
pub const CREATED_BY_MAX: usize = 256;

/// Maximum length of the business-subject `id`.
pub const ID_MAX: usize = 64;

/// Maximum length of `idType`.
pub const ID_TYPE_MAX: usize = 64;

/// Maximum length of `moduleName`.
pub const MODULE_NAME_MAX: usize = 128;

/// Maximum length of `moduleId`.
pub const MODULE_ID_MAX: usize = 64;

/// Maximum length of `description`.
pub const DESCRIPTION_MAX: usize = 2048;

// =============================================================================
// Validation
// =============================================================================

/// Validates a record against the field bounds.
///
/// Lengths are measured in characters, not bytes, so multi-byte descriptions
/// are not penalized. Returns a [`ValidationError`] carrying every violated
/// rule; `action_time_stamp` is required by construction and needs no check.
pub fn validate(record: &AuditRecord) -> ValidationResult<()> {
    let mut violations = Vec::new();

    check_required(&mut violations, "eventId", &record.event_id, EVENT_ID_MAX);
    check_required(
        &mut violations,
        "eventName",
        &record.event_name,
        EVENT_NAME_MAX,
    );
    check_required(
        &mut violations,
        "eventType",
        &record.event_type,
        EVENT_TYPE_MAX,
    );
    check_required(&mut violations, "hostName", &record.host_name, HOST_NAME_MAX);
    check_required(&mut violations, "hostIp", &record.host_ip, HOST_IP_MAX);
    check_required(
        &mut violations,
        "applicationId",
        &record.application_id,
        APPLICATION_ID_MAX,
    );
    check_required(
        &mut violations,
        "applicationName",
        &record.application_name,
        APPLICATION_NAME_MAX,
    );
    check_required(
        &mut violations,
        "sessionUserId",
        &record.session_user_id,
        SESSION_USER_ID_MAX,
    );
    check_required(
        &mut violations,
        "createdBy",
        &record.created_by,
        CREATED_BY_MAX,
    );

    check_optional(
        &mut violations,
        "sessionUserName",
        record.session_user_name.as_deref(),
        SESSION_USER_NAME_MAX,
    );
    check_optional(&mut violations, "id", record.id.as_deref(), ID_MAX);
    check_optional(
        &mut violations,
        "idType",
        record.id_type.as_deref(),
        ID_TYPE_MAX,
    );
    check_optional(
        &mut violations,
        "moduleName",
        record.module_name.as_deref(),
        MODULE_NAME_MAX,
    );
    check_optional(
        &mut violations,
        "moduleId",
        record.module_id.as_deref(),
        MODULE_ID_MAX,
    );
    check_optional(
        &mut violations,
        "description",
        record.description.as_deref(),
        DESCRIPTION_MAX,
    );

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

/// Checks a required field: present and within `1..=max` characters.
fn check_required(violations: &mut Vec<String>, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len < 1 || len > max {
        violations.push(format!(
            "{} must be between 1 and {} characters",
            field, max
        ));
    }
}

/// Checks an optional field: at most `max` characters when present.
fn check_optional(violations: &mut Vec<String>, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        if value.chars().count() > max {
            violations.push(format!("{} must not exceed {} characters", field, max));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AuditRecord;

    fn valid_record() -> AuditRecord {
        AuditRecord::builder("EV-001", "User Login", "SECURITY")
            .host("app-host-01", "10.0.4.17")
            .application("IDP", "Identity Provider")
            .session_user("user-4411")
            .created_by("idp-frontend")
            .build()
    }

    #[test]
    fn test_valid_record_passes() {
        assert!(validate(&valid_record()).is_ok());
    }

    #[test]
    fn test_empty_required_field_fails() {
        let mut record = valid_record();
        record.event_id = String::new();

        let err = validate(&record).unwrap_err();
        assert_eq!(err.violation_count(), 1);
        assert!(err.to_string().contains("eventId"));
    }

    #[test]
    fn test_overlong_required_field_fails() {
        let mut record = valid_record();
        record.event_id = "x".repeat(EVENT_ID_MAX + 1);

        assert!(validate(&record).is_err());

        record.event_id = "x".repeat(EVENT_ID_MAX);
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_all_violations_are_collected() {
        let mut record = valid_record();
        record.event_id = String::new();
        record.host_name = String::new();
        record.description = Some("d".repeat(DESCRIPTION_MAX + 1));

        let err = validate(&record).unwrap_err();
        assert_eq!(err.violation_count(), 3);

        let rendered = err.to_string();
        assert!(rendered.contains("eventId"));
        assert!(rendered.contains("hostName"));
        assert!(rendered.contains("description"));
    }

    #[test]
    fn test_absent_optional_fields_pass() {
        let record = valid_record();
        assert!(record.session_user_name.is_none());
        assert!(record.description.is_none());
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_optional_field_boundary() {
        let mut record = valid_record();

        record.session_user_name = Some("n".repeat(SESSION_USER_NAME_MAX));
        assert!(validate(&record).is_ok());

        record.session_user_name = Some("n".repeat(SESSION_USER_NAME_MAX + 1));
        assert!(validate(&record).is_err());
    }

    #[test]
    fn test_length_is_measured_in_characters() {
        let mut record = valid_record();
        // 2048 multi-byte characters is within bounds even though it is
        // far more than 2048 bytes.
        record.description = Some("é".repeat(DESCRIPTION_MAX));

        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_every_bounded_field_has_a_failing_input() {
        let cases: Vec<(Box<dyn Fn(&mut AuditRecord)>, &str)> = vec![
            (Box::new(|r| r.event_id = "x".repeat(65)), "eventId"),
            (Box::new(|r| r.event_name = "x".repeat(129)), "eventName"),
            (Box::new(|r| r.event_type = "x".repeat(65)), "eventType"),
            (Box::new(|r| r.host_name = "x".repeat(129)), "hostName"),
            (Box::new(|r| r.host_ip = "x".repeat(257)), "hostIp"),
            (
                Box::new(|r| r.application_id = "x".repeat(65)),
                "applicationId",
            ),
            (
                Box::new(|r| r.application_name = "x".repeat(129)),
                "applicationName",
            ),
            (
                Box::new(|r| r.session_user_id = "x".repeat(257)),
                "sessionUserId",
            ),
            (
                Box::new(|r| r.session_user_name = Some("x".repeat(129))),
                "sessionUserName",
            ),
            (Box::new(|r| r.created_by = "x".repeat(257)), "createdBy"),
            (Box::new(|r| r.id = Some("x".repeat(65))), "id"),
            (Box::new(|r| r.id_type = Some("x".repeat(65))), "idType"),
            (
                Box::new(|r| r.module_name = Some("x".repeat(129))),
                "moduleName",
            ),
            (Box::new(|r| r.module_id = Some("x".repeat(65))), "moduleId"),
            (
                Box::new(|r| r.description = Some("x".repeat(2049))),
                "description",
            ),
        ];

        for (mutate, field) in cases {
            let mut record = valid_record();
            mutate(&mut record);
            let err = validate(&record).unwrap_err();
            assert!(
                err.to_string().contains(field),
                "expected a violation naming {}",
                field
            );
        }
    }
}
