use crate::{CliError, resolve_selection};

use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_catalog_id_when_resolve_selection_then_catalog_entry() {
    // When
    let server = resolve_selection("google").unwrap();

    // Then
    assert_that!(server.address.as_str(), eq("8.8.8.8:53"));
}

#[test]
fn given_auto_when_resolve_selection_then_automatic_entry() {
    // When
    let server = resolve_selection("auto").unwrap();

    // Then
    assert!(server.is_automatic());
}

#[test]
fn given_custom_address_when_resolve_selection_then_custom_entry() {
    // When
    let server = resolve_selection("10.0.0.1:5353").unwrap();

    // Then
    assert_that!(server.id.as_str(), eq("custom"));
    assert_that!(server.address.as_str(), eq("10.0.0.1:5353"));
}

#[test]
fn given_garbage_when_resolve_selection_then_unknown_dns_with_hint() {
    // When
    let result = resolve_selection("fastest");

    // Then
    let err = result.unwrap_err();
    assert!(matches!(err, CliError::UnknownDns { .. }));
    assert!(err.recovery_hint().is_some());
}
