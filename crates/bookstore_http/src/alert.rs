//! Alert and error headers attached to API responses.
//!
//! Header names are `X-<application>-alert`, `X-<application>-error` and
//! `X-<application>-params`.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use bookstore_core::{EntityId, EntityKind};
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AlertAction {
    Created,
    Updated,
    Deleted,
}

/// Headers announcing a successful write on one entity.
pub(crate) fn entity_alert(
    app: &str,
    action: AlertAction,
    kind: EntityKind,
    id: EntityId,
) -> HeaderMap {
    let message = match action {
        AlertAction::Created => format!("A new {kind} is created with identifier {id}"),
        AlertAction::Updated => format!("A {kind} is updated with identifier {id}"),
        AlertAction::Deleted => format!("A {kind} is deleted with identifier {id}"),
    };

    let mut headers = HeaderMap::new();
    insert(&mut headers, app, "alert", &message);
    insert(&mut headers, app, "params", &id.to_string());
    headers
}

/// Headers describing a rejected request.
pub(crate) fn failure_alert(app: &str, entity_name: &str, error_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, app, "error", &format!("error.{error_key}"));
    insert(&mut headers, app, "params", entity_name);
    headers
}

/// Plural collection segment used in `Location` headers.
pub(crate) fn collection_path(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Author => "authors",
        EntityKind::Book => "books",
        EntityKind::Publisher => "publishers",
        EntityKind::Store => "stores",
    }
}

fn insert(headers: &mut HeaderMap, app: &str, suffix: &str, value: &str) {
    let name = format!("x-{app}-{suffix}");
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => warn!("event=alert_header module=http status=skipped header={name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{collection_path, entity_alert, failure_alert, AlertAction};
    use bookstore_core::EntityKind;

    #[test]
    fn creation_alert_carries_message_and_id() {
        let headers = entity_alert("bookstoreApp", AlertAction::Created, EntityKind::Store, 3);
        assert_eq!(
            headers["x-bookstoreapp-alert"],
            "A new store is created with identifier 3"
        );
        assert_eq!(headers["x-bookstoreapp-params"], "3");
    }

    #[test]
    fn failure_alert_prefixes_error_key() {
        let headers = failure_alert("bookstoreApp", "book", "idexists");
        assert_eq!(headers["x-bookstoreapp-error"], "error.idexists");
        assert_eq!(headers["x-bookstoreapp-params"], "book");
    }

    #[test]
    fn invalid_application_name_skips_headers() {
        let headers = entity_alert("bad name", AlertAction::Deleted, EntityKind::Book, 1);
        assert!(headers.is_empty());
    }

    #[test]
    fn collections_are_plural() {
        assert_eq!(collection_path(EntityKind::Publisher), "publishers");
    }
}
