use serde::Serialize;
use tracing::{Level, debug};

/// Dumps a decoded upstream payload as indented JSON at `debug`.
///
/// Serialization is skipped entirely unless `debug` is enabled, so large
/// patches cost nothing at the default level.
pub(crate) fn debug_payload<T: Serialize>(kind: &'static str, value: &T) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    match serde_json::to_string_pretty(value) {
        Ok(json) => debug!(kind, bytes = json.len(), "{kind} payload:\n{json}"),
        Err(e) => debug!(kind, error = %e, "{kind} payload not serializable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl Serialize for Exploding {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            panic!("serialized while debug logging is off");
        }
    }

    #[test]
    fn skips_serialization_without_a_debug_subscriber() {
        debug_payload("update check", &Exploding);
    }
}
