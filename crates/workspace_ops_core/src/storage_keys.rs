/// Object key for an archived state snapshot: `{environment}/{workspace}/{state_id}.json`.
///
/// Replaying the same run-completion event yields the same key, so a re-delivered
/// event overwrites the previous object instead of creating a sibling.
pub fn state_object_key(environment: &str, workspace: &str, state_id: &str) -> String {
    format!("{environment}/{workspace}/{state_id}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_state_key_from_environment_workspace_and_state_id() {
        let key = state_object_key("prod", "vpc-core", "sv-42");
        assert_eq!(key, "prod/vpc-core/sv-42.json");
    }

    #[test]
    fn state_key_is_stable_for_identical_inputs() {
        assert_eq!(
            state_object_key("staging", "dns", "sv-abc"),
            state_object_key("staging", "dns", "sv-abc")
        );
    }

    #[test]
    fn state_key_keeps_names_verbatim() {
        let key = state_object_key("Prod EU", "net.core", "sv-1");
        assert_eq!(key, "Prod EU/net.core/sv-1.json");
    }
}
