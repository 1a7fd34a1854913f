//! Host environment sinks.

use std::collections::HashMap;

/// Where resolved variables land: the host's job environment, a process env
/// block, or any other name/value map.
///
/// The engine only ever writes. Writes are last-write-wins, like the
/// environment maps they model; the method is named `export` because
/// `override` is reserved.
pub trait EnvironmentSink: Send {
    /// Sets `name` to `value`, overwriting any previous value.
    fn export(&mut self, name: &str, value: &str);
}

impl EnvironmentSink for HashMap<String, String> {
    fn export(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_sink_overwrites() {
        let mut env: HashMap<String, String> = HashMap::new();

        env.export("DB_PASS", "first");
        env.export("DB_PASS", "second");

        assert_eq!(env.get("DB_PASS").map(String::as_str), Some("second"));
        assert_eq!(env.len(), 1);
    }
}
