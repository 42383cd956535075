//! Listener registry: named subscriptions and their callbacks.
//!
//! Names are sanitized at the boundary to `[A-Za-z0-9_-]`; everything else
//! is stripped, and an empty result makes the operation a no-op. The
//! registry tracks two things separately: per-name callback lists
//! (insertion order = invocation order) and the ordered set of active
//! names that must be re-announced to the server after a reconnect.
//!
//! Callback panics are not caught; listener exceptions are the caller's
//! responsibility.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::constants::names::RESERVED_PREFIX;

/// A listener callback, invoked with the frame payload.
pub type ListenerFn = Arc<dyn Fn(&Value) + Send + Sync>;

/// Strip every character outside `[A-Za-z0-9_-]`.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Maps event names to callback lists and tracks active subscriptions.
#[derive(Default)]
pub struct ListenerRegistry {
    callbacks: HashMap<String, Vec<ListenerFn>>,
    active: Vec<String>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a name, optionally attaching a callback.
    ///
    /// Returns the sanitized name to announce to the server, or `None`
    /// when sanitization leaves nothing.
    pub fn subscribe(&mut self, name: &str, callback: Option<ListenerFn>) -> Option<String> {
        let clean = sanitize_name(name);
        if clean.is_empty() {
            return None;
        }
        if !self.active.contains(&clean) {
            self.active.push(clean.clone());
        }
        let entry = self.callbacks.entry(clean.clone()).or_default();
        if let Some(cb) = callback {
            entry.push(cb);
        }
        Some(clean)
    }

    /// Unsubscribe from a name, optionally keeping its callbacks.
    ///
    /// Returns the sanitized name to renounce to the server, or `None`
    /// when sanitization leaves nothing.
    pub fn unsubscribe(&mut self, name: &str, keep_callbacks: bool) -> Option<String> {
        let clean = sanitize_name(name);
        if clean.is_empty() {
            return None;
        }
        if !keep_callbacks {
            self.callbacks.remove(&clean);
        }
        self.active.retain(|n| n != &clean);
        Some(clean)
    }

    /// Register a callback under a reserved name (`@connect`,
    /// `@disconnect`, `@error`).
    ///
    /// Reserved names never enter the active set, are never announced to
    /// the server, and are excluded from replay.
    pub fn register_reserved(&mut self, name: &str, callback: ListenerFn) {
        self.callbacks.entry(name.to_string()).or_default().push(callback);
    }

    /// Invoke every callback registered under `name`, in registration
    /// order. Returns the number of callbacks invoked.
    pub fn dispatch(&self, name: &str, data: &Value) -> usize {
        match self.callbacks.get(name) {
            Some(list) => {
                for cb in list {
                    cb(data);
                }
                list.len()
            }
            None => 0,
        }
    }

    /// Active names to re-announce after a reconnect or a forced
    /// resubscription, excluding reserved names.
    pub fn replayable(&self) -> Vec<String> {
        self.active
            .iter()
            .filter(|n| !n.starts_with(RESERVED_PREFIX))
            .cloned()
            .collect()
    }

    /// Whether a name is currently in the active set.
    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|n| n == name)
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("active", &self.active)
            .field("names", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (ListenerFn, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb: ListenerFn = Arc::new(move |v: &Value| sink.lock().unwrap().push(v.clone()));
        (cb, seen)
    }

    #[test]
    fn test_sanitize_strips_punctuation() {
        assert_eq!(sanitize_name("chat room!"), "chatroom");
        assert_eq!(sanitize_name("a_b-c9"), "a_b-c9");
        assert_eq!(sanitize_name("!!!"), "");
        assert_eq!(sanitize_name("@error"), "error");
    }

    #[test]
    fn test_subscribe_empty_name_is_noop() {
        let mut reg = ListenerRegistry::new();
        assert_eq!(reg.subscribe("!!!", None), None);
        assert!(reg.replayable().is_empty());
    }

    #[test]
    fn test_active_set_is_idempotent() {
        let mut reg = ListenerRegistry::new();
        let (cb, _) = recorder();
        assert_eq!(reg.subscribe("chat", Some(cb.clone())).as_deref(), Some("chat"));
        assert_eq!(reg.subscribe("chat", Some(cb)).as_deref(), Some("chat"));
        assert_eq!(reg.replayable(), vec!["chat".to_string()]);
    }

    #[test]
    fn test_dispatch_invokes_in_registration_order() {
        let mut reg = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            reg.subscribe("chat", Some(Arc::new(move |_: &Value| sink.lock().unwrap().push(tag))));
        }

        assert_eq!(reg.dispatch("chat", &Value::Null), 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_clears_callbacks_by_default() {
        let mut reg = ListenerRegistry::new();
        let (cb, seen) = recorder();
        reg.subscribe("chat", Some(cb));

        assert_eq!(reg.unsubscribe("chat", false).as_deref(), Some("chat"));
        assert!(!reg.is_active("chat"));
        assert_eq!(reg.dispatch("chat", &Value::Null), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_can_keep_callbacks() {
        let mut reg = ListenerRegistry::new();
        let (cb, seen) = recorder();
        reg.subscribe("chat", Some(cb));

        reg.unsubscribe("chat", true);
        assert!(!reg.is_active("chat"));
        // Callbacks survive; a matching frame still dispatches.
        assert_eq!(reg.dispatch("chat", &Value::Null), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reserved_names_excluded_from_replay() {
        let mut reg = ListenerRegistry::new();
        let (cb, _) = recorder();
        reg.register_reserved("@error", cb.clone());
        reg.subscribe("chat", Some(cb));

        assert_eq!(reg.replayable(), vec!["chat".to_string()]);
        assert_eq!(reg.dispatch("@error", &Value::Null), 1);
    }

    #[test]
    fn test_replay_preserves_subscription_order() {
        let mut reg = ListenerRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            reg.subscribe(name, None);
        }
        assert_eq!(reg.replayable(), vec!["zeta", "alpha", "mid"]);
    }
}
