use serde::{Deserialize, Serialize};

/// Insertion-ordered set of human-readable messages.
///
/// Serialized as a plain JSON array. Duplicates in persisted input are
/// dropped on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct MessageSet {
  messages: Vec<String>,
}

impl MessageSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a message unless it is already present. Returns whether it was added.
  pub fn insert(&mut self, message: impl Into<String>) -> bool {
    let message = message.into();
    if self.contains(&message) {
      return false;
    }
    self.messages.push(message);
    true
  }

  pub fn contains(&self, message: &str) -> bool {
    self.messages.iter().any(|m| m == message)
  }

  pub fn is_empty(&self) -> bool {
    self.messages.is_empty()
  }

  pub fn len(&self) -> usize {
    self.messages.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.messages.iter().map(String::as_str)
  }

  pub fn to_vec(&self) -> Vec<String> {
    self.messages.clone()
  }
}

impl From<Vec<String>> for MessageSet {
  fn from(messages: Vec<String>) -> Self {
    let mut set = MessageSet::new();
    for message in messages {
      set.insert(message);
    }
    set
  }
}

impl From<MessageSet> for Vec<String> {
  fn from(set: MessageSet) -> Self {
    set.messages
  }
}

impl<S: Into<String>> Extend<S> for MessageSet {
  fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
    for message in iter {
      self.insert(message);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_insert_skips_duplicates() {
    let mut set = MessageSet::new();
    assert!(set.insert("SLA threshold exceeded"));
    assert!(set.insert("QA check failed"));
    assert!(!set.insert("SLA threshold exceeded"));

    assert_eq!(set.len(), 2);
    assert_eq!(
      set.iter().collect::<Vec<_>>(),
      vec!["SLA threshold exceeded", "QA check failed"]
    );
  }

  #[test]
  fn test_deserialize_drops_duplicates() {
    let set: MessageSet = serde_json::from_str(r#"["a", "b", "a"]"#).unwrap();
    assert_eq!(set.to_vec(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
  }
}
