use opentelemetry::{Key, KeyValue};

/// A component that can describe itself as a set of telemetry attributes.
///
/// Implement this on sub-components whose attributes get folded into a
/// parent's span or metric attributes via [`prefix_attributers`].
pub trait Attributer {
    /// The attributes describing this component, in a stable order.
    fn attributes(&self) -> Vec<KeyValue>;
}

/// Qualify every attribute key with `prefix`, leaving values untouched.
///
/// Length and order are preserved; an empty prefix returns the keys
/// unchanged.
pub fn prefix_attributes(attrs: &[KeyValue], prefix: &str) -> Vec<KeyValue> {
    attrs
        .iter()
        .map(|attr| {
            KeyValue::new(
                Key::from(format!("{prefix}{}", attr.key.as_str())),
                attr.value.clone(),
            )
        })
        .collect()
}

/// Collect the attributes of an ordered sequence of contributors, keying
/// each entry `<prefix>.<position>.<original key>`.
///
/// `position` is the contributor's zero-based index in `attributers`, so
/// two contributors reusing identical keys can never collide. Contributors
/// without attributes contribute nothing but still consume their index.
pub fn prefix_attributers<T: Attributer>(attributers: &[T], prefix: &str) -> Vec<KeyValue> {
    let mut all = Vec::new();
    for (index, attributer) in attributers.iter().enumerate() {
        for attr in attributer.attributes() {
            all.push(KeyValue::new(
                Key::from(format!("{prefix}.{index}.{}", attr.key.as_str())),
                attr.value,
            ));
        }
    }
    all
}
