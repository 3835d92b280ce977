//! Positional bind-parameter registry.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Ordered bind values plus their type signature.
///
/// Every pushed value adds one signature character (see
/// [`BindType`](crate::BindType)), so `signature().len() == len()` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindParams {
    types: String,
    values: Vec<Value>,
}

impl BindParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        self.types.push(value.bind_type().as_char());
        self.values.push(value);
        self
    }

    /// Append every value of `other`, keeping order.
    pub fn push_all(&mut self, other: BindParams) -> &mut Self {
        self.types.push_str(&other.types);
        self.values.extend(other.values);
        self
    }

    /// The type signature, e.g. `"sid"` for text, integer, float.
    pub fn signature(&self) -> &str {
        &self.types
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.types.clear();
        self.values.clear();
    }

    /// Check the signature against the values.
    pub fn validate(&self) -> OrmResult<()> {
        let sig_len = self.types.chars().count();
        if sig_len != self.values.len() {
            return Err(OrmError::validation(format!(
                "BindParams: signature({sig_len}) != values({})",
                self.values.len()
            )));
        }
        for (i, (ch, value)) in self.types.chars().zip(&self.values).enumerate() {
            if ch != value.bind_type().as_char() {
                return Err(OrmError::validation(format!(
                    "BindParams: parameter {} has signature '{ch}' but value {value:?}",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

impl<V: Into<Value>> FromIterator<V> for BindParams {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut params = BindParams::new();
        for v in iter {
            params.push(v);
        }
        params
    }
}

impl<V: Into<Value>> Extend<V> for BindParams {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_tracks_values() {
        let mut params = BindParams::new();
        params.push("a").push(1).push(2.5).push(Value::Null).push(true);
        assert_eq!(params.signature(), "sidsi");
        assert_eq!(params.len(), 5);
        params.validate().unwrap();
    }

    #[test]
    fn push_all_keeps_order() {
        let mut a: BindParams = vec![Value::from(1)].into_iter().collect();
        let b: BindParams = vec![Value::from("x"), Value::from(0.5)].into_iter().collect();
        a.push_all(b);
        assert_eq!(a.signature(), "isd");
        assert_eq!(a.values()[1], Value::from("x"));
    }

    #[test]
    fn clear_empties_both_halves() {
        let mut params: BindParams = [1, 2, 3].into_iter().collect();
        params.clear();
        assert!(params.is_empty());
        assert_eq!(params.signature(), "");
    }
}
