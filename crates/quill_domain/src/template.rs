use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Name of a registered prompt template, typed by the data it renders.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct Template<V> {
    pub template: String,
    #[serde(skip)]
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub fn new(template: impl ToString) -> Self {
        Self { template: template.to_string(), _marker: PhantomData }
    }
}

impl<V> From<&str> for Template<V> {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_template_serializes_as_name() {
        let fixture = Template::<()>::new("planner.md");
        let actual = serde_json::to_string(&fixture).unwrap();
        let expected = r#""planner.md""#;
        assert_eq!(actual, expected);
    }
}
