//! View state - the single active attribute.
//!
//! One writer (the attribute dropdown handler), many readers (classifier,
//! renderers). The active attribute is always a member of the attribute
//! set; unknown names are rejected without touching state.

/// The ordered attribute set plus which attribute is currently displayed.
#[derive(Debug, Clone)]
pub struct ViewState {
    attributes: Vec<String>,
    active: usize,
}

impl ViewState {
    /// Starts on the first attribute, mirroring dropdown order.
    pub fn new(attributes: Vec<String>) -> Self {
        assert!(!attributes.is_empty(), "attribute set must not be empty");
        Self {
            attributes,
            active: 0,
        }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn active(&self) -> &str {
        &self.attributes[self.active]
    }

    /// Switch the active attribute. Returns false (state unchanged) for
    /// names outside the attribute set.
    pub fn change(&mut self, name: &str) -> bool {
        match self.attributes.iter().position(|a| a == name) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ViewState {
        ViewState::new(vec!["Employment".to_string(), "Unemployment".to_string()])
    }

    #[test]
    fn starts_on_first_attribute() {
        assert_eq!(state().active(), "Employment");
    }

    #[test]
    fn change_to_known_attribute() {
        let mut s = state();
        assert!(s.change("Unemployment"));
        assert_eq!(s.active(), "Unemployment");
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut s = state();
        assert!(s.change("Unemployment"));
        assert!(!s.change("Median Income"));
        assert_eq!(s.active(), "Unemployment");
    }
}
