use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodTag {
    pub name: String,
    pub selected: bool,
}

/// Toggle state of the detected methods, in detection order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodSelection {
    tags: Vec<MethodTag>,
}

impl MethodSelection {
    /// Fresh tags for a new upload; nothing is selected.
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<MethodTag> = Vec::new();
        for name in methods {
            let name = name.into();
            if tags.iter().any(|tag| tag.name == name) {
                continue;
            }
            tags.push(MethodTag {
                name,
                selected: false,
            });
        }
        Self { tags }
    }

    pub fn tags(&self) -> &[MethodTag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Flip one tag. Returns `false` if no tag has that name.
    pub fn toggle(&mut self, method: &str) -> bool {
        match self.tags.iter_mut().find(|tag| tag.name == method) {
            Some(tag) => {
                tag.selected = !tag.selected;
                true
            }
            None => false,
        }
    }

    /// Selected methods, rebuilt from the tags on every call.
    pub fn selected(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|tag| tag.selected)
            .map(|tag| tag.name.clone())
            .collect()
    }

    pub fn can_start(&self, has_upload: bool) -> bool {
        has_upload && self.tags.iter().any(|tag| tag.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_deselects() {
        let mut sel = MethodSelection::new(["Base", "RAG", "PersonaSteer"]);
        assert!(sel.toggle("RAG"));
        assert!(sel.toggle("Base"));
        assert_eq!(sel.selected(), vec!["Base", "RAG"]);
        sel.toggle("RAG");
        assert_eq!(sel.selected(), vec!["Base"]);
        assert!(!sel.toggle("Missing"));
    }

    #[test]
    fn start_requires_upload_and_selection() {
        let mut sel = MethodSelection::new(["Base"]);
        assert!(!sel.can_start(true));
        sel.toggle("Base");
        assert!(sel.can_start(true));
        assert!(!sel.can_start(false));
    }

    #[test]
    fn duplicate_names_collapse() {
        let sel = MethodSelection::new(["Base", "Base", "RAG"]);
        assert_eq!(sel.tags().len(), 2);
    }
}
