use serde::{Deserialize, Serialize};

/// In-page navigation: which section link is highlighted.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NavState {
    active: Option<String>,
}

impl NavState {
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Follow a `#section` link. The link becomes the single active one only
    /// when `target_exists` confirms the section is on the page; the id to
    /// scroll to is returned in that case.
    pub fn follow<F>(&mut self, href: &str, target_exists: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        let target = section_id(href)?;
        if !target_exists(target) {
            return None;
        }
        self.active = Some(href.to_string());
        Some(target.to_string())
    }
}

/// `#results` → `results`; anything that is not a same-page anchor → `None`.
pub fn section_id(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_followed_link_wins() {
        let mut nav = NavState::default();
        let exists = |id: &str| id == "upload" || id == "results";
        assert_eq!(nav.follow("#upload", exists), Some("upload".to_string()));
        assert_eq!(nav.follow("#results", exists), Some("results".to_string()));
        assert_eq!(nav.active(), Some("#results"));
    }

    #[test]
    fn missing_target_keeps_previous_active() {
        let mut nav = NavState::default();
        nav.follow("#upload", |_| true);
        assert_eq!(nav.follow("#nowhere", |_| false), None);
        assert_eq!(nav.follow("https://example.com", |_| true), None);
        assert_eq!(nav.follow("#", |_| true), None);
        assert_eq!(nav.active(), Some("#upload"));
    }
}
