/// Shortcut list operations: add, edit, delete, reorder

use uuid::Uuid;

use crate::domain::hostname;
use crate::error::Result;
use crate::storage::{KeyValueStore, SHORTCUTS_KEY, read_or_default, write};
use crate::tab_data::Shortcut;

/// Add https:// unless the URL already says http:// or https://
pub fn normalize_url(input: &str) -> String {
    let url = input.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

pub fn favicon_url(url: &str) -> Option<String> {
    hostname(url).map(|domain| format!("https://www.google.com/s2/favicons?domain={}&sz=64", domain))
}

/// Uppercased first character, used when no favicon loads
pub fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

/// Ordered shortcut collection; display order is the vector order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutList {
    pub items: Vec<Shortcut>,
}

impl ShortcutList {
    pub fn new(items: Vec<Shortcut>) -> Self {
        ShortcutList { items }
    }

    pub async fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        Ok(ShortcutList::new(read_or_default(store, SHORTCUTS_KEY).await?))
    }

    pub async fn save<S: KeyValueStore>(&self, store: &S) -> Result<()> {
        write(store, SHORTCUTS_KEY, &self.items).await
    }

    pub fn get(&self, id: &str) -> Option<&Shortcut> {
        self.items.iter().find(|s| s.id == id)
    }

    /// Append a shortcut; returns its new id
    pub fn add(&mut self, name: &str, url: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.items.push(Shortcut {
            id: id.clone(),
            name: name.trim().to_string(),
            url: normalize_url(url),
        });
        id
    }

    pub fn update(&mut self, id: &str, name: &str, url: &str) -> bool {
        self.items
            .iter_mut()
            .find(|s| s.id == id)
            .map(|shortcut| {
                shortcut.name = name.trim().to_string();
                shortcut.url = normalize_url(url);
            })
            .is_some()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let original_len = self.items.len();
        self.items.retain(|s| s.id != id);
        self.items.len() < original_len
    }

    /// Drag-and-drop reorder: take the item at `from` and insert it at `to`
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let moved = self.items.remove(from);
        self.items.insert(to, moved);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn list_of(names: &[&str]) -> ShortcutList {
        let mut list = ShortcutList::default();
        for name in names {
            list.add(name, &format!("{}.com", name.to_lowercase()));
        }
        list
    }

    fn names(list: &ShortcutList) -> Vec<&str> {
        list.items.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("github.com"), "https://github.com");
        assert_eq!(normalize_url("  http://localhost:3000 "), "http://localhost:3000");
        assert_eq!(normalize_url("https://docs.rs"), "https://docs.rs");
    }

    #[test]
    fn test_favicon_and_initial() {
        assert_eq!(
            favicon_url("https://www.github.com/rust-lang"),
            Some("https://www.google.com/s2/favicons?domain=www.github.com&sz=64".to_string())
        );
        assert_eq!(favicon_url("nonsense"), None);
        assert_eq!(initial("github"), "G");
        assert_eq!(initial("ärger"), "Ä");
        assert_eq!(initial(""), "");
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut list = ShortcutList::default();
        let a = list.add("GitHub", "github.com");
        let b = list.add("GitHub", "github.com");

        assert_ne!(a, b);
        assert_eq!(list.get(&a).unwrap().url, "https://github.com");
    }

    #[test]
    fn test_update_and_remove() {
        let mut list = list_of(&["A", "B"]);
        let id = list.items[0].id.clone();

        assert!(list.update(&id, " Alpha ", "alpha.dev"));
        assert_eq!(list.items[0].name, "Alpha");
        assert_eq!(list.items[0].url, "https://alpha.dev");
        assert!(!list.update("missing", "x", "y"));

        assert!(list.remove(&id));
        assert!(!list.remove(&id));
        assert_eq!(names(&list), vec!["B"]);
    }

    #[test]
    fn test_move_to() {
        let mut list = list_of(&["A", "B", "C", "D"]);

        assert!(list.move_to(0, 2));
        assert_eq!(names(&list), vec!["B", "C", "A", "D"]);

        assert!(list.move_to(3, 0));
        assert_eq!(names(&list), vec!["D", "B", "C", "A"]);

        assert!(!list.move_to(1, 1));
        assert!(!list.move_to(0, 9));
        assert_eq!(list.items.len(), 4);
    }

    #[tokio::test]
    async fn test_save_and_load_preserve_order() {
        let store = MemoryStore::new();
        let list = list_of(&["Zeta", "Alpha", "Mid"]);

        list.save(&store).await.unwrap();
        let loaded = ShortcutList::load(&store).await.unwrap();

        assert_eq!(loaded, list);
    }
}
