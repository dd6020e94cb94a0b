use std::collections::HashMap;

use crate::languages::Language;

const AR_EN: &[(&str, &str)] = &[
    ("مرحبا", "Hello"),
    ("شكرا", "Thank you"),
    ("السلام عليكم", "Peace be upon you"),
    ("كيف حالك", "How are you"),
    ("أهلا وسهلا", "Welcome"),
];

const EN_AR: &[(&str, &str)] = &[
    ("hello", "مرحبا"),
    ("thank you", "شكرا"),
    ("peace be upon you", "السلام عليكم"),
    ("how are you", "كيف حالك"),
    ("welcome", "أهلا وسهلا"),
];

/// Offline phrase table consulted after every network provider failed.
#[derive(Debug, Clone)]
pub struct DemoDictionary {
    entries: HashMap<(Language, Language), HashMap<String, String>>,
}

impl Default for DemoDictionary {
    fn default() -> Self {
        let mut dictionary = DemoDictionary {
            entries: HashMap::new(),
        };
        dictionary.extend(Language::Arabic, Language::English, AR_EN);
        dictionary.extend(Language::English, Language::Arabic, EN_AR);
        dictionary
    }
}

impl DemoDictionary {
    pub fn empty() -> Self {
        DemoDictionary {
            entries: HashMap::new(),
        }
    }

    pub fn extend(&mut self, source: Language, target: Language, phrases: &[(&str, &str)]) {
        let table = self.entries.entry((source, target)).or_default();
        for (phrase, translation) in phrases {
            table.insert(lookup_key(phrase), translation.to_string());
        }
    }

    /// Exact match on the trimmed, lower-cased text. `None` is the miss.
    pub fn lookup(&self, source: Language, target: Language, text: &str) -> Option<&str> {
        self.entries
            .get(&(source, target))?
            .get(&lookup_key(text))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lookup_key(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::DemoDictionary;
    use crate::languages::Language;

    #[test]
    fn looks_up_greetings_in_both_directions() {
        let dictionary = DemoDictionary::default();
        assert_eq!(
            dictionary.lookup(Language::English, Language::Arabic, "  Hello "),
            Some("مرحبا")
        );
        assert_eq!(
            dictionary.lookup(Language::Arabic, Language::English, "شكرا"),
            Some("Thank you")
        );
        assert_eq!(dictionary.len(), 10);
    }

    #[test]
    fn misses_are_explicit() {
        let dictionary = DemoDictionary::default();
        assert_eq!(
            dictionary.lookup(Language::English, Language::Arabic, "hello there"),
            None
        );
        assert_eq!(
            dictionary.lookup(Language::Arabic, Language::English, "hello"),
            None
        );
        assert!(DemoDictionary::empty().is_empty());
    }
}
