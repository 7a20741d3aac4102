use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use serde::Deserialize;

use super::error::ClassifierError;

/// Upper-cases the first character of a category name and keeps the rest verbatim.
///
/// This is deliberately not title case: `"joy"` becomes `"Joy"`, `"not_sure"`
/// becomes `"Not_sure"` and `"jOY"` becomes `"JOY"`.
///
/// ```
/// use emotion_classifier::display_name;
///
/// assert_eq!(display_name("joy"), "Joy");
/// assert_eq!(display_name("sadness"), "Sadness");
/// ```
pub fn display_name(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The fixed, ordered set of categories a model predicts.
///
/// Built once at startup and shared read-only afterwards. Construction
/// guarantees the set is non-empty, that no name is empty and that both the
/// raw names and their display names are unique, so every per-request lookup
/// by position is infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    names: Vec<String>,
    display_names: Vec<String>,
}

impl CategorySet {
    /// Creates a category set from names in model output order.
    ///
    /// # Errors
    /// `ConfigurationError` if the list is empty, contains an empty name, or
    /// contains duplicates (including names that collide once displayed).
    pub fn new<I, S>(names: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ClassifierError::ConfigurationError("Category set cannot be empty".into()));
        }
        if let Some(pos) = names.iter().position(|n| n.is_empty()) {
            return Err(ClassifierError::ConfigurationError(
                format!("Category {} has an empty name", pos)
            ));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ClassifierError::ConfigurationError(
                    format!("Duplicate category '{}'", name)
                ));
            }
        }

        let display_names: Vec<String> = names.iter().map(|n| display_name(n)).collect();
        let mut seen = HashSet::new();
        for shown in &display_names {
            if !seen.insert(shown.as_str()) {
                return Err(ClassifierError::ConfigurationError(
                    format!("Categories collide on display name '{}'", shown)
                ));
            }
        }

        Ok(Self { names, display_names })
    }

    /// Builds the set from a HuggingFace `id2label` map whose keys are `"0"..="n-1"`.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Result<Self, ClassifierError> {
        let mut ordered = BTreeMap::new();
        for (id, label) in id2label {
            let index: usize = id.trim().parse().map_err(|_| {
                ClassifierError::ConfigurationError(format!("Invalid label id '{}' in id2label", id))
            })?;
            ordered.insert(index, label.clone());
        }

        // BTreeMap keys are unique and sorted, so contiguity reduces to the last key
        if let Some((&last, _)) = ordered.iter().next_back() {
            if last + 1 != ordered.len() {
                return Err(ClassifierError::ConfigurationError(
                    format!("id2label ids must be contiguous from 0, found max id {} for {} labels", last, ordered.len())
                ));
            }
        }

        Self::new(ordered.into_values())
    }

    /// Reads the category set from a model `config.json`.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        #[derive(Deserialize)]
        struct LabelConfig {
            id2label: HashMap<String, String>,
        }

        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ClassifierError::ConfigurationError(format!("Failed to read label config {:?}: {}", path, e))
        })?;
        let config: LabelConfig = serde_json::from_str(&raw).map_err(|e| {
            ClassifierError::ConfigurationError(format!("Invalid label config {:?}: {}", path, e))
        })?;
        Self::from_id2label(&config.id2label)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed set; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Raw category names in model output order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Display names in model output order.
    pub fn display_names(&self) -> &[String] {
        &self.display_names
    }

    pub fn display_name_at(&self, index: usize) -> Option<&str> {
        self.display_names.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_only_touches_first_char() {
        assert_eq!(display_name("joy"), "Joy");
        assert_eq!(display_name("Joy"), "Joy");
        assert_eq!(display_name("jOY"), "JOY");
        assert_eq!(display_name("not sure"), "Not sure");
        assert_eq!(display_name("élan"), "Élan");
        assert_eq!(display_name("1st"), "1st");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_category_set_keeps_order() -> Result<(), ClassifierError> {
        let set = CategorySet::new(["anger", "disgust", "fear"])?;
        assert_eq!(set.len(), 3);
        assert_eq!(set.names(), &["anger", "disgust", "fear"]);
        assert_eq!(set.display_names(), &["Anger", "Disgust", "Fear"]);
        assert_eq!(set.display_name_at(1), Some("Disgust"));
        assert_eq!(set.display_name_at(3), None);
        Ok(())
    }

    #[test]
    fn test_category_set_rejects_bad_input() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(CategorySet::new(empty), Err(ClassifierError::ConfigurationError(_))));
        assert!(matches!(CategorySet::new(["joy", ""]), Err(ClassifierError::ConfigurationError(_))));
        assert!(matches!(CategorySet::new(["joy", "joy"]), Err(ClassifierError::ConfigurationError(_))));
        // distinct raw names that render identically would break label lookup
        assert!(matches!(CategorySet::new(["joy", "Joy"]), Err(ClassifierError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_id2label_orders_by_id() -> Result<(), ClassifierError> {
        let id2label: HashMap<String, String> = [
            ("2", "fear"), ("0", "anger"), ("1", "disgust"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let set = CategorySet::from_id2label(&id2label)?;
        assert_eq!(set.names(), &["anger", "disgust", "fear"]);
        Ok(())
    }

    #[test]
    fn test_from_id2label_rejects_gaps_and_garbage() {
        let gap: HashMap<String, String> = [("0", "anger"), ("2", "fear")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(CategorySet::from_id2label(&gap).is_err());

        let garbage: HashMap<String, String> = [("zero", "anger")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(CategorySet::from_id2label(&garbage).is_err());

        assert!(CategorySet::from_id2label(&HashMap::new()).is_err());
    }

    #[test]
    fn test_from_config_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"architectures":["RobertaForSequenceClassification"],"id2label":{"0":"anger","1":"joy"}}"#)?;

        let set = CategorySet::from_config_file(&path)?;
        assert_eq!(set.display_names(), &["Anger", "Joy"]);

        fs::write(&path, r#"{"label2id":{}}"#)?;
        assert!(matches!(CategorySet::from_config_file(&path), Err(ClassifierError::ConfigurationError(_))));
        Ok(())
    }
}
