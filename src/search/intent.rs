// src/search/intent.rs
// Regex-routed graph intents: some queries are structural questions in
// disguise ("who calls X") and should hit the call graph, not retrieval.

use once_cell::sync::Lazy;
use regex::Regex;

/// A graph query intent recognised from natural language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphIntent {
    Callers,
    Callees,
    Hierarchy,
}

/// Ordered pattern table; the first match wins. Each pattern captures the
/// symbol name in group 1.
static INTENT_PATTERNS: Lazy<Vec<(Regex, GraphIntent)>> = Lazy::new(|| {
    let patterns: &[(&str, GraphIntent)] = &[
        // -- callees --
        (r"(?i)(?:what|which\s+\w+)\s+(?:does|did)\s+([\w.]+)\s+call", GraphIntent::Callees),
        (r"(?i)(?:functions?|methods?|symbols?)?\s*called\s+by\s+([\w.]+)", GraphIntent::Callees),
        (r"(?i)callees?\s+(?:of|for)\s+([\w.]+)", GraphIntent::Callees),
        (r"(?i)([\w.]+)\s+calls\s+what", GraphIntent::Callees),
        (r"(?i)dependencies\s+of\s+([\w.]+)", GraphIntent::Callees),
        // -- callers --
        (r"(?i)(?:who|what)\s+calls?\s+([\w.]+)", GraphIntent::Callers),
        (r"(?i)callers?\s+(?:of|for)\s+([\w.]+)", GraphIntent::Callers),
        (r"(?i)where\s+is\s+([\w.]+)\s+(?:used|called|invoked)", GraphIntent::Callers),
        (r"(?i)usages?\s+of\s+([\w.]+)", GraphIntent::Callers),
        // -- hierarchy --
        (r"(?i)subclass(?:es)?\s+of\s+([\w.]+)", GraphIntent::Hierarchy),
        (r"(?i)([\w.]+)\s+inherits?\s+from", GraphIntent::Hierarchy),
        (r"(?i)parent\s+class(?:es)?\s+of\s+([\w.]+)", GraphIntent::Hierarchy),
        (r"(?i)children\s+of\s+([\w.]+)", GraphIntent::Hierarchy),
        (r"(?i)(?:super|base)\s*class(?:es)?\s+of\s+([\w.]+)", GraphIntent::Hierarchy),
    ];

    patterns
        .iter()
        .filter_map(|(pattern, intent)| Regex::new(pattern).ok().map(|re| (re, *intent)))
        .collect()
});

/// Classify a query as a graph intent, returning the intent and the captured
/// symbol name. Conceptual queries fall through to retrieval with None.
pub fn classify_intent(query: &str) -> Option<(GraphIntent, String)> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    for (pattern, intent) in INTENT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(query)
            && let Some(symbol) = captures.get(1)
        {
            return Some((*intent, symbol.as_str().to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(q: &str) -> Option<(GraphIntent, String)> {
        classify_intent(q)
    }

    // -- callees patterns --

    #[test]
    fn test_callees_what_does_x_call() {
        assert_eq!(
            classify("what does find_oldest call"),
            Some((GraphIntent::Callees, "find_oldest".to_string()))
        );
    }

    #[test]
    fn test_callees_functions_called_by() {
        assert_eq!(
            classify("functions called by test_call_graph"),
            Some((GraphIntent::Callees, "test_call_graph".to_string()))
        );
    }

    #[test]
    fn test_callees_of_qualified_name() {
        assert_eq!(
            classify("callees of AnimalShelter.admit"),
            Some((GraphIntent::Callees, "AnimalShelter.admit".to_string()))
        );
    }

    #[test]
    fn test_callees_which_functions_called_by() {
        assert_eq!(
            classify("which functions are called by find_oldest_resident"),
            Some((GraphIntent::Callees, "find_oldest_resident".to_string()))
        );
    }

    // -- callers patterns --

    #[test]
    fn test_callers_who_calls() {
        assert_eq!(
            classify("who calls find_oldest"),
            Some((GraphIntent::Callers, "find_oldest".to_string()))
        );
    }

    #[test]
    fn test_callers_what_calls() {
        assert_eq!(
            classify("what calls parse_config"),
            Some((GraphIntent::Callers, "parse_config".to_string()))
        );
    }

    #[test]
    fn test_callers_of() {
        assert_eq!(
            classify("callers of find_oldest"),
            Some((GraphIntent::Callers, "find_oldest".to_string()))
        );
    }

    #[test]
    fn test_callers_where_is_x_used() {
        assert_eq!(
            classify("where is find_oldest used"),
            Some((GraphIntent::Callers, "find_oldest".to_string()))
        );
    }

    #[test]
    fn test_callers_usages_of() {
        assert_eq!(
            classify("usages of find_oldest"),
            Some((GraphIntent::Callers, "find_oldest".to_string()))
        );
    }

    // -- hierarchy patterns --

    #[test]
    fn test_hierarchy_subclasses_of() {
        assert_eq!(
            classify("subclasses of Animal"),
            Some((GraphIntent::Hierarchy, "Animal".to_string()))
        );
    }

    #[test]
    fn test_hierarchy_inherits_from() {
        assert_eq!(
            classify("Dog inherits from what"),
            Some((GraphIntent::Hierarchy, "Dog".to_string()))
        );
    }

    #[test]
    fn test_hierarchy_parent_class_of() {
        assert_eq!(
            classify("parent class of Dog"),
            Some((GraphIntent::Hierarchy, "Dog".to_string()))
        );
    }

    #[test]
    fn test_hierarchy_children_of() {
        assert_eq!(
            classify("children of Animal"),
            Some((GraphIntent::Hierarchy, "Animal".to_string()))
        );
    }

    // -- no match: conceptual queries fall through to retrieval --

    #[test]
    fn test_no_match_conceptual_query() {
        assert_eq!(classify("how does authentication work"), None);
    }

    #[test]
    fn test_no_match_keyword_search() {
        assert_eq!(classify("parse config toml"), None);
    }

    #[test]
    fn test_no_match_empty() {
        assert_eq!(classify(""), None);
    }
}
