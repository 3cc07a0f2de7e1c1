// src/search/query.rs
// Natural-language → FTS5 query translation

/// English stop words removed before building FTS expressions.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "do", "does", "did",
    "has", "have", "had", "having", "i", "me", "my", "we", "our", "you", "your", "he", "she",
    "it", "its", "they", "them", "their", "this", "that", "these", "those", "in", "on", "at",
    "to", "for", "of", "with", "by", "from", "as", "into", "about", "between", "through",
    "during", "above", "below", "and", "or", "but", "not", "nor", "so", "yet", "if", "then",
    "else", "when", "where", "how", "what", "which", "who", "whom", "why", "all", "each",
    "every", "both", "few", "more", "most", "some", "any", "no", "only", "very", "can", "will",
    "just",
];

/// Convert a natural-language query into a safe FTS5 expression.
///
/// Tokenises on non-word characters, drops stop words, and quotes each
/// surviving token. Tokens join with implicit AND by default; `use_or`
/// joins them with OR so partial matches surface.
pub fn fts5_query(query: &str, use_or: bool) -> String {
    let stripped = query.trim();
    if stripped.is_empty() {
        return String::new();
    }

    let tokens: Vec<&str> = stripped
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(&t.to_lowercase().as_str()))
        .collect();

    if tokens.is_empty() {
        // Everything was a stop word; fall back to the raw text minus
        // punctuation, quoted as a single phrase.
        let fallback: String = stripped
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
            .collect();
        let fallback = fallback.trim();
        if fallback.is_empty() {
            return String::new();
        }
        return format!("\"{}\"", fallback.replace('"', "\"\""));
    }

    let quoted: Vec<String> = tokens.iter().map(|t| format!("\"{t}\"")).collect();
    if use_or && quoted.len() > 1 {
        quoted.join(" OR ")
    } else {
        quoted.join(" ")
    }
}
