// src/indexer/noise.rs
// Call-edge noise policy: standard builtins, common container/string methods,
// and well-known external library prefixes are dropped before storage.
//
// The lists are per-language. Parsers emit every call site they see; the
// filter lives here so the policy is centralised and testable, and so that
// one language's builtin list never filters another language's symbols.

/// Python builtins and common exception types.
const PYTHON_BUILTINS: &[&str] = &[
    "print", "len", "str", "int", "float", "bool", "list", "dict", "set", "tuple", "range",
    "enumerate", "zip", "open", "type", "isinstance", "issubclass", "hasattr", "getattr",
    "setattr", "super", "sorted", "reversed", "map", "filter", "any", "all", "max", "min", "sum",
    "abs", "round", "repr", "hash", "id", "iter", "next", "vars", "callable", "format",
    "Exception", "ValueError", "TypeError", "KeyError", "IndexError", "AttributeError",
    "RuntimeError", "NotImplementedError", "StopIteration", "OSError", "IOError",
    "FileNotFoundError", "PermissionError", "KeyboardInterrupt",
];

/// Methods of builtin Python types, matched against the last dotted component
/// or a bare name (tree-sitter extractors sometimes emit only the attribute).
const PYTHON_METHODS: &[&str] = &[
    "append", "extend", "pop", "insert", "remove", "clear", "copy", "update", "keys", "values",
    "items", "setdefault", "join", "split", "rsplit", "strip", "lstrip", "rstrip", "replace",
    "startswith", "endswith", "lower", "upper", "title", "encode", "decode", "read", "write",
    "readline", "readlines", "close", "fetchall", "fetchone", "execute", "executescript",
    "executemany", "commit", "rollback", "add", "discard",
];

/// Well-known external module prefixes (first dotted component).
const PYTHON_MODULES: &[&str] = &[
    "os", "sys", "re", "json", "ast", "click", "pathlib", "logging", "sqlite3", "hashlib",
    "asyncio", "typing", "collections", "itertools", "functools", "textwrap", "shutil",
    "subprocess", "httpx", "requests", "math", "time", "datetime", "dataclasses", "importlib",
];

/// Rust std methods, trait methods, and type constructors.
const RUST_NAMES: &[&str] = &[
    // Iterator/collection methods
    "map", "filter", "collect", "iter", "into_iter", "for_each", "fold", "reduce", "find", "any",
    "all", "count", "take", "skip", "chain", "zip", "enumerate", "filter_map", "flat_map",
    "flatten", "rev",
    // Option/Result methods
    "unwrap", "unwrap_or", "unwrap_or_else", "unwrap_or_default", "expect", "ok", "err",
    "is_some", "is_none", "is_ok", "is_err", "ok_or", "ok_or_else", "map_err", "and_then",
    "or_else", "as_ref", "as_mut",
    // Common traits/constructors
    "new", "default", "clone", "to_string", "to_owned", "into", "from", "as_str", "as_bytes",
    "to_vec", "push", "pop", "insert", "remove", "get", "get_mut", "contains", "len", "is_empty",
    "extend",
    // Result/Option constructors
    "Ok", "Err", "Some", "None",
    // Formatting and logging
    "format", "write", "writeln", "print", "println", "eprintln", "debug", "info", "warn",
    "error", "trace",
    // Common string methods
    "trim", "starts_with", "ends_with", "to_lowercase", "to_uppercase", "parse", "chars",
    "lines",
    // Sync and async primitives
    "lock", "spawn", "block_on", "await",
    // Math/comparison
    "min", "cmp", "eq", "drop", "swap",
];

const RUST_PREFIXES: &[&str] = &[
    "std::", "core::", "alloc::", "tracing::", "log::", "Vec::", "String::", "HashMap::",
    "HashSet::", "BTreeMap::", "Option::", "Result::", "Box::", "Rc::", "Arc::", "Cell::",
    "RefCell::", "Mutex::", "RwLock::", "Path::", "PathBuf::",
];

/// JavaScript / TypeScript builtins and host objects.
const JS_NAMES: &[&str] = &[
    "require", "parseInt", "parseFloat", "isNaN", "setTimeout", "setInterval", "clearTimeout",
    "encodeURIComponent", "decodeURIComponent", "log", "warn", "error", "info", "push", "pop",
    "shift", "unshift", "slice", "splice", "join", "split", "map", "filter", "reduce", "forEach",
    "find", "includes", "indexOf", "concat", "trim", "replace", "toString", "toLowerCase",
    "toUpperCase", "keys", "values", "entries", "then", "catch", "finally", "stringify", "parse",
];

const JS_PREFIXES: &[&str] = &[
    "console.", "JSON.", "Object.", "Array.", "Math.", "Promise.", "Number.", "String.",
    "Date.", "window.", "document.", "process.",
];

/// Fallback for languages without a dedicated list.
const COMMON_NAMES: &[&str] = &[
    "println", "print", "format", "toString", "equals", "hashCode", "size", "length", "add",
    "get", "put", "remove", "contains", "push_back", "emplace_back", "begin", "end",
];

/// Should this call edge be dropped as noise?
///
/// `callee` is the textual name captured at the call site, possibly a dotted
/// chain like `self.items.append` or a `::`-scoped path.
pub fn is_noise_call(language: &str, callee: &str) -> bool {
    match language {
        "python" => is_python_noise(callee),
        "rust" => is_rust_noise(callee),
        "javascript" | "typescript" => is_js_noise(callee),
        _ => {
            let bare = last_component(callee, '.');
            COMMON_NAMES.contains(&bare)
        }
    }
}

fn last_component(callee: &str, sep: char) -> &str {
    callee.rsplit(sep).next().unwrap_or(callee)
}

fn is_python_noise(callee: &str) -> bool {
    if let Some((first, _)) = callee.split_once('.') {
        let bare = last_component(callee, '.');
        PYTHON_METHODS.contains(&bare) || PYTHON_MODULES.contains(&first)
    } else {
        PYTHON_BUILTINS.contains(&callee) || PYTHON_METHODS.contains(&callee)
    }
}

fn is_rust_noise(callee: &str) -> bool {
    if RUST_NAMES.contains(&callee) {
        return true;
    }
    if RUST_PREFIXES.iter().any(|p| callee.starts_with(p)) {
        return true;
    }
    if callee.contains('.') {
        return RUST_NAMES.contains(&last_component(callee, '.'));
    }
    if callee.contains("::") {
        return RUST_NAMES.contains(&last_component(callee, ':'));
    }
    false
}

fn is_js_noise(callee: &str) -> bool {
    if JS_PREFIXES.iter().any(|p| callee.starts_with(p)) {
        return true;
    }
    let bare = last_component(callee, '.');
    JS_NAMES.contains(&bare)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_builtins_are_noise() {
        assert!(is_noise_call("python", "len"));
        assert!(is_noise_call("python", "isinstance"));
        assert!(is_noise_call("python", "ValueError"));
        assert!(is_noise_call("python", "any"));
        assert!(is_noise_call("python", "max"));
        assert!(is_noise_call("python", "NotImplementedError"));
    }

    #[test]
    fn test_python_builtin_methods_are_noise() {
        assert!(is_noise_call("python", "self.items.append"));
        assert!(is_noise_call("python", "results.extend"));
        assert!(is_noise_call("python", "name.strip"));
        assert!(is_noise_call("python", "self._animals.pop"));
        // Bare method names, as emitted by some extractors
        assert!(is_noise_call("python", "fetchall"));
        assert!(is_noise_call("python", "strip"));
        assert!(is_noise_call("python", "join"));
    }

    #[test]
    fn test_python_external_modules_are_noise() {
        assert!(is_noise_call("python", "ast.get_docstring"));
        assert!(is_noise_call("python", "click.echo"));
        assert!(is_noise_call("python", "json.dumps"));
        assert!(is_noise_call("python", "re.sub"));
    }

    #[test]
    fn test_python_project_calls_are_kept() {
        assert!(!is_noise_call("python", "find_oldest"));
        assert!(!is_noise_call("python", "self.store.upsert_file"));
        assert!(!is_noise_call("python", "parser.parse"));
        assert!(!is_noise_call("python", "_make_symbol"));
    }

    #[test]
    fn test_rust_std_calls_are_noise() {
        assert!(is_noise_call("rust", "unwrap"));
        assert!(is_noise_call("rust", "std::mem::swap"));
        assert!(is_noise_call("rust", "Vec::new"));
        assert!(is_noise_call("rust", "items.iter"));
        assert!(is_noise_call("rust", "tracing::info"));
    }

    #[test]
    fn test_rust_project_calls_are_kept() {
        assert!(!is_noise_call("rust", "resolve_graph_edges"));
        assert!(!is_noise_call("rust", "self.check"));
        assert!(!is_noise_call("rust", "crate::db::open_pool"));
    }

    #[test]
    fn test_js_noise() {
        assert!(is_noise_call("javascript", "console.log"));
        assert!(is_noise_call("typescript", "JSON.stringify"));
        assert!(is_noise_call("typescript", "items.map"));
        assert!(!is_noise_call("typescript", "loadConfig"));
        assert!(!is_noise_call("javascript", "this.store.load"));
    }

    #[test]
    fn test_language_lists_do_not_leak() {
        // Python's builtin list must not filter identically-named symbols in
        // other languages, and vice versa.
        assert!(!is_noise_call("rust", "isinstance"));
        assert!(!is_noise_call("java", "len"));
        assert!(is_noise_call("java", "println"));
    }
}
