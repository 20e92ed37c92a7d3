//! Identifier normalization
//!
//! Raw schema and query identifiers are turned into exported Rust names here.
//! Every function is pure: the same input and configuration always produce
//! the same name, which keeps generated output reproducible.

use crate::config::Config;

/// Name used when normalization leaves nothing behind
pub const FALLBACK_NAME: &str = "Unnamed";

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try",
    "type", "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

// Keywords that cannot be written as raw identifiers
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

pub fn is_rust_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name)
}

/// Normalize a raw identifier into an exported type or constant name
///
/// `config.rename` wins verbatim. Otherwise every character that is not a
/// letter or digit becomes a separator, each non-empty segment is
/// title-cased (or upper-cased when it is a configured initialism) and the
/// segments are joined. A leading digit gets an underscore prefix.
pub fn normalize(raw: &str, config: &Config) -> String {
    if let Some(renamed) = config.rename.get(raw) {
        return renamed.clone();
    }

    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    let mut out = String::with_capacity(sanitized.len());
    for segment in sanitized.split('_').filter(|s| !s.is_empty()) {
        if config.is_initialism(segment) {
            out.push_str(&segment.to_uppercase());
        } else {
            out.push_str(&title_case(segment));
        }
    }

    if out.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    if out.chars().next().is_some_and(char::is_numeric) {
        out.insert(0, '_');
    }

    if out == "Self" {
        out.push('_');
    }

    out
}

/// Type-name stem for a query
///
/// Query names are usually written as Rust type names already
/// (`GetAuthor`); those are kept as they are. Anything else is normalized.
pub fn query_name(raw: &str, config: &Config) -> String {
    let already_upper_camel = raw.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && raw.chars().all(|c| c.is_ascii_alphanumeric())
        && raw != "Self";

    if already_upper_camel && !config.rename.contains_key(raw) {
        raw.to_string()
    } else {
        normalize(raw, config)
    }
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Snake-case Rust identifier for a field, argument or module
///
/// Keywords become raw identifiers (`type` -> `r#type`). Returns `None` when
/// nothing usable is left so callers can substitute a positional name.
pub fn field_ident(raw: &str) -> Option<String> {
    let mut ident = to_snake_case(raw);
    if ident.is_empty() {
        return None;
    }

    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }

    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    } else if is_rust_keyword(&ident) {
        ident.insert_str(0, "r#");
    }

    Some(ident)
}

/// SCREAMING_SNAKE_CASE constant name from an already normalized name
pub fn const_name(name: &str) -> String {
    to_snake_case(name).to_uppercase()
}

/// Split camel humps and separators into lower-case snake segments
///
/// Acronym runs stay together: `UserID` -> `user_id`,
/// `XMLHttpRequest` -> `xml_http_request`.
pub fn to_snake_case(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if ch.is_uppercase() && i > 0 && !result.is_empty() && !result.ends_with('_') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                result.push('_');
            }
        }

        result.extend(ch.to_lowercase());
    }

    result.trim_end_matches('_').to_string()
}

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "information",
    "media",
    "metadata",
    "news",
    "series",
    "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("cookies", "cookie"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("men", "man"),
    ("mice", "mouse"),
    ("movies", "movie"),
    ("people", "person"),
    ("pies", "pie"),
    ("shelves", "shelf"),
    ("teeth", "tooth"),
    ("ties", "tie"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("women", "woman"),
];

/// Singular form of a (possibly snake_case) table name
///
/// Only the last word changes: `user_orders` -> `user_order`.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.len() != word.len() {
        return word.to_string();
    }
    let last_word_start = lower.rfind(|c: char| !c.is_alphanumeric()).map(|i| i + 1).unwrap_or(0);
    let last = &lower[last_word_start..];

    if last.is_empty() || UNCOUNTABLE.contains(&last) {
        return word.to_string();
    }

    if let Some((plural, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == last) {
        let keep = word.len() - plural.len();
        return format!("{}{}", &word[..keep], singular);
    }

    let replace = |strip: usize, suffix: &str| format!("{}{}", &word[..word.len() - strip], suffix);

    if last.len() > 3 && last.ends_with("ies") {
        replace(3, if word.ends_with("IES") { "Y" } else { "y" })
    } else if last.ends_with("auses") || last.ends_with("ouses") {
        // clauses, houses: the stem keeps its `e`
        replace(1, "")
    } else if last.ends_with("sses")
        || last.ends_with("shes")
        || last.ends_with("ches")
        || last.ends_with("xes")
        || last.ends_with("zzes")
        || last.ends_with("uses")
    {
        replace(2, "")
    } else if last.ends_with("ss") || last.ends_with("us") || last.ends_with("is") {
        word.to_string()
    } else if last.len() > 1 && last.ends_with('s') {
        replace(1, "")
    } else {
        word.to_string()
    }
}
