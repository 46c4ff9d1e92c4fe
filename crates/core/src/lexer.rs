//! Token normalization and the reserved vocabulary of the pipeline language.
//!
//! Pipelines arrive as command-line words. Brackets may be glued to other
//! text (`"[add"`, `"2]"`), so normalization splits every bracket into its
//! own token and drops empty strings before anything else looks at them.

pub const OPEN_BRACKET: &str = "[";
pub const CLOSE_BRACKET: &str = "]";

pub const IF: &str = "if";
pub const ELSE: &str = "else";
pub const THEN: &str = "then";

pub const MOD: &str = "mod";
pub const AS_BASE: &str = "as-base";

/// Built-in operation names, in the order they are documented.
pub const BUILTIN_OPERATIONS: [&str; 17] = [
    "id",
    "sum",
    "min",
    "max",
    "sort",
    "prod",
    "bit-or",
    "bit-xor",
    "bit-and",
    "add",
    "scale",
    "exp",
    "set-to",
    "bound",
    "select",
    "reroll",
    "slice-apply",
];

/// Operations that accept an `if` block.
pub const IF_ABLE: [&str; 6] = ["add", "scale", "exp", "set-to", "bound", "reroll"];

/// Operations that accept an `else` branch (and may start one).
pub const ELSE_ABLE: [&str; 5] = ["add", "scale", "exp", "set-to", "bound"];

pub const LOGIC_KEYWORDS: [&str; 3] = [IF, ELSE, THEN];
pub const COMPARISONS: [&str; 6] = ["eq", "ne", "gt", "ge", "lt", "le"];
pub const BOOLEAN_KEYWORDS: [&str; 3] = ["not", "and", "or"];
pub const ROUNDING_TAGS: [&str; 5] = ["r-ceil", "r-floor", "r-truncate", "r-half-up", "r-half-down"];

pub fn is_builtin_operation(token: &str) -> bool {
    BUILTIN_OPERATIONS.contains(&token)
}

pub fn is_logic_keyword(token: &str) -> bool {
    LOGIC_KEYWORDS.contains(&token)
}

pub fn is_bracket(token: &str) -> bool {
    token == OPEN_BRACKET || token == CLOSE_BRACKET
}

/// Tokens that end a run of `mod` divisors: any comparison or boolean keyword.
pub fn is_compare_keyword(token: &str) -> bool {
    token == MOD || COMPARISONS.contains(&token) || BOOLEAN_KEYWORDS.contains(&token)
}

/// True for every word the language reserves. Custom operations may not use these names.
pub fn is_reserved(token: &str) -> bool {
    is_builtin_operation(token)
        || is_logic_keyword(token)
        || is_compare_keyword(token)
        || is_bracket(token)
        || ROUNDING_TAGS.contains(&token)
        || token == AS_BASE
}

/// Split raw words so that `[` and `]` always stand alone, dropping empty pieces.
///
/// Words are also split on interior whitespace, so a whole pipeline passed as
/// one quoted argument normalizes the same way as separate words.
pub fn normalize_tokens<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    for word in raw {
        for piece in word.as_ref().split_whitespace() {
            let mut current = String::new();
            for c in piece.chars() {
                if c == '[' || c == ']' {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                    tokens.push(c.to_string());
                } else {
                    current.push(c);
                }
            }
            if !current.is_empty() {
                tokens.push(current);
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_become_standalone_tokens() {
        let tokens = normalize_tokens(["[add", "2", "scale", "2]", "if"]);
        assert_eq!(tokens, ["[", "add", "2", "scale", "2", "]", "if"]);
    }

    #[test]
    fn adjacent_brackets_and_empty_words() {
        let tokens = normalize_tokens(["", "[[5]]", "  "]);
        assert_eq!(tokens, ["[", "[", "5", "]", "]"]);
    }

    #[test]
    fn whole_pipeline_in_one_word() {
        let tokens = normalize_tokens(["add 1 if [eq 1 or eq 2]"]);
        assert_eq!(
            tokens,
            ["add", "1", "if", "[", "eq", "1", "or", "eq", "2", "]"]
        );
    }

    #[test]
    fn bracket_inside_word_splits_both_sides() {
        let tokens = normalize_tokens(["a]b"]);
        assert_eq!(tokens, ["a", "]", "b"]);
    }

    #[test]
    fn reserved_vocabulary() {
        for word in ["sum", "if", "mod", "and", "[", "r-ceil", "as-base", "slice-apply"] {
            assert!(is_reserved(word), "{word} should be reserved");
        }
        assert!(!is_reserved("best-two"));
        assert!(!is_reserved("5"));
    }

    #[test]
    fn else_able_is_subset_of_if_able() {
        for op in ELSE_ABLE {
            assert!(IF_ABLE.contains(&op));
        }
        assert!(!ELSE_ABLE.contains(&"reroll"));
    }
}
