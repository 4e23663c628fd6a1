use sqlparser::dialect::SQLiteDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// statements allowed to reach the database
const READ_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "EXPLAIN"];

/// keywords that change state; `REPLACE` is left out since it is also a string function
const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "ATTACH", "DETACH", "PRAGMA",
    "VACUUM", "REINDEX",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// a single read-only statement
    ReadOnly,
    /// nothing but comments, the model's way of declining a question
    CommentOnly,
    Rejected(String),
    /// the tokenizer could not read it; the database gets the final word
    Unparsed,
}

/// Classify model-produced sql before it is executed.
pub fn classify(sql: &str) -> StatementKind {
    let dialect = SQLiteDialect {};
    let tokens = match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::debug!("sql tokenization failed, deferring to the database: {}", e);
            return StatementKind::Unparsed;
        }
    };

    // whitespace tokens include comments
    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect();

    // a refusal comment may still carry a stray terminator
    if significant.iter().all(|t| matches!(t, Token::SemiColon)) {
        return StatementKind::CommentOnly;
    }
    let first = significant[0];

    let leading = match first {
        Token::Word(w) if w.quote_style.is_none() => w.value.to_uppercase(),
        other => {
            return StatementKind::Rejected(format!(
                "query must start with SELECT or WITH, found `{}`",
                other
            ))
        }
    };

    if !READ_KEYWORDS.contains(&leading.as_str()) {
        return StatementKind::Rejected(format!(
            "only read-only queries are allowed, found a {} statement",
            leading
        ));
    }

    let mut terminated = false;
    for token in &significant {
        match token {
            Token::SemiColon => terminated = true,
            _ if terminated => {
                return StatementKind::Rejected(
                    "only a single statement is allowed per query".to_string(),
                )
            }
            Token::Word(w) if w.quote_style.is_none() => {
                let upper = w.value.to_uppercase();
                if WRITE_KEYWORDS.contains(&upper.as_str()) {
                    return StatementKind::Rejected(format!(
                        "only read-only queries are allowed, found {}",
                        upper
                    ));
                }
            }
            _ => {}
        }
    }

    StatementKind::ReadOnly
}
