use crate::schema::SchemaContext;

/// System instruction for the one-shot repair call.
///
/// With `prior_error` the model is told to fix the query with respect to that
/// error; without it the call is a plain schema conformance pass.
pub fn build_sanitizer_prompt(schema: &SchemaContext, prior_error: Option<&str>) -> String {
    let fix_rule = match prior_error {
        Some(error) => format!(
            "1. The query failed in SQLite with this error:\n   {}\n   Fix the query so that this error no longer occurs.",
            error.trim()
        ),
        None => "1. Fix any syntax or logical errors in the query.".to_string(),
    };

    format!(
        "You are an expert SQLite assistant. You will be given a SQL query that may be \
         incorrect or invalid. Your task is to:\n\
         {}\n\
         2. Only use tables and columns from the schema below.\n\
         3. If the query is already correct, return it unchanged.\n\
         4. Return only the corrected SQL query. No explanation, no markdown, no extra text.\n\n\
         Schema:\n{}",
        fix_rule,
        schema.table_listing()
    )
}
