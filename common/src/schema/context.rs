use super::tables::{TableDef, IPL_TABLES};

/// bump when the table list or the output rules change, so logs show which prompt produced a query
pub const SCHEMA_VERSION: &str = "ipl-2024.1";

/// rows returned when the question does not name a number
pub const DEFAULT_ROW_LIMIT: usize = 5;

const EXAMPLE_QUERY: &str = "SELECT Match_Id FROM Match \
     WHERE Toss_Decide = (SELECT Toss_Id FROM Toss_Decision WHERE Toss_Name = 'Bat') \
     AND Toss_Winner = Match_Winner;";

/// Read-only description of the database handed to the model with every request.
///
/// Built once at startup and shared behind an `Arc` by the generator and the
/// sanitizer.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    version: &'static str,
    tables: &'static [TableDef],
    system_prompt: String,
}

impl SchemaContext {
    pub fn new(version: &'static str, tables: &'static [TableDef], row_limit: usize) -> Self {
        let system_prompt = render_system_prompt(tables, row_limit);
        Self {
            version,
            tables,
            system_prompt,
        }
    }

    /// the ipl dataset this service ships with
    pub fn ipl() -> Self {
        Self::new(SCHEMA_VERSION, IPL_TABLES, DEFAULT_ROW_LIMIT)
    }

    pub fn version(&self) -> &str {
        self.version
    }

    pub fn tables(&self) -> &[TableDef] {
        self.tables
    }

    /// one `Table(Col, ...)` signature per line
    pub fn table_listing(&self) -> String {
        self.tables
            .iter()
            .map(TableDef::signature)
            .collect::<Vec<_>>()
            .join(",\n")
    }

    /// system instruction for sql generation
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

fn render_system_prompt(tables: &[TableDef], row_limit: usize) -> String {
    let listing = tables
        .iter()
        .map(TableDef::signature)
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "You are an expert IPL stats assistant. The IPL SQLite database has these tables:\n\n\
         {listing}\n\n\
         - Tables are written as Table_Name(Column_1, Column_2, ...). The first column is the \
         primary key; use exactly these names when writing the query.\n\
         - Retrieve only what is asked and keep the query general.\n\
         - Limit the result to {row_limit} rows unless the question names a number.\n\
         - If the schema cannot answer the question, return only a SQL comment saying why, \
         e.g. -- Unable to answer because the tables do not record umpire salaries.\n\
         - Return exactly one syntactically valid SQLite query as plain text. \
         No explanation, no markdown.\n\n\
         Example output: {EXAMPLE_QUERY}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_lists_every_table() {
        let ctx = SchemaContext::ipl();
        for table in ctx.tables() {
            assert!(ctx.system_prompt().contains(&table.signature()));
        }
    }

    #[test]
    fn test_system_prompt_carries_output_rules() {
        let ctx = SchemaContext::ipl();
        let prompt = ctx.system_prompt();
        assert!(prompt.contains("Limit the result to 5 rows"));
        assert!(prompt.contains("-- Unable to answer"));
        assert!(prompt.contains("Batsman_Scored(Match_Id, Over_Id, Ball_Id, Runs_Scored, Innings_No)"));
    }

    #[test]
    fn test_custom_row_limit() {
        let ctx = SchemaContext::new("test", IPL_TABLES, 10);
        assert!(ctx.system_prompt().contains("Limit the result to 10 rows"));
    }
}
