use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let pk = if col.name == "id" { " PRIMARY KEY" } else { "" };
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let default = col
            .default
            .map(|literal| format!(" DEFAULT {}", literal))
            .unwrap_or_default();
        let check = col
            .check
            .map(|expr| format!(" CHECK ({})", expr))
            .unwrap_or_default();

        columns.push(format!(
            "    {} {}{}{}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint,
            default,
            check
        ));
    }

    for unique in schema.unique {
        columns.push(format!("    UNIQUE ({})", unique.join(", ")));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for the table's declared indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let unique = if index.unique { "UNIQUE " } else { "" };
            let predicate = index
                .predicate
                .map(|p| format!(" WHERE {}", p))
                .unwrap_or_default();
            format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {}({}){}",
                unique,
                index.name,
                schema.name,
                index.columns.join(", "),
                predicate
            )
        })
        .collect()
}
