//! Description of the task database.
//!
//! The structure is fixed: six tables, their indexes and the foreign keys
//! between them. It is never introspected; [`Schema::task_db`] is the single
//! source embedded in every prompt.

/// Represents the structure of a database as described to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Database name shown in the description.
    pub name: String,

    /// All tables, in presentation order.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

/// Represents a database table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column names in declaration order.
    pub columns: Vec<String>,

    /// Indexes on the table.
    pub indexes: Vec<Index>,
}

/// Represents an index on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Column names included in the index.
    pub columns: Vec<String>,

    /// Primary key index.
    pub is_primary: bool,

    /// Backs a unique constraint.
    pub is_unique: bool,
}

/// Represents a single-column foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing table.
    pub table: String,

    /// Referencing column.
    pub column: String,

    /// Referenced table.
    pub foreign_table: String,

    /// Referenced column.
    pub foreign_column: String,

    /// Constraint name.
    pub constraint: String,
}

impl Schema {
    /// The task database: users, companies, departments, tasks,
    /// task_dependencies and task_history.
    pub fn task_db() -> Self {
        let tables = vec![
            Table::new(
                "users",
                &[
                    "id",
                    "department_id",
                    "username",
                    "email",
                    "first_name",
                    "last_name",
                    "position",
                    "is_manager",
                    "is_active",
                    "created_at",
                    "updated_at",
                ],
            )
            .with_index(Index::primary("users_pkey", &["id"]))
            .with_index(Index::unique("users_email_key", &["email"]))
            .with_index(Index::unique("users_username_key", &["username"])),
            Table::new(
                "companies",
                &["id", "name", "description", "created_at", "updated_at"],
            )
            .with_index(Index::primary("companies_pkey", &["id"])),
            Table::new(
                "departments",
                &[
                    "id",
                    "company_id",
                    "parent_department_id",
                    "name",
                    "description",
                    "created_at",
                    "updated_at",
                ],
            )
            .with_index(Index::primary("departments_pkey", &["id"])),
            Table::new(
                "tasks",
                &[
                    "id",
                    "title",
                    "description",
                    "status",
                    "priority",
                    "assigned_user_id",
                    "assigned_department_id",
                    "created_by_user_id",
                    "due_date",
                    "start_date",
                    "completed_date",
                    "created_at",
                    "updated_at",
                ],
            )
            .with_index(Index::primary("tasks_pkey", &["id"])),
            Table::new(
                "task_dependencies",
                &["id", "task_id_1", "task_id_2", "created_at", "created_by_user_id"],
            )
            .with_index(Index::primary("task_dependencies_pkey", &["id"]))
            .with_index(Index::unique(
                "task_dependencies_task_id_1_task_id_2_key",
                &["task_id_1", "task_id_2"],
            )),
            Table::new(
                "task_history",
                &[
                    "id",
                    "task_id",
                    "changed_by_user_id",
                    "field_name",
                    "old_value",
                    "new_value",
                    "changed_at",
                ],
            )
            .with_index(Index::primary("task_history_pkey", &["id"])),
        ];

        let foreign_keys = [
            ("departments", "company_id", "companies"),
            ("departments", "parent_department_id", "departments"),
            ("task_dependencies", "created_by_user_id", "users"),
            ("task_dependencies", "task_id_1", "tasks"),
            ("task_dependencies", "task_id_2", "tasks"),
            ("task_history", "changed_by_user_id", "users"),
            ("task_history", "task_id", "tasks"),
            ("tasks", "assigned_department_id", "departments"),
            ("tasks", "assigned_user_id", "users"),
            ("tasks", "created_by_user_id", "users"),
            ("users", "department_id", "departments"),
        ]
        .into_iter()
        .map(|(table, column, foreign_table)| ForeignKey::to_id(table, column, foreign_table))
        .collect();

        Self {
            name: "task_db".to_string(),
            tables,
            foreign_keys,
        }
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Formats the schema for inclusion in a prompt.
    pub fn format_for_llm(&self) -> String {
        let mut out = format!("{} structure:\n", self.name);

        for (i, table) in self.tables.iter().enumerate() {
            out.push_str(&format!(
                "{}. {}({})\n",
                i + 1,
                table.name,
                table.columns.join(", ")
            ));
            if !table.indexes.is_empty() {
                out.push_str("   Indexes:\n");
                for index in &table.indexes {
                    out.push_str(&format!("     {}\n", index.describe()));
                }
            }
        }

        if !self.foreign_keys.is_empty() {
            out.push_str("Foreign keys (table.column -> foreign_table.foreign_column, constraint):\n");
            for fk in &self.foreign_keys {
                out.push_str(&format!(
                    "  {}.{} -> {}.{} ({})\n",
                    fk.table, fk.column, fk.foreign_table, fk.foreign_column, fk.constraint
                ));
            }
        }

        out
    }
}

impl Table {
    /// Creates a table with the given columns and no indexes.
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            indexes: Vec::new(),
        }
    }

    /// Adds an index.
    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }
}

impl Index {
    /// Primary key index.
    pub fn primary(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_primary: true,
            is_unique: true,
        }
    }

    /// Unique constraint index.
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_primary: false,
            is_unique: true,
        }
    }

    fn describe(&self) -> String {
        let kind = if self.is_primary {
            "PRIMARY KEY"
        } else if self.is_unique {
            "UNIQUE CONSTRAINT"
        } else {
            "INDEX"
        };
        format!("\"{}\" {}, btree ({})", self.name, kind, self.columns.join(", "))
    }
}

impl ForeignKey {
    /// Foreign key referencing `foreign_table.id`, named the Postgres way.
    pub fn to_id(table: &str, column: &str, foreign_table: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            foreign_table: foreign_table.to_string(),
            foreign_column: "id".to_string(),
            constraint: format!("{table}_{column}_fkey"),
        }
    }
}
