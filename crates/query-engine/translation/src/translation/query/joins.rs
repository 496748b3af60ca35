//! Collect the joins a query needs, once each, in the order they were first needed.

use indexmap::IndexMap;

use query_engine_metadata::metadata;
use query_engine_sql::sql;

/// A join edge: the target table joined under `target_alias`, reached from `source_alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEdge {
    pub source_alias: sql::ast::TableAlias,
    pub target_alias: sql::ast::TableAlias,
    pub target_table: sql::ast::TableReference,
    pub join_type: metadata::JoinType,
    /// `(source column, target column)` pairs; the primary pair comes first.
    pub key_pairs: Vec<(sql::ast::ColumnName, sql::ast::ColumnName)>,
}

/// Join edges keyed by target alias. The first registration of an alias wins.
#[derive(Debug, Default)]
pub struct JoinRegistry {
    edges: IndexMap<String, JoinEdge>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        JoinRegistry::default()
    }

    /// Register a join edge. Returns whether it was added; an edge whose target alias
    /// is already registered is ignored.
    pub fn register(&mut self, edge: JoinEdge) -> bool {
        if self.edges.contains_key(&edge.target_alias.name) {
            return false;
        }
        tracing::debug!(
            source = %edge.source_alias.name,
            target = %edge.target_alias.name,
            "registering join"
        );
        self.edges.insert(edge.target_alias.name.clone(), edge);
        true
    }

    pub fn contains(&self, target_alias: &str) -> bool {
        self.edges.contains_key(target_alias)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinEdge> {
        self.edges.values()
    }

    /// The joins as SQL JOIN clauses, in registration order.
    pub fn to_sql(&self) -> Vec<sql::ast::Join> {
        self.iter().map(JoinEdge::to_sql).collect()
    }

    pub fn into_edges(self) -> Vec<JoinEdge> {
        self.edges.into_values().collect()
    }
}

impl JoinEdge {
    /// The JOIN clause for this edge. Key pairs are conjoined equalities.
    pub fn to_sql(&self) -> sql::ast::Join {
        let conditions = self.key_pairs.iter().map(|(source, target)| {
            sql::helpers::equals(
                sql::ast::Expression::ColumnReference(sql::helpers::make_column(
                    &self.source_alias,
                    &source.0,
                )),
                sql::ast::Expression::ColumnReference(sql::helpers::make_column(
                    &self.target_alias,
                    &target.0,
                )),
            )
        });

        sql::ast::Join {
            join_type: translate_join_type(self.join_type),
            reference: self.target_table.clone(),
            alias: self.target_alias.clone(),
            on: sql::helpers::conjunction(conditions).unwrap_or_else(sql::helpers::true_expr),
        }
    }
}

fn translate_join_type(join_type: metadata::JoinType) -> sql::ast::JoinType {
    match join_type {
        metadata::JoinType::Inner => sql::ast::JoinType::Inner,
        metadata::JoinType::Left => sql::ast::JoinType::LeftOuter,
        metadata::JoinType::Right => sql::ast::JoinType::RightOuter,
        metadata::JoinType::Full => sql::ast::JoinType::FullOuter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(target: &str, column: &str) -> JoinEdge {
        JoinEdge {
            source_alias: sql::helpers::make_table_alias("t0_products".to_string()),
            target_alias: sql::helpers::make_table_alias(target.to_string()),
            target_table: sql::ast::TableReference::DBTable {
                schema: None,
                table: sql::ast::TableName("translations".to_string()),
            },
            join_type: metadata::JoinType::Left,
            key_pairs: vec![(
                sql::ast::ColumnName("id".to_string()),
                sql::ast::ColumnName(column.to_string()),
            )],
        }
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = JoinRegistry::new();
        assert!(registry.register(edge("t1_translations", "entity_id")));
        assert!(!registry.register(edge("t1_translations", "other_id")));
        assert!(registry.register(edge("t2_translations", "entity_id")));

        let edges = registry.into_edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].key_pairs[0].1 .0, "entity_id");
        assert_eq!(edges[1].target_alias.name, "t2_translations");
    }

    #[test]
    fn composite_keys_are_conjoined() {
        let mut composite = edge("t1_translations", "entity_id");
        composite.key_pairs.push((
            sql::ast::ColumnName("locale".to_string()),
            sql::ast::ColumnName("locale".to_string()),
        ));

        let mut sql = sql::string::SQL::new();
        composite.to_sql().to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            r#" LEFT OUTER JOIN "translations" AS "t1_translations" ON (("t0_products"."id" = "t1_translations"."entity_id") AND ("t0_products"."locale" = "t1_translations"."locale"))"#
        );
    }
}
