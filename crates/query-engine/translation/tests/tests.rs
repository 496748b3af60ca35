mod common;

use serde_json::json;
use similar_asserts::assert_eq;

use filter_compiler_configuration::LimitPolicy;
use query_engine_metadata::metadata::{FieldLookup, JoinType};
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::helpers::Env;
use query_engine_translation::translation::query::translate_count;

const TRANSLATIONS_JOIN: &str = r#"LEFT OUTER JOIN "translations" AS "t1_translations" ON ("t0_products"."id" = "t1_translations"."entity_id")"#;

#[tokio::test]
async fn select_simple() {
    let statement = common::test_translation("products", "select_simple")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id", "t0_products"."handle" FROM "products" AS "t0_products" LIMIT 20 OFFSET 0"#
    );
    assert!(statement.params.is_empty());
}

#[tokio::test]
async fn translated_title_containsi() {
    let statement = common::test_translation("products", "translated_title_containsi")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        format!(
            r#"SELECT "t0_products"."id", "t0_products"."handle", "t1_translations"."value" AS "translation.value" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE ("t1_translations"."value" ILIKE $1) LIMIT 20 OFFSET 0"#
        )
    );
    assert_eq!(common::params(&statement), json!(["%phone%"]));
}

#[tokio::test]
async fn where_operators() {
    let statement = common::test_translation("products", "where_operators")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE (((("t0_products"."price" >= $1) AND ("t0_products"."price" < $2)) AND ("t0_products"."status" = $3)) AND ("t0_products"."handle" IN ($4, $5))) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(
        common::params(&statement),
        json!([10, 100, "active", "a", "b"])
    );
}

#[tokio::test]
async fn combinators() {
    let statement = common::test_translation("products", "combinators")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE ((("t0_products"."status" = $1) OR ("t0_products"."price" < $2)) AND NOT ("t0_products"."handle" LIKE $3)) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&statement), json!(["draft", 5, "tmp%"]));
}

#[tokio::test]
async fn null_handling() {
    let statement = common::test_translation("products", "null_handling")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE ((("t0_products"."price" > $1) AND ("t0_products"."created_at" IS NULL)) AND ("t0_products"."handle" IS NOT NULL)) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&statement), json!([1]));
}

#[tokio::test]
async fn empty_in_and_not_in() {
    let statement = common::test_translation("products", "empty_in_and_not_in")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE false LIMIT 20 OFFSET 0"#
    );
    assert!(statement.params.is_empty());
}

#[tokio::test]
async fn empty_filters_are_omitted() {
    let statement = common::test_translation("products", "empty_filters")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" LIMIT 20 OFFSET 0"#
    );
}

#[tokio::test]
async fn join_select_fields() {
    let statement = common::test_translation("products", "join_select_fields")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        format!(
            r#"SELECT "t0_products"."id", "t1_translations"."value" AS "title" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE ("t1_translations"."value" = $1) LIMIT 20 OFFSET 0"#
        )
    );
    assert_eq!(common::params(&statement), json!(["Phone"]));
}

#[tokio::test]
async fn join_deduplication() {
    let compiled = common::compile("products", "join_deduplication", |_| {})
        .await
        .unwrap();
    assert_eq!(compiled.joins_used.len(), 1);
    assert_eq!(
        compiled.statement().sql,
        format!(
            r#"SELECT "t0_products"."id", "t1_translations"."value" AS "translation.value", "t1_translations"."locale" AS "translation.locale" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE ("t1_translations"."locale" = $1) LIMIT 20 OFFSET 0"#
        )
    );
}

#[tokio::test]
async fn join_literal_is_equality() {
    let literal = common::test_translation("products", "join_literal_equality")
        .await
        .unwrap();
    let explicit = common::test_translation("products", "join_select_fields")
        .await
        .unwrap();
    assert_eq!(literal, explicit);
    assert_eq!(common::params(&literal), json!(["Phone"]));
}

#[tokio::test]
async fn join_select_fields_are_conjoined() {
    let statement = common::test_translation("products", "join_multiple_select_fields")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        format!(
            r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE (("t1_translations"."value" = $1) AND ("t1_translations"."locale" = $2)) LIMIT 20 OFFSET 0"#
        )
    );
    assert_eq!(common::params(&statement), json!(["x", "x"]));
}

#[tokio::test]
async fn operators_on_a_join_without_select_fields_use_its_column() {
    let compiled = common::compile("products", "join_own_column", |_| {})
        .await
        .unwrap();
    assert!(compiled.joins_used.is_empty());
    let statement = compiled.statement();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE ("t0_products"."id" = $1) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&statement), json!([5]));
}

#[tokio::test]
async fn joins_are_shared_between_fields() {
    let compiled = common::compile("products", "join_shared_target", |_| {})
        .await
        .unwrap();
    assert_eq!(compiled.joins_used.len(), 1);
    assert_eq!(
        compiled.statement().sql,
        format!(
            r#"SELECT "t0_products"."id", "t1_translations"."locale" AS "translation.locale" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE ("t1_translations"."value" = $1) LIMIT 20 OFFSET 0"#
        )
    );
}

#[tokio::test]
async fn nested_and_flattens() {
    let nested = common::test_translation("products", "nested_and")
        .await
        .unwrap();
    let flat = common::test_translation("products", "flat_and").await.unwrap();
    assert_eq!(nested, flat);
    assert_eq!(
        flat.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE ((("t0_products"."status" = $1) AND ("t0_products"."price" > $2)) AND ("t0_products"."handle" = $3)) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&flat), json!(["a", 1, "h"]));
}

#[tokio::test]
async fn malformed_combinators_are_skipped() {
    let statement = common::test_translation("products", "malformed_combinators")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE ("t0_products"."status" = $1) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&statement), json!(["a"]));
}

#[tokio::test]
async fn nested_joins() {
    let compiled = common::compile("variants", "nested_joins", |_| {})
        .await
        .unwrap();
    assert_eq!(
        compiled.statement().sql,
        r#"SELECT "t0_variants"."sku", "t2_brands"."name" AS "product.brand.name" FROM "product_variants" AS "t0_variants" LEFT OUTER JOIN "products" AS "t1_products" ON ("t0_variants"."product_id" = "t1_products"."id") INNER JOIN "brands" AS "t2_brands" ON ("t1_products"."brand_id" = "t2_brands"."id") WHERE ("t2_brands"."country_code" = $1) ORDER BY "t2_brands"."name" DESC, "t0_variants"."sku" ASC LIMIT 20 OFFSET 0"#
    );
    let join_types: Vec<JoinType> = compiled
        .joins_used
        .iter()
        .map(|edge| edge.join_type)
        .collect();
    assert_eq!(join_types, vec![JoinType::Left, JoinType::Inner]);
}

#[tokio::test]
async fn aliases_are_stable_across_compilations() {
    let first = common::compile("variants", "nested_joins", |_| {})
        .await
        .unwrap();
    let second = common::compile("variants", "nested_joins", |_| {})
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn composite_join() {
    let statement = common::test_translation("variants", "composite_join")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_variants"."sku", "t1_stock"."quantity" AS "stock.quantity" FROM "product_variants" AS "t0_variants" LEFT OUTER JOIN "stock_levels" AS "t1_stock" ON (("t0_variants"."id" = "t1_stock"."variant_id") AND ("t0_variants"."region" = "t1_stock"."region")) WHERE ("t1_stock"."quantity" > $1) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&statement), json!([0]));
}

#[tokio::test]
async fn schema_defaults() {
    let statement = common::test_translation("brands", "schema_defaults")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_brands"."id", "t0_brands"."name" FROM "brands" AS "t0_brands" ORDER BY "t0_brands"."name" ASC LIMIT 20 OFFSET 0"#
    );
}

#[tokio::test]
async fn output_alias_and_explicit_empty_order() {
    let statement = common::test_translation("brands", "output_alias")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_brands"."country_code" AS "country" FROM "brands" AS "t0_brands" LIMIT 20 OFFSET 0"#
    );
}

#[tokio::test]
async fn select_star() {
    let statement = common::test_translation("products", "select_star")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products".* FROM "products" AS "t0_products" LIMIT 20 OFFSET 0"#
    );
}

#[tokio::test]
async fn ordering_and_pagination() {
    let statement = common::test_translation("products", "ordering_and_pagination")
        .await
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" ORDER BY "t0_products"."created_at" DESC NULLS LAST, "t0_products"."price" ASC LIMIT 50 OFFSET 40"#
    );
}

#[tokio::test]
async fn cursor_pagination() {
    let compiled = common::compile("products", "cursor_pagination", |_| {})
        .await
        .unwrap();
    assert_eq!(
        compiled.statement().sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" LIMIT 10 OFFSET 6"#
    );
    assert_eq!(compiled.pagination.cursor_for(0), "Y3Vyc29yOjY=");
}

#[tokio::test]
async fn joins_follow_registration_order() {
    let compiled = common::compile("products", "join_registration_order", |_| {})
        .await
        .unwrap();
    assert_eq!(
        compiled.statement().sql,
        format!(
            r#"SELECT "t1_brands"."name" AS "brand.name" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} INNER JOIN "brands" AS "t1_brands" ON ("t0_products"."brand_id" = "t1_brands"."id") WHERE ("t1_translations"."locale" = $1) LIMIT 20 OFFSET 0"#
        )
    );
    let aliases: Vec<&str> = compiled
        .joins_used
        .iter()
        .map(|edge| edge.target_alias.name.as_str())
        .collect();
    assert_eq!(aliases, vec!["t1_translations", "t1_brands"]);
}

#[tokio::test]
async fn permissive_lookup_uses_raw_columns() {
    let statement = common::test_translation_with("products", "permissive_fields", |settings| {
        settings.field_lookup = FieldLookup::Permissive;
    })
    .await
    .unwrap();
    assert_eq!(
        statement.sql,
        format!(
            r#"SELECT "t0_products"."id", "t0_products"."legacy_code", "t1_translations"."extra" AS "translation_extra" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE ("t0_products"."legacy_code" <> $1) LIMIT 20 OFFSET 0"#
        )
    );
}

#[tokio::test]
async fn strict_lookup_rejects_unknown_fields() {
    let configuration = common::configuration(|_| {}).await.unwrap();
    let request = common::read_request("permissive_fields").unwrap();
    let schema = configuration.registry.get("products").unwrap();

    let strict = Env::new(&configuration.settings);
    assert_eq!(
        query_engine_translation::translation::query::translate(&strict, schema, &request)
            .unwrap_err(),
        Error::UnknownField {
            field: "legacy_code".to_string(),
            schema: "products".to_string()
        }
    );

    let permissive = strict.with_lookup(FieldLookup::Permissive);
    assert!(
        query_engine_translation::translation::query::translate(&permissive, schema, &request)
            .is_ok()
    );
}

#[tokio::test]
async fn custom_operator_prefix() {
    let statement = common::test_translation_with("products", "custom_prefix", |settings| {
        settings.operator_prefix = "$".to_string();
    })
    .await
    .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0_products"."id" FROM "products" AS "t0_products" WHERE (("t0_products"."price" > $1) AND (("t0_products"."status" = $2) OR ("t0_products"."status" = $3))) LIMIT 20 OFFSET 0"#
    );
    assert_eq!(common::params(&statement), json!([3, "a", "b"]));
}

#[tokio::test]
async fn count_statement_keeps_filter_joins_only() {
    let configuration = common::configuration(|_| {}).await.unwrap();
    let request = common::read_request("translated_title_containsi").unwrap();
    let schema = configuration.registry.get("products").unwrap();

    let plan = translate_count(&Env::new(&configuration.settings), schema, &request).unwrap();
    assert_eq!(
        plan.query_sql().sql,
        format!(
            r#"SELECT COUNT(*) AS "count" FROM "products" AS "t0_products" {TRANSLATIONS_JOIN} WHERE ("t1_translations"."value" ILIKE $1)"#
        )
    );
}

#[tokio::test]
async fn limit_above_maximum_is_rejected() {
    let error = common::translation_error("products", json!({ "limit": 1000 }), |_| {}).await;
    assert_eq!(
        error,
        Error::LimitExceedsMaximum {
            requested: 1000,
            maximum: 100
        }
    );
    assert_eq!(
        error.to_string(),
        "requested limit 1000 exceeds the maximum of 100"
    );
}

#[tokio::test]
async fn limit_above_maximum_can_be_clamped() {
    let configuration = common::configuration(|settings| {
        settings.limit_policy = LimitPolicy::Clamp;
    })
    .await
    .unwrap();
    let request = serde_json::from_value(json!({ "select": ["id"], "limit": 1000 })).unwrap();
    let compiled = query_engine_translation::translation::query::translate_collection(
        &configuration,
        "products",
        &request,
    )
    .unwrap();
    assert_eq!(compiled.pagination.limit, 100);
}

#[tokio::test]
async fn unknown_collection() {
    let error = common::translation_error("orders", json!({}), |_| {}).await;
    assert_eq!(error, Error::CollectionNotFound("orders".to_string()));
}

#[tokio::test]
async fn unknown_operator() {
    let error = common::translation_error(
        "products",
        json!({ "where": { "price": { "_approx": 1 } } }),
        |_| {},
    )
    .await;
    assert_eq!(
        error,
        Error::UnknownOperator {
            field: "price".to_string(),
            operator: "_approx".to_string()
        }
    );
}

#[tokio::test]
async fn path_through_a_plain_field() {
    let error =
        common::translation_error("products", json!({ "select": ["handle.value"] }), |_| {}).await;
    assert_eq!(
        error,
        Error::NotARelationship {
            field: "handle".to_string(),
            schema: "products".to_string()
        }
    );
}

#[tokio::test]
async fn duplicate_select_fields() {
    let error =
        common::translation_error("products", json!({ "select": ["id", "id"] }), |_| {}).await;
    assert_eq!(error, Error::DuplicateSelectField("id".to_string()));
}

#[tokio::test]
async fn join_depth_is_limited() {
    let error = common::translation_error(
        "variants",
        json!({ "select": ["product.brand.name"] }),
        |settings| settings.max_join_depth = 2,
    )
    .await;
    assert_eq!(
        error,
        Error::JoinDepthExceeded {
            depth: 2,
            max_depth: 2
        }
    );
}

#[tokio::test]
async fn malformed_filters() {
    let error =
        common::translation_error("products", json!({ "where": { "id": [1, 2] } }), |_| {}).await;
    assert!(matches!(error, Error::MalformedFilter { field, .. } if field == "id"));

    let error = common::translation_error(
        "products",
        json!({ "where": { "handle": { "value": "x" } } }),
        |_| {},
    )
    .await;
    assert_eq!(
        error,
        Error::MalformedFilter {
            field: "handle".to_string(),
            reason: "nested filters are only allowed on join fields".to_string()
        }
    );

}

#[tokio::test]
async fn malformed_operands() {
    let error = common::translation_error(
        "products",
        json!({ "where": { "price": { "_between": [1] } } }),
        |_| {},
    )
    .await;
    assert!(matches!(error, Error::MalformedOperand { operator, .. } if operator == "_between"));

    let error = common::translation_error(
        "products",
        json!({ "where": { "handle": { "_contains": "x".repeat(1001) } } }),
        |_| {},
    )
    .await;
    assert!(matches!(error, Error::MalformedOperand { operator, .. } if operator == "_contains"));
}

#[tokio::test]
async fn invalid_cursor() {
    let error = common::translation_error(
        "products",
        json!({ "first": 5, "after": "bm9wZQ==" }),
        |_| {},
    )
    .await;
    assert_eq!(error, Error::InvalidCursor("bm9wZQ==".to_string()));
}
