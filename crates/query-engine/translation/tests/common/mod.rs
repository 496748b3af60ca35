//! Shared helpers for the translation tests.

use std::fs;
use std::path::PathBuf;

use filter_compiler_configuration::{
    make_runtime_configuration, parse_configuration, CompilerSettings, Configuration,
};
use query_engine_sql::sql;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::query::{translate_collection, CompiledQuery};
use query_engine_translation::translation::request::QueryRequest;

const GOLDENFILES: &str = "tests/goldenfiles";

/// The configuration every test runs against, with its settings adjusted.
pub async fn configuration(
    adjust: impl FnOnce(&mut CompilerSettings),
) -> anyhow::Result<Configuration> {
    let mut parsed = parse_configuration(GOLDENFILES).await?;
    adjust(&mut parsed.settings);
    Ok(make_runtime_configuration(parsed)?)
}

/// Read the request of a named test case.
pub fn read_request(testname: &str) -> anyhow::Result<QueryRequest> {
    let path = PathBuf::from(GOLDENFILES).join(testname).join("request.json");
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Compile a named test case against a collection with the default settings.
pub async fn test_translation(collection: &str, testname: &str) -> anyhow::Result<sql::string::SQL> {
    test_translation_with(collection, testname, |_| {}).await
}

/// Compile a named test case against a collection with adjusted settings.
pub async fn test_translation_with(
    collection: &str,
    testname: &str,
    adjust: impl FnOnce(&mut CompilerSettings),
) -> anyhow::Result<sql::string::SQL> {
    Ok(compile(collection, testname, adjust).await?.statement())
}

/// Compile a named test case, keeping the whole compiled query.
pub async fn compile(
    collection: &str,
    testname: &str,
    adjust: impl FnOnce(&mut CompilerSettings),
) -> anyhow::Result<CompiledQuery> {
    let configuration = configuration(adjust).await?;
    let request = read_request(testname)?;
    Ok(translate_collection(&configuration, collection, &request)?)
}

/// Compile an inline request that is expected to fail.
pub async fn translation_error(
    collection: &str,
    request: serde_json::Value,
    adjust: impl FnOnce(&mut CompilerSettings),
) -> Error {
    let configuration = configuration(adjust).await.unwrap();
    let request: QueryRequest = serde_json::from_value(request).unwrap();
    translate_collection(&configuration, collection, &request).unwrap_err()
}

/// Parameters as JSON, for compact assertions.
pub fn params(statement: &sql::string::SQL) -> serde_json::Value {
    serde_json::to_value(&statement.params).unwrap()
}
