use anyhow::Context as _;
use openapi_mcp_test_support::{
    EMPTY_PATHS_JSON, MINIMAL_JSON, PETSTORE_OPERATIONS, PETSTORE_YAML, TEMPLATED_JSON,
};
use openapi_mcp_tools::{
    ConvertError, ConvertOptions, FieldLocation, OpenApiTranslator, generate_file_name,
};
use serde_json::Value;
use std::collections::HashSet;

fn embedded_tools(config_json: &str) -> anyhow::Result<Vec<Value>> {
    let config: Value = serde_json::from_str(config_json)?;
    let payload = config["args"][2]
        .as_str()
        .context("args[2] is the embedded payload")?;
    let payload: Value = serde_json::from_str(payload)?;
    payload["tools"]
        .as_array()
        .cloned()
        .context("payload.tools is an array")
}

#[test]
fn conversion_is_byte_identical_across_calls() -> anyhow::Result<()> {
    let options = ConvertOptions::new("petstore").with_tool_name_prefix("pets");
    let first = OpenApiTranslator::new().convert(PETSTORE_YAML, &options)?;
    let second = OpenApiTranslator::new().convert(PETSTORE_YAML, &options)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn json_and_yaml_inputs_convert_identically() -> anyhow::Result<()> {
    let yaml = r#"
openapi: "3.0.0"
info: {title: Minimal, version: "1"}
servers: [{url: "https://spec.example"}]
paths: {/ping: {get: {operationId: ping}}}
"#;
    let translator = OpenApiTranslator::new();
    let options = ConvertOptions::new("minimal");
    assert_eq!(
        translator.convert(MINIMAL_JSON, &options)?,
        translator.convert(yaml, &options)?
    );
    Ok(())
}

#[test]
fn every_operation_gets_a_distinct_tool_name() -> anyhow::Result<()> {
    let json = OpenApiTranslator::new().convert(PETSTORE_YAML, &ConvertOptions::new("petstore"))?;
    let tools = embedded_tools(&json)?;
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

    assert_eq!(names.len(), PETSTORE_OPERATIONS);
    assert_eq!(names.iter().collect::<HashSet<_>>().len(), PETSTORE_OPERATIONS);
    assert_eq!(
        names,
        vec![
            "addpet",
            "updatepet",
            "findpetsbystatus",
            "getpetbyid",
            "delete-pet-petid",
            "get-inventory",
            "get-inventory-2",
        ]
    );
    Ok(())
}

#[test]
fn prefix_is_applied_to_every_tool() -> anyhow::Result<()> {
    let options = ConvertOptions::new("petstore").with_tool_name_prefix("pets");
    let json = OpenApiTranslator::new().convert(PETSTORE_YAML, &options)?;
    let tools = embedded_tools(&json)?;
    assert!(
        tools
            .iter()
            .all(|t| t["name"].as_str().is_some_and(|n| n.starts_with("pets_")))
    );
    Ok(())
}

#[test]
fn missing_openapi_field_fails_validation() {
    let err = OpenApiTranslator::new()
        .validate(r#"{"info": {"title": "x"}, "paths": {}}"#)
        .unwrap_err();
    assert!(err.violations.iter().any(|v| v.contains("'openapi'")));
}

#[test]
fn empty_paths_validate_but_do_not_convert() {
    let translator = OpenApiTranslator::new();
    assert!(translator.validate(EMPTY_PATHS_JSON).is_ok());

    let err = translator
        .convert(EMPTY_PATHS_JSON, &ConvertOptions::new("empty"))
        .unwrap_err();
    assert!(matches!(err, ConvertError::NoPaths));
    assert!(!err.is_client_fault());
}

#[test]
fn malformed_documents_are_client_faults() {
    let err = OpenApiTranslator::new()
        .convert("openapi: 2.0\ninfo: {}\npaths: {}\n", &ConvertOptions::default())
        .unwrap_err();
    assert!(err.is_client_fault());
}

#[test]
fn base_url_override_beats_declared_server() -> anyhow::Result<()> {
    let translator = OpenApiTranslator::new();

    let json = translator.convert(
        MINIMAL_JSON,
        &ConvertOptions::new("m").with_base_url("https://override.example"),
    )?;
    let tools = embedded_tools(&json)?;
    assert_eq!(tools[0]["baseUrl"], "https://override.example");

    let json = translator.convert(MINIMAL_JSON, &ConvertOptions::new("m"))?;
    let tools = embedded_tools(&json)?;
    assert_eq!(tools[0]["baseUrl"], "https://spec.example");

    let no_servers = MINIMAL_JSON.replace(r#""servers": [{"url": "https://spec.example"}],"#, "");
    let err = translator
        .convert(&no_servers, &ConvertOptions::new("m"))
        .unwrap_err();
    assert!(matches!(err, ConvertError::NoBaseUrl));
    Ok(())
}

#[test]
fn template_variables_pass_through_verbatim() -> anyhow::Result<()> {
    let conversion =
        OpenApiTranslator::new().convert_detailed(TEMPLATED_JSON, &ConvertOptions::new("weather"))?;

    let names: Vec<&str> = conversion
        .required_variables
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(names, vec!["WEATHER_BASE_URL", "API_KEY"]);
    assert!(conversion.needs_variables());

    assert!(conversion.config_json.contains("{{ .API_KEY }}"));
    assert_eq!(conversion.config.env["API_KEY"], "{{ .API_KEY }}");

    let tools = embedded_tools(&conversion.config_json)?;
    assert_eq!(tools[0]["baseUrl"], "{{ .WEATHER_BASE_URL }}");
    assert_eq!(
        tools[0]["inputSchema"]["X-Api-Key"]["default"],
        "{{ .API_KEY }}"
    );
    Ok(())
}

#[test]
fn petstore_mapping_details() -> anyhow::Result<()> {
    let conversion =
        OpenApiTranslator::new().convert_detailed(PETSTORE_YAML, &ConvertOptions::new("petstore"))?;
    assert_eq!(conversion.config.description, "A sample pet store API");

    assert_eq!(conversion.warnings.len(), 1);
    let warning = &conversion.warnings[0];
    assert_eq!(warning.tool, "delete-pet-petid");
    assert_eq!(warning.field, "filter");
    assert_eq!(warning.location, Some(FieldLocation::Query));

    let tools = embedded_tools(&conversion.config_json)?;
    let add_pet = &tools[0]["inputSchema"]["body"];
    assert_eq!(add_pet["in"], "body");
    assert_eq!(add_pet["required"], true);
    assert_eq!(add_pet["properties"]["name"]["required"], true);
    assert_eq!(add_pet["properties"]["tags"]["type"], "array");

    let find = &tools[2]["inputSchema"];
    assert_eq!(find["limit"]["type"], "integer");
    assert_eq!(find["limit"]["default"], 20);

    let get_by_id = &tools[3];
    assert_eq!(get_by_id["inputSchema"]["petId"]["required"], true);
    assert_eq!(get_by_id["security"], serde_json::json!(["api_key"]));

    let delete = &tools[4];
    assert_eq!(delete["description"], "Deletes a pet");
    assert_eq!(delete["security"], serde_json::json!([]));
    assert_eq!(delete["inputSchema"]["filter"]["type"], "object");
    Ok(())
}

#[test]
fn spec_file_reference_mode_points_at_the_file() -> anyhow::Result<()> {
    let options = ConvertOptions::new("petstore")
        .with_spec_file_path("environments/default/petstore.openapi.json");
    let conversion = OpenApiTranslator::new().convert_detailed(PETSTORE_YAML, &options)?;

    assert_eq!(
        conversion.config.args,
        vec![
            "openapi-runtime",
            "--config-path",
            "environments/default/petstore.openapi.json",
            "--base-url",
            "https://petstore.example/api/v3",
        ]
    );
    assert!(!conversion.config_json.contains("addpet"));
    Ok(())
}

#[test]
fn generated_file_name_is_sanitized() {
    assert_eq!(generate_file_name("My Server!"), "my-server-openapi-mcp.json");
}

#[test]
fn placeholders_in_non_string_defaults_pass_through() -> anyhow::Result<()> {
    let spec = r#"{
  "openapi": "3.0.0",
  "info": {"title": "Ports", "version": "1"},
  "servers": [{"url": "https://ports.example"}],
  "paths": {"/listen": {"get": {"operationId": "listen", "parameters": [
    {"name": "port", "in": "query", "schema": {"type": "integer", "default": "{{ .PORT }}"}}
  ]}}}
}"#;
    let conversion =
        OpenApiTranslator::new().convert_detailed(spec, &ConvertOptions::new("ports"))?;

    let names: Vec<&str> = conversion
        .required_variables
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(names, vec!["PORT"]);
    assert!(conversion.warnings.is_empty());
    assert!(conversion.config_json.contains("{{ .PORT }}"));

    let tools = embedded_tools(&conversion.config_json)?;
    let port = &tools[0]["inputSchema"]["port"];
    assert_eq!(port["type"], "integer");
    assert_eq!(port["default"], "{{ .PORT }}");
    Ok(())
}
