//! Router started from configuration and schema files on disk

use std::fs;

use anyhow::Result;
use codec::WireMessageBuilder;
use router_config::{FixSchema, RouterConfig};
use router_e2e_tests::{forwarded, TestClient, TestRouter};
use tempfile::tempdir;

const BUNDLED_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../libs/config/schemas/fix_schema.toml"
));

#[tokio::test]
async fn test_comma_delimited_router_from_files() -> Result<()> {
    let dir = tempdir()?;

    let schema_path = dir.path().join("comma_schema.toml");
    fs::write(&schema_path, BUNDLED_SCHEMA.replace("delimiter = \"|\"", "delimiter = \",\""))?;

    let config_path = dir.path().join("router.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[server]
bind_address = "127.0.0.1"
broker_port = 0
market_port = 0
poll_timeout_ms = 50

[limits]
max_consecutive_errors = 2

[schema]
path = "{}"
"#,
            schema_path.display().to_string().replace('\\', "/")
        ),
    )?;

    let config = RouterConfig::load(Some(&config_path))?;
    assert_eq!(config.limits.max_consecutive_errors, 2);
    let schema = FixSchema::from_file(config.schema.path.as_ref().expect("schema path"))?;
    assert_eq!(schema.delimiter(), ',');

    let router = TestRouter::start_with(config, schema)?;
    let mut broker = TestClient::connect(router.broker_addr()?, ',').await?;
    let mut market = TestClient::connect(router.market_addr()?, ',').await?;
    assert_eq!(broker.id(), "100001");
    assert_eq!(market.id(), "200001");

    let raw = WireMessageBuilder::new(',')
        .sender("100001")
        .target("200001")
        .msg_type("D")
        .field("55", "IBM")
        .field("54", "2")
        .field("38", "40")
        .build()
        .serialize();
    broker.send(&raw).await?;
    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));

    broker.send("49=100001,35=D,").await?;
    assert!(broker.read_line().await?.ends_with("(error 1/2)|"));
    broker.send("49=100001,35=D,").await?;
    assert!(broker.read_line().await?.ends_with("(error limit reached: 2/2)|"));
    assert!(broker.expect_closed().await?.is_empty());
    Ok(())
}

#[test]
fn test_invalid_config_file_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let config_path = dir.path().join("router.toml");
    fs::write(&config_path, "[pipeline]\nworker_threads = 0\n")?;

    let err = RouterConfig::load(Some(&config_path)).unwrap_err();
    assert!(format!("{:#}", err).contains("worker_threads"));
    Ok(())
}
