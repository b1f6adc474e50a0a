//! Identifier assignment, disconnects, security closes and shutdown

use std::time::Duration;

use anyhow::Result;
use router_core::PeerType;
use router_e2e_tests::{order, TestRouter};

#[tokio::test]
async fn test_identifiers_increase_per_peer_type() -> Result<()> {
    let router = TestRouter::start()?;

    let b1 = router.connect_broker().await?;
    let b2 = router.connect_broker().await?;
    let m1 = router.connect_market().await?;
    let b3 = router.connect_broker().await?;

    assert_eq!(b1.id(), "100001");
    assert_eq!(b2.id(), "100002");
    assert_eq!(m1.id(), "200001");
    assert_eq!(b3.id(), "100003");

    router.wait_for_count(PeerType::Broker, 3).await?;
    router.wait_for_count(PeerType::Market, 1).await?;
    assert_eq!(router.handle()?.connection_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_disconnect_unregisters_and_ids_are_not_reused() -> Result<()> {
    let router = TestRouter::start()?;

    let market = router.connect_market().await?;
    assert_eq!(market.id(), "200001");
    drop(market);
    router.wait_for_count(PeerType::Market, 0).await?;
    assert!(!router.handle()?.manager().routing().has_route("200001"));

    let mut broker = router.connect_broker().await?;
    broker.send(&order("100001", "200001", 1)).await?;
    assert_eq!(broker.read_line().await?, "ERROR|Destination not found: 200001|");

    let market = router.connect_market().await?;
    assert_eq!(market.id(), "200002");
    Ok(())
}

#[tokio::test]
async fn test_spoofed_sender_is_disconnected() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    broker.send(&order("100999", "200001", 1)).await?;
    let lines = broker.expect_closed().await?;
    assert_eq!(
        lines,
        vec!["ERROR|SenderCompID (100999) does not match connection ID (100001)|".to_string()]
    );

    market.expect_silence(Duration::from_millis(200)).await?;
    router.wait_for_count(PeerType::Broker, 0).await?;
    Ok(())
}

#[tokio::test]
async fn test_sender_check_can_be_disabled() -> Result<()> {
    let mut config = TestRouter::test_config();
    config.pipeline.verify_sender = false;
    let router = TestRouter::start_with(config, router_config::FixSchema::builtin()?)?;

    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    let raw = order("100999", "200001", 1);
    broker.send(&raw).await?;
    assert_eq!(market.read_line().await?, format!("[100001 → 200001] {}", raw));
    Ok(())
}

#[tokio::test]
async fn test_stop_closes_every_client() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;
    router.wait_for_count(PeerType::Market, 1).await?;

    let stats = router.stop().await?;
    assert_eq!(stats.connections_accepted, 2);
    assert_eq!(stats.connections_closed, 2);

    assert!(broker.expect_closed().await?.is_empty());
    assert!(market.expect_closed().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_id_ceiling_rejects_extra_connections() -> Result<()> {
    let mut config = TestRouter::test_config();
    config.limits.id_ceiling = 2;
    let router = TestRouter::start_with(config, router_config::FixSchema::builtin()?)?;

    let _b1 = router.connect_broker().await?;
    let _b2 = router.connect_broker().await?;
    assert!(router.connect_broker().await.is_err());

    // markets have their own counter
    let market = router.connect_market().await?;
    assert_eq!(market.id(), "200001");
    router.wait_for_count(PeerType::Broker, 2).await?;
    Ok(())
}
