//! Broker/market routing scenarios over real sockets

use std::time::Duration;

use anyhow::Result;
use router_core::PeerType;
use router_e2e_tests::{
    fill, forwarded, malformed, order, order_with_checksum, order_without_target, TestRouter,
};

#[tokio::test]
async fn test_order_is_forwarded_with_provenance() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;
    assert_eq!(broker.id(), "100001");
    assert_eq!(market.id(), "200001");

    let raw = order("100001", "200001", 100);
    assert_eq!(raw, "49=100001|56=200001|35=D|55=AAPL|54=1|38=100|10=061|");
    broker.send(&raw).await?;

    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));
    broker.expect_silence(Duration::from_millis(200)).await?;

    let stats = router.stop().await?;
    assert_eq!(stats.messages_forwarded, 1);
    assert_eq!(stats.messages_rejected, 0);
    Ok(())
}

#[tokio::test]
async fn test_execution_report_flows_back_to_broker() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    broker.send(&order(broker.id(), market.id(), 10)).await?;
    market.read_line().await?;

    let report = fill(market.id(), broker.id());
    market.send(&report).await?;
    assert_eq!(broker.read_line().await?, forwarded("200001", "100001", &report));
    Ok(())
}

#[tokio::test]
async fn test_missing_target_keeps_connection_open() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    broker.send(&order_without_target("100001")).await?;
    let notice = broker.read_line().await?;
    assert!(notice.starts_with("ERROR|"), "{}", notice);
    assert!(notice.contains("Missing TargetCompID (tag 56)"), "{}", notice);

    let raw = order("100001", "200001", 7);
    broker.send(&raw).await?;
    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));
    assert_eq!(router.handle()?.count_by_type(PeerType::Broker), 1);
    Ok(())
}

#[tokio::test]
async fn test_bad_checksum_rejected_before_routing() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    broker.send(&order_with_checksum("100001", "200001", "999")).await?;
    assert_eq!(
        broker.read_line().await?,
        "ERROR|Invalid message checksum: received 999, calculated 061 (error 1/5)|"
    );
    market.expect_silence(Duration::from_millis(200)).await?;
    Ok(())
}

#[tokio::test]
async fn test_five_strikes_closes_connection() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;

    for strike in 1..=4 {
        broker.send(&malformed("100001")).await?;
        let notice = broker.read_line().await?;
        assert!(notice.ends_with(&format!("(error {}/5)|", strike)), "{}", notice);
    }

    broker.send(&malformed("100001")).await?;
    let last = broker.read_line().await?;
    assert_eq!(
        last,
        "ERROR|Incomplete message: missing checksum (tag 10) (error limit reached: 5/5)|"
    );

    // the sixth message gets no answer; the router has hung up
    let _ = broker.send(&malformed("100001")).await;
    assert!(broker.expect_closed().await?.is_empty());

    router.wait_for_count(PeerType::Broker, 0).await?;
    Ok(())
}

#[tokio::test]
async fn test_valid_message_resets_strike_count() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    for _ in 0..3 {
        broker.send(&malformed("100001")).await?;
        broker.read_line().await?;
    }
    broker.send(&order("100001", "200001", 1)).await?;
    market.read_line().await?;

    broker.send(&malformed("100001")).await?;
    assert!(broker.read_line().await?.ends_with("(error 1/5)|"));
    Ok(())
}

#[tokio::test]
async fn test_unknown_destination_then_retry() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;

    let raw = order("100001", "200001", 50);
    broker.send(&raw).await?;
    assert_eq!(broker.read_line().await?, "ERROR|Destination not found: 200001|");

    let mut market = router.connect_market().await?;
    assert_eq!(market.id(), "200001");

    broker.send(&raw).await?;
    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));
    Ok(())
}

#[tokio::test]
async fn test_self_addressed_message_rejected() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;

    broker.send(&order("100001", "100001", 5)).await?;
    assert_eq!(broker.read_line().await?, "ERROR|Cannot send message to self|");
    broker.expect_silence(Duration::from_millis(100)).await?;
    Ok(())
}

#[tokio::test]
async fn test_two_messages_in_one_write() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    let first = order("100001", "200001", 1);
    let second = order("100001", "200001", 2);
    broker.send_raw(format!("{}{}\n", first, second).as_bytes()).await?;

    let mut received = vec![market.read_line().await?, market.read_line().await?];
    received.sort();
    let mut expected = vec![
        forwarded("100001", "200001", &first),
        forwarded("100001", "200001", &second),
    ];
    expected.sort();
    assert_eq!(received, expected);
    Ok(())
}

#[tokio::test]
async fn test_bytes_after_last_delimiter_wait_for_more_input() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    let raw = order("100001", "200001", 3);
    let (head, tail) = raw.split_at(5);
    assert!(!head.contains('|'));
    broker.send_raw(head.as_bytes()).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    broker.send_raw(tail.as_bytes()).await?;

    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));
    Ok(())
}

#[tokio::test]
async fn test_five_strikes_without_newlines() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;

    for strike in 1..=4 {
        broker.send_raw(malformed("100001").as_bytes()).await?;
        let notice = broker.read_line().await?;
        assert_eq!(
            notice,
            format!("ERROR|Incomplete message: missing checksum (tag 10) (error {}/5)|", strike)
        );
    }

    broker.send_raw(malformed("100001").as_bytes()).await?;
    assert!(broker.read_line().await?.ends_with("(error limit reached: 5/5)|"));
    assert!(broker.expect_closed().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rejected_fragment_does_not_spoil_next_order() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    broker.send_raw(malformed("100001").as_bytes()).await?;
    assert!(broker.read_line().await?.ends_with("(error 1/5)|"));

    let raw = order("100001", "200001", 5);
    broker.send_raw(raw.as_bytes()).await?;
    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));
    broker.expect_silence(Duration::from_millis(200)).await?;
    Ok(())
}

#[tokio::test]
async fn test_garbage_after_checksum_rejected_on_its_own() -> Result<()> {
    let router = TestRouter::start()?;
    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    let raw = order("100001", "200001", 9);
    broker.send_raw(format!("{}junk|", raw).as_bytes()).await?;
    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &raw));
    assert_eq!(
        broker.read_line().await?,
        "ERROR|Incomplete message: missing checksum (tag 10) (error 1/5)|"
    );

    let next = order("100001", "200001", 10);
    broker.send_raw(next.as_bytes()).await?;
    assert_eq!(market.read_line().await?, forwarded("100001", "200001", &next));
    Ok(())
}
