//! Messages from one broker all arrive, in whatever order the workers finish

use std::collections::BTreeSet;

use anyhow::Result;
use router_core::PeerType;
use router_e2e_tests::{forwarded, order, TestRouter};

const BURST: u64 = 200;

#[tokio::test]
async fn test_burst_from_one_broker_arrives_complete() -> Result<()> {
    let mut config = TestRouter::test_config();
    config.pipeline.worker_threads = 4;
    config.pipeline.queue_capacity = BURST as usize;
    let router = TestRouter::start_with(config, router_config::FixSchema::builtin()?)?;

    let mut broker = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    let messages: Vec<String> = (1..=BURST).map(|qty| order("100001", "200001", qty)).collect();
    let burst: String = messages.iter().map(|m| format!("{}\n", m)).collect();
    broker.send_raw(burst.as_bytes()).await?;

    let mut received = BTreeSet::new();
    for _ in 0..BURST {
        received.insert(market.read_line().await?);
    }

    let expected: BTreeSet<String> = messages
        .iter()
        .map(|raw| forwarded("100001", "200001", raw))
        .collect();
    assert_eq!(received, expected);

    router.wait_for_count(PeerType::Broker, 1).await?;
    let stats = router.stop().await?;
    assert_eq!(stats.messages_received, BURST);
    assert_eq!(stats.messages_forwarded, BURST);
    assert_eq!(stats.messages_dropped_busy, 0);
    Ok(())
}

#[tokio::test]
async fn test_two_brokers_share_one_market() -> Result<()> {
    let router = TestRouter::start()?;
    let mut b1 = router.connect_broker().await?;
    let mut b2 = router.connect_broker().await?;
    let mut market = router.connect_market().await?;

    let from_b1 = order(b1.id(), market.id(), 11);
    let from_b2 = order(b2.id(), market.id(), 22);
    let (r1, r2) = tokio::join!(b1.send(&from_b1), b2.send(&from_b2));
    r1?;
    r2?;

    let received: BTreeSet<String> = [market.read_line().await?, market.read_line().await?].into();
    let expected: BTreeSet<String> = [
        forwarded("100001", "200001", &from_b1),
        forwarded("100002", "200001", &from_b2),
    ]
    .into();
    assert_eq!(received, expected);
    Ok(())
}
