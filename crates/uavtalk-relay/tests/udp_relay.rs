// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end relay over loopback UDP sockets.

use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use uavtalk::{Frame, FrameType, RejectReason};
use uavtalk_relay::{load_registry, Peer, Relay, RelayConfig, RelayError, RelayHandle};

const TEST_ID: u32 = 0x6F6E_B07A;
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

const TEST_OBJECT: &str = r#"<xml>
    <object name="Test" singleinstance="true" settings="false">
        <description>Relay test object.</description>
        <field name="A" type="uint8"/>
    </object>
</xml>
"#;

struct Bench {
    _defs: TempDir,
    gcs: UdpSocket,
    fc: UdpSocket,
    relay_gcs: SocketAddr,
    relay_fc: SocketAddr,
    handle: RelayHandle,
    task: tokio::task::JoinHandle<Result<(), RelayError>>,
}

async fn start(forward_unknown: bool) -> Bench {
    let defs = TempDir::new().unwrap();
    std::fs::write(defs.path().join("test.xml"), TEST_OBJECT).unwrap();

    let gcs = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let fc = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let config = RelayConfig::local(any, any)
        .definitions(defs.path())
        .fc_address(fc.local_addr().unwrap())
        .forward_unknown(forward_unknown);

    let (registry, report) = load_registry(&config).unwrap();
    assert_eq!(report.registered.len(), 1);

    let relay = Relay::bind(config, Arc::new(RwLock::new(registry)))
        .await
        .unwrap();
    let relay_gcs = relay.local_addr(Peer::Gcs).unwrap();
    let relay_fc = relay.local_addr(Peer::Fc).unwrap();
    let handle = relay.handle();
    let task = tokio::spawn(relay.run());

    Bench {
        _defs: defs,
        gcs,
        fc,
        relay_gcs,
        relay_fc,
        handle,
        task,
    }
}

async fn recv(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = [0u8; 512];
    let (len, _) = timeout(RECV_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("datagram within timeout")
        .unwrap();
    buf[..len].to_vec()
}

fn frame(object_id: u32, data: Vec<u8>) -> Vec<u8> {
    Frame::new(FrameType::Object, object_id, 0, data)
        .encode()
        .unwrap()
}

#[tokio::test]
async fn test_gcs_frame_reaches_fc_and_updates_registry() {
    let bench = start(true).await;
    let bytes = frame(TEST_ID, vec![0x2A]);

    bench.gcs.send_to(&bytes, bench.relay_gcs).await.unwrap();
    assert_eq!(recv(&bench.fc).await, bytes);

    {
        let registry = bench.handle.registry().read();
        assert_eq!(registry.instance(TEST_ID, 0).unwrap().payload, [0x2A]);
    }

    let [gcs, fc] = bench.handle.stats();
    assert!(gcs.connected);
    assert_eq!(gcs.forwarded, 1);
    assert_eq!(gcs.bytes_forwarded, bytes.len() as u64);
    assert_eq!(fc.received, 0);

    bench.handle.stop();
    bench.task.await.unwrap().unwrap();
    assert!(!bench.handle.is_running());
}

#[tokio::test]
async fn test_fc_reply_reaches_learned_gcs() {
    let bench = start(true).await;

    // The GCS address is only known once it has sent a valid frame.
    let hello = frame(TEST_ID, vec![1]);
    bench.gcs.send_to(&hello, bench.relay_gcs).await.unwrap();
    assert_eq!(recv(&bench.fc).await, hello);

    let reply = frame(TEST_ID | 1, vec![0; 8]);
    bench.fc.send_to(&reply, bench.relay_fc).await.unwrap();
    assert_eq!(recv(&bench.gcs).await, reply);

    let [_, fc] = bench.handle.stats();
    assert!(fc.connected);
    assert_eq!(fc.forwarded, 1);

    bench.handle.stop();
    bench.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_invalid_datagrams_are_dropped() {
    let bench = start(true).await;

    let mut corrupt = frame(TEST_ID, vec![5]);
    let last = corrupt.len() - 1;
    corrupt[last] ^= 0x55;
    let valid = frame(TEST_ID, vec![6]);

    bench.gcs.send_to(b"hello", bench.relay_gcs).await.unwrap();
    bench.gcs.send_to(&corrupt, bench.relay_gcs).await.unwrap();
    bench.gcs.send_to(&valid, bench.relay_gcs).await.unwrap();

    // Only the valid frame makes it through.
    assert_eq!(recv(&bench.fc).await, valid);

    let [gcs, _] = bench.handle.stats();
    assert_eq!(gcs.received, 3);
    assert_eq!(gcs.rejected_for(RejectReason::TruncatedHeader), 1);
    assert_eq!(gcs.rejected_for(RejectReason::ChecksumMismatch), 1);
    assert_eq!(gcs.forwarded, 1);
    assert_eq!(
        bench.handle.registry().read().instance(TEST_ID, 0).unwrap().payload,
        [6]
    );

    bench.handle.stop();
    bench.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_objects_follow_policy() {
    let unknown = frame(0x0BAD_F00D & !1, vec![1, 2, 3]);
    let known = frame(TEST_ID, vec![9]);

    let forwarding = start(true).await;
    forwarding
        .gcs
        .send_to(&unknown, forwarding.relay_gcs)
        .await
        .unwrap();
    assert_eq!(recv(&forwarding.fc).await, unknown);
    assert_eq!(forwarding.handle.registry().read().instance_count(TEST_ID), 0);
    forwarding.handle.stop();

    let dropping = start(false).await;
    dropping
        .gcs
        .send_to(&unknown, dropping.relay_gcs)
        .await
        .unwrap();
    dropping.gcs.send_to(&known, dropping.relay_gcs).await.unwrap();
    assert_eq!(recv(&dropping.fc).await, known);

    let [gcs, _] = dropping.handle.stats();
    assert_eq!(gcs.unknown_objects, 1);
    assert_eq!(gcs.filtered, 1);
    dropping.handle.stop();

    forwarding.task.await.unwrap().unwrap();
    dropping.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_send_failure_stops_relay() {
    let defs = TempDir::new().unwrap();
    std::fs::write(defs.path().join("test.xml"), TEST_OBJECT).unwrap();
    let gcs = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // An IPv6 destination cannot be reached from the IPv4 FC socket.
    let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let config = RelayConfig::local(any, any)
        .definitions(defs.path())
        .fc_address("[::1]:9".parse().unwrap());
    assert!(config.validate().is_ok());

    let (registry, _) = load_registry(&config).unwrap();
    let relay = Relay::bind(config, Arc::new(RwLock::new(registry)))
        .await
        .unwrap();
    let relay_gcs = relay.local_addr(Peer::Gcs).unwrap();
    let handle = relay.handle();
    let task = tokio::spawn(relay.run());

    gcs.send_to(&frame(TEST_ID, vec![1]), relay_gcs)
        .await
        .unwrap();

    let result = timeout(RECV_TIMEOUT, task)
        .await
        .expect("relay stops within timeout")
        .unwrap();
    assert!(matches!(
        result,
        Err(RelayError::Socket { peer: Peer::Fc, .. })
    ));
    assert!(!handle.is_running());

    let [gcs_stats, _] = handle.stats();
    assert_eq!(gcs_stats.received, 1);
    assert_eq!(gcs_stats.forwarded, 0);
}
