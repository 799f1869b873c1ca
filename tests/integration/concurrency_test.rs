// tests/integration/concurrency_test.rs

//! Concurrent writers touching different bits of the same byte.
//!
//! The simulated device is switched to yield inside every byte read and write,
//! so each read-modify-write is suspended between its read and its write and
//! concurrent writers always interleave there.

use super::fixtures::write_line;
use super::test_helpers::{TestContext, TestServer};
use bitbridge::BridgeClient;
use std::sync::Arc;

async fn interleaving_context(marker_bytes: usize) -> Arc<TestContext> {
    let ctx = TestContext::new(marker_bytes).await;
    ctx.device.set_yield_on_io(true);
    Arc::new(ctx)
}

async fn set_all_bits_concurrently(ctx: &Arc<TestContext>) {
    let tasks: Vec<_> = (0..8u8)
        .map(|bit| {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.execute(&write_line(0, bit, true)).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), "OK");
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_interleaved_bit_writes_on_one_thread_are_not_lost() {
    let ctx = interleaving_context(1).await;
    set_all_bits_concurrently(&ctx).await;
    assert_eq!(ctx.byte(0), 0xFF);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bit_writes_on_same_byte_are_not_lost() {
    let ctx = interleaving_context(1).await;

    for _round in 0..50 {
        ctx.set_byte(0, 0);
        set_all_bits_concurrently(&ctx).await;
        assert_eq!(ctx.byte(0), 0xFF);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_set_and_clear_on_same_byte() {
    let ctx = interleaving_context(1).await;
    ctx.set_byte(0, 0b1111_0000);

    // Even bits are set, odd bits are cleared, concurrently and repeatedly.
    let tasks: Vec<_> = (0..8u8)
        .map(|bit| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    let value = bit % 2 == 0;
                    assert_eq!(ctx.execute(&write_line(0, bit, value)).await, "OK");
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(ctx.byte(0), 0b0101_0101);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_writes_to_different_bytes_do_not_interfere() {
    let ctx = interleaving_context(4).await;

    let tasks: Vec<_> = (0..4usize)
        .flat_map(|byte| (0..8u8).map(move |bit| (byte, bit)))
        .filter(|(byte, bit)| (*bit as usize + byte) % 2 == 0)
        .map(|(byte, bit)| {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.execute(&write_line(byte, bit, true)).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), "OK");
    }

    assert_eq!(ctx.byte(0), 0b0101_0101);
    assert_eq!(ctx.byte(1), 0b1010_1010);
    assert_eq!(ctx.byte(2), 0b0101_0101);
    assert_eq!(ctx.byte(3), 0b1010_1010);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_connections_write_different_bits() {
    let server = TestServer::start(1).await;
    server.device.set_yield_on_io(true);

    let mut handles = Vec::new();
    for bit in [2, 6] {
        let addr = server.addr;
        handles.push(tokio::spawn(async move {
            let mut client = BridgeClient::connect(addr).await.unwrap();
            for _ in 0..50 {
                client.write_bit("M", 0, bit, true).await.unwrap();
                client.write_bit("M", 0, bit, false).await.unwrap();
            }
            client.write_bit("M", 0, bit, true).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(server.device.peek("MarkerByte0"), Some(0b0100_0100));
    server.stop().await;
}
