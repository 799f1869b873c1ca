// tests/integration/protocol_test.rs

//! Request/response behavior of the command protocol, without sockets.

use super::fixtures::*;
use super::test_helpers::TestContext;
use bitbridge::core::backend::OperatingState;

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let ctx = TestContext::new(2).await;

    assert_eq!(ctx.execute("WRITE M 0 0 1").await, "OK");
    assert_eq!(ctx.execute("READ M 0 0").await, "1");
    assert_eq!(ctx.byte(0), 0b0000_0001);

    assert_eq!(ctx.execute("WRITE M 0 0 0").await, "OK");
    assert_eq!(ctx.execute("READ M 0 0").await, "0");
    assert_eq!(ctx.byte(0), 0);
}

#[tokio::test]
async fn test_write_preserves_other_bits() {
    let ctx = TestContext::new(1).await;
    ctx.set_byte(0, 0b1010_0101);

    assert_eq!(ctx.execute("WRITE M 0 1 TRUE").await, "OK");
    assert_eq!(ctx.byte(0), 0b1010_0111);

    assert_eq!(ctx.execute("WRITE M 0 7 false").await, "OK");
    assert_eq!(ctx.byte(0), 0b0010_0111);
}

#[tokio::test]
async fn test_read_reports_existing_bits() {
    let ctx = TestContext::new(1).await;
    ctx.set_byte(0, 0b1000_0010);

    let bits: Vec<String> = futures::future::join_all((0..8).map(|bit| {
        let line = format!("READ M 0 {bit}");
        let ctx = &ctx;
        async move { ctx.execute(&line).await }
    }))
    .await;
    assert_eq!(bits, vec!["0", "1", "0", "0", "0", "0", "0", "1"]);
}

#[tokio::test]
async fn test_keywords_are_case_insensitive() {
    let ctx = TestContext::new(1).await;
    assert_eq!(ctx.execute("write m 0 4 true").await, "OK");
    assert_eq!(ctx.execute("Read M 0 4").await, "1");
}

#[tokio::test]
async fn test_unrecognized_value_clears_bit() {
    let ctx = TestContext::new(1).await;
    ctx.set_byte(0, 0xFF);
    assert_eq!(ctx.execute("WRITE M 0 2 on").await, "OK");
    assert_eq!(ctx.byte(0), 0b1111_1011);
}

#[tokio::test]
async fn test_unmapped_address() {
    let ctx = TestContext::new(2).await;
    assert_eq!(
        ctx.execute("READ M 999 0").await,
        "ERROR: No tag mapped for %MB999"
    );
    assert_eq!(
        ctx.execute("WRITE M 2 0 1").await,
        "ERROR: No tag mapped for %MB2"
    );
    assert_eq!(
        ctx.execute("READ M -1 0").await,
        "ERROR: No tag mapped for %MB-1"
    );
}

#[tokio::test]
async fn test_other_areas_are_never_mapped() {
    let ctx = TestContext::new(2).await;
    assert_eq!(
        ctx.execute("READ q 0 0").await,
        "ERROR: No tag mapped for %QB0"
    );
    assert_eq!(
        ctx.execute("WRITE DB 1 0 1").await,
        "ERROR: No tag mapped for %DBB1"
    );
}

#[tokio::test]
async fn test_bit_offset_out_of_range() {
    let ctx = TestContext::new(1).await;
    assert_eq!(
        ctx.execute("READ M 0 8").await,
        "ERROR: Bit offset must be 0-7, got 8"
    );
    assert_eq!(
        ctx.execute("WRITE M 0 -1 1").await,
        "ERROR: Bit offset must be 0-7, got -1"
    );
}

#[tokio::test]
async fn test_bit_offset_is_checked_before_mapping() {
    let ctx = TestContext::new(1).await;
    assert_eq!(
        ctx.execute("READ M 999 8").await,
        "ERROR: Bit offset must be 0-7, got 8"
    );
}

#[tokio::test]
async fn test_malformed_commands() {
    let ctx = TestContext::new(1).await;
    assert_eq!(ctx.execute("READ M 0").await, FORMAT_ERROR);
    assert_eq!(ctx.execute("").await, FORMAT_ERROR);
    assert_eq!(ctx.execute("FOO M 0 0").await, UNKNOWN_COMMAND);
    assert_eq!(ctx.execute("WRITE M 0 0").await, UNKNOWN_COMMAND);
    assert_eq!(ctx.execute("READ M x 0").await, NUMBER_ERROR);
    assert_eq!(ctx.execute("WRITE M 0 1.5 1").await, NUMBER_ERROR);
    assert_eq!(ctx.execute("READ M 99999999999 0").await, NUMBER_ERROR);
}

#[tokio::test]
async fn test_backend_failure_is_reported() {
    let ctx = TestContext::new(1).await;
    ctx.device.set_operating_state(OperatingState::Off);
    assert_eq!(
        ctx.execute("READ M 0 0").await,
        "ERROR: Instance 'TestPlant' is powered off"
    );
    assert_eq!(
        ctx.execute(&write_line(0, 0, true)).await,
        "ERROR: Instance 'TestPlant' is powered off"
    );

    ctx.device.set_operating_state(OperatingState::Run);
    assert_eq!(ctx.execute(&write_line(0, 0, true)).await, "OK");
}

#[tokio::test]
async fn test_empty_directory_maps_nothing() {
    let ctx = TestContext::new(0).await;
    assert!(ctx.state.directory().is_empty());
    assert_eq!(
        ctx.execute("READ M 0 0").await,
        "ERROR: No tag mapped for %MB0"
    );
}
