// tests/property/roundtrip_test.rs

//! Write-then-read round trips through the full dispatcher.

use crate::test_helpers::TestContext;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_write_read_round_trip(
        initial in any::<u8>(),
        byte in 0usize..4,
        bit in 0u8..8,
        value in any::<bool>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new(4).await;
            ctx.set_byte(byte, initial);

            let write = format!("WRITE M {} {} {}", byte, bit, if value { "1" } else { "0" });
            assert_eq!(ctx.execute(&write).await, "OK");

            let read = ctx.execute(&format!("READ M {byte} {bit}")).await;
            assert_eq!(read, if value { "1" } else { "0" });

            let mask = 1u8 << bit;
            assert_eq!(ctx.byte(byte) & !mask, initial & !mask);
        });
    }

    #[test]
    fn test_writes_do_not_leak_into_neighbouring_bytes(
        bytes in prop::array::uniform4(any::<u8>()),
        target in 0usize..4,
        bit in 0u8..8,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new(4).await;
            for (offset, value) in bytes.iter().enumerate() {
                ctx.set_byte(offset, *value);
            }

            assert_eq!(ctx.execute(&format!("WRITE M {target} {bit} TRUE")).await, "OK");

            for (offset, value) in bytes.iter().enumerate() {
                if offset != target {
                    assert_eq!(ctx.byte(offset), *value);
                }
            }
        });
    }
}
