#![no_main]

use libfuzzer_sys::fuzz_target;

use parbench_core::partition::{block, blocks, interleaved};
use parbench_core::{Domain, ParError};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let n = u64::from(u16::from_le_bytes([data[0], data[1]]));
    let parts = usize::from(data[2]);
    let one_based = data[3] & 1 == 1;
    let domain = if one_based {
        Domain::one_based(n)
    } else {
        Domain::zero_based(n)
    };

    match blocks(domain, parts) {
        Ok(ranges) => {
            assert_eq!(ranges.len(), parts);
            assert_eq!(ranges.first().map(|r| r.lo), Some(domain.first()));
            assert!(ranges.windows(2).all(|w| w[0].hi == w[1].lo));
            assert_eq!(ranges.iter().map(|r| r.len()).sum::<u64>(), n);
        }
        Err(ParError::Zero(_)) => assert_eq!(parts, 0),
        Err(ParError::InvalidPartition { .. }) => assert_ne!(n % parts as u64, 0),
        Err(e) => panic!("unexpected error: {e}"),
    }

    if parts > 0 {
        let Ok(range) = domain.range() else {
            panic!("small domain rejected");
        };
        let covered: u64 = (0..parts)
            .map(|id| interleaved(range, id, parts).count() as u64)
            .sum();
        assert_eq!(covered, n);

        let owned: Vec<_> = (0..parts).map(|id| block(range, id, parts)).collect();
        assert_eq!(owned.first().map(|r| r.lo), Some(range.lo));
        assert_eq!(owned.last().map(|r| r.hi), Some(range.hi));
        assert!(owned.windows(2).all(|w| w[0].hi == w[1].lo));
    }
});
