#![no_main]

use libfuzzer_sys::fuzz_target;

use parbench_core::{parallel_quicksort, quicksort};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // First byte picks the cutoff, second the worker count; the rest is input.
    let cutoff = usize::from(data[0]).max(1);
    let workers = usize::from(data[1] % 8) + 1;
    let input = &data[2..];

    let mut expected = input.to_vec();
    expected.sort_unstable();

    let mut seq = input.to_vec();
    quicksort(&mut seq);
    assert_eq!(seq, expected, "sequential quicksort");

    let mut par = input.to_vec();
    let report = parallel_quicksort(&mut par, workers, cutoff).unwrap();
    assert_eq!(par, expected, "parallel quicksort, cutoff={cutoff}");
    if let Some(smallest) = report.stats.smallest_spawned {
        assert!(smallest > cutoff as u64, "spawned {smallest} <= cutoff {cutoff}");
    }
});
