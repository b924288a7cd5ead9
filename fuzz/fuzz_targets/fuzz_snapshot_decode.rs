#![no_main]

use findex::config::PathMode;
use findex::index::reader::decode_snapshot;
use findex::utils::PathResolver;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Corrupt input must be rejected, not panic
    let resolver = PathResolver::new("/fuzz", PathMode::Relative);
    let _ = decode_snapshot(data, &resolver);
});
