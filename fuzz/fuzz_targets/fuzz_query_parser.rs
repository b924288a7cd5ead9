#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any input compiles to exactly one tree or a syntax error, never a panic
    let _ = findex::query::compile(data);
});
