#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let total = text.chars().count();

    let tokens = findex::utils::tokenize(&text);
    for token in &tokens {
        assert!((token.offset as usize) < total);
    }

    for offset in [0, total / 2, total] {
        let chunk = findex::chunk::extract("fuzz", &text, offset, 100, 900).unwrap();
        assert_eq!(chunk.text.chars().count(), chunk.end - chunk.start);
    }
});
