#![no_main]
use libfuzzer_sys::fuzz_target;

// The CLI's pattern-file line parser must never panic on arbitrary text.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for line in text.lines().take(64) {
        dfc::cli::fuzz_try_parse_line(line);
    }

    let mut args = Vec::<String>::new();
    for token in text.split_whitespace().take(32) {
        args.push(token.to_string());
    }
    dfc::cli::fuzz_try_parse_args(&args);
});
