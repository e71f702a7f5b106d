#![no_main]

use libfuzzer_sys::fuzz_target;
use montage_engine::project::fuzz_parse_snapshot;

fuzz_target!(|data: &[u8]| {
    fuzz_parse_snapshot(data);
});
