#![no_main]

use fode_integrate::IntegrateOptions;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(options) = IntegrateOptions::from_json(text) {
        let json = serde_json::to_string(&options).expect("options serialize");
        let _ = IntegrateOptions::from_json(&json);
    }
});
