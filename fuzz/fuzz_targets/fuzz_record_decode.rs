#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Stored values and request bodies must never panic on malformed input.
    let _ = bincode::deserialize::<sv_types::StudentRecord>(data);
    let _ = bincode::deserialize::<sv_types::OtpChallenge>(data);
    let _ = bincode::deserialize::<sv_types::ChangeLogEntry>(data);
    let _ = serde_json::from_slice::<sv_types::StudentDetails>(data);
    let _ = serde_json::from_slice::<sv_types::DetailsPatch>(data);

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = sv_types::RollNo::new(s);
        if let Ok(code) = sv_types::OtpCode::new(s) {
            assert_eq!(code.expose().len(), sv_types::OTP_CODE_LEN);
            assert!(code.matches(s));
        }
    }
});
