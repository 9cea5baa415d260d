use aisay_core::voice::catalog::provider::VoiceRecord;

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[allow(dead_code)]
pub fn voice(id: &str, name: &str, is_public: bool) -> VoiceRecord {
    VoiceRecord {
        id: id.to_string(),
        name: name.to_string(),
        is_public,
    }
}

/// `count` public voices with sequential IDs and names
#[allow(dead_code)]
pub fn numbered_voices(count: usize) -> Vec<VoiceRecord> {
    (0..count)
        .map(|i| voice(&format!("voice-{i:04}"), &format!("Voice {i:04}"), true))
        .collect()
}
