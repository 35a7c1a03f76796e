#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only well-formed JSON reaches the payload parsers
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    // Neither parser may panic on arbitrary shapes
    let _ = pumpwatch::model::StationPrices::from_payload(&value);
    let _ = pumpwatch::discovery::extract_stations(&value);
    let _ = pumpwatch::provider::gasbuddy::normalize_station_response("0", &value);
});
