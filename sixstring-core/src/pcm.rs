//! # PCM Decoder Module
//!
//! Converts the raw payload of a clip into the normalized sample window the
//! transform consumes. Samples are 16-bit little-endian signed integers,
//! mono, scaled into [-1, 1] by dividing by 32768.
//!
//! Decoding never fails: a payload shorter than the window is a normal case
//! (the 100 ms capture is shorter than the 2048-sample window at some
//! rates), and the unfilled tail of the window stays at silence.

/// Decodes a PCM payload into a window of exactly `window_size` samples.
///
/// Fills `min(window_size, payload.len() / 2)` slots from the payload; the
/// remainder is zero. A trailing odd byte is ignored.
pub fn decode_window(payload: &[u8], window_size: usize) -> Vec<f32> {
    let mut window = vec![0.0f32; window_size];
    let available = payload.len() / 2;
    for (i, slot) in window.iter_mut().take(available).enumerate() {
        let sample = i16::from_le_bytes([payload[i * 2], payload[i * 2 + 1]]);
        *slot = sample as f32 / 32768.0;
    }
    window
}
