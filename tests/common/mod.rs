use std::path::Path;

/// Write a tiny valid 16-bit mono WAV file for cache fixtures.
pub fn write_test_wav(path: &Path, frames: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        writer.write_sample((i % 128) as i16 * 256).unwrap();
    }
    writer.finalize().unwrap();
}
