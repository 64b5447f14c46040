/// Unified f32 PCM representation.
///
/// Every decoder produces this: interleaved f32 samples in [-1.0, 1.0]
/// plus channel count and sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    /// Interleaved sample data [L, R, L, R, ...].
    pub samples: Vec<f32>,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Target device format the cache converts decoded audio into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Pcm {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Convert to the target format, if different.
    pub fn into_format(self, target: TargetFormat) -> Self {
        let mut pcm = self;
        if target.channels != 0 && pcm.channels != target.channels {
            pcm = pcm.change_channels(target.channels);
        }
        if target.sample_rate != 0 && pcm.sample_rate != target.sample_rate {
            pcm = pcm.change_sample_rate(target.sample_rate);
        }
        pcm
    }

    /// Change the channel count.
    ///
    /// Mono to stereo duplicates the single channel; stereo to mono takes
    /// the first channel.
    pub fn change_channels(&self, target_channels: u16) -> Self {
        let ch_in = self.channels as usize;
        let ch_out = target_channels as usize;
        let num_frames = self.num_frames();
        let mut out = vec![0.0f32; num_frames * ch_out];

        for i in 0..num_frames {
            for j in 0..ch_out {
                out[i * ch_out + j] = self.samples[i * ch_in + j.min(ch_in - 1)];
            }
        }

        Self {
            samples: out,
            channels: target_channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Change the sample rate using linear interpolation.
    pub fn change_sample_rate(&self, target_rate: u32) -> Self {
        let ch = self.channels as usize;
        let src_frames = self.num_frames();
        if src_frames == 0 || target_rate == 0 {
            return Self::new(Vec::new(), self.channels, target_rate);
        }

        let ratio = self.sample_rate as f64 / target_rate as f64;
        let dst_frames = (src_frames as f64 / ratio).ceil() as usize;
        let mut out = vec![0.0f32; dst_frames * ch];

        for frame in 0..dst_frames {
            let src_pos = frame as f64 * ratio;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;
            let next = (idx + 1).min(src_frames - 1);
            for c in 0..ch {
                let a = self.samples[idx * ch + c];
                let b = self.samples[next * ch + c];
                out[frame * ch + c] = a + (b - a) * frac;
            }
        }

        Self {
            samples: out,
            channels: self.channels,
            sample_rate: target_rate,
        }
    }
}
