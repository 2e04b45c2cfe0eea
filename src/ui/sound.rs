/// Sound engine: procedural chip-style effects via rodio.
///
/// Every effect is synthesized once at init into an in-memory WAV buffer.
/// Playback is fire-and-forget (non-blocking) via a detached rodio Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_grab: Arc<Vec<u8>>,
        sfx_place: Arc<Vec<u8>>,
        sfx_return: Arc<Vec<u8>>,
        sfx_pickup: Arc<Vec<u8>>,
        sfx_rotate: Arc<Vec<u8>>,
        sfx_step: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let wav = |samples: Vec<f32>| Arc::new(make_wav(&samples));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_grab: wav(sweep(900.0, 1100.0, 0.03, 0.18, Wave::Sine)),
                sfx_place: wav(gen_place()),
                sfx_return: wav(sweep(700.0, 250.0, 0.14, 0.2, Wave::Sine)),
                sfx_pickup: wav(arpeggio(&[660.0, 990.0], 0.05, 0.22)),
                sfx_rotate: wav(sweep(1400.0, 1400.0, 0.02, 0.15, Wave::Square)),
                sfx_step: wav(sweep(320.0, 280.0, 0.04, 0.2, Wave::Square)),
                sfx_jump: wav(sweep(300.0, 900.0, 0.1, 0.22, Wave::Square)),
                sfx_win: wav(gen_win()),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_grab(&self) { self.play(&self.sfx_grab); }
        pub fn play_place(&self) { self.play(&self.sfx_place); }
        pub fn play_return(&self) { self.play(&self.sfx_return); }
        pub fn play_pickup(&self) { self.play(&self.sfx_pickup); }
        pub fn play_rotate(&self) { self.play(&self.sfx_rotate); }
        pub fn play_step(&self) { self.play(&self.sfx_step); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        Square,
    }

    fn osc(wave: Wave, phase: f32) -> f32 {
        match wave {
            Wave::Sine => phase.sin(),
            Wave::Square => if phase.sin() >= 0.0 { 0.6 } else { -0.6 },
        }
    }

    /// Linear pitch sweep with a linear fade-out.
    fn sweep(from_hz: f32, to_hz: f32, duration: f32, volume: f32, wave: Wave) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from_hz + (to_hz - from_hz) * t;
                phase += TAU * freq / SAMPLE_RATE as f32;
                osc(wave, phase) * (1.0 - t) * volume
            })
            .collect()
    }

    /// Notes played back to back, each with a soft decay.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_dur) as usize;
        notes
            .iter()
            .flat_map(|&freq| {
                (0..n).map(move |i| {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                    ((t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3) * env * volume
                })
            })
            .collect()
    }

    /// Placement: low thud plus a short noise click.
    fn gen_place() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.07) as usize;
        let mut rng: u32 = 2463534242;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let thud = (ti * 140.0 * TAU).sin();
                rng ^= rng << 13;
                rng ^= rng >> 17;
                rng ^= rng << 5;
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let click = if t < 0.15 { noise * (1.0 - t / 0.15) } else { 0.0 };
                (thud * 0.7 + click * 0.3) * (1.0 - t).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Board complete: rising major arpeggio with a held top note.
    fn gen_win() -> Vec<f32> {
        let mut samples = arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.09, 0.28);
        samples.extend(sweep(1047.0, 1047.0, 0.3, 0.28, Wave::Sine));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let buf = make_wav(&[0.0, 1.0, -1.0]);
            assert_eq!(&buf[0..4], b"RIFF");
            assert_eq!(&buf[8..12], b"WAVE");
            assert_eq!(buf.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([buf[40], buf[41], buf[42], buf[43]]), 6);
            assert_eq!(i16::from_le_bytes([buf[46], buf[47]]), 32767);
        }

        #[test]
        fn generators_stay_in_range() {
            for s in [gen_place(), gen_win(), sweep(300.0, 900.0, 0.1, 0.22, Wave::Square)] {
                assert!(!s.is_empty());
                assert!(s.iter().all(|v| v.abs() <= 1.0));
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_grab(&self) {}
    pub fn play_place(&self) {}
    pub fn play_return(&self) {}
    pub fn play_pickup(&self) {}
    pub fn play_rotate(&self) {}
    pub fn play_step(&self) {}
    pub fn play_jump(&self) {}
    pub fn play_win(&self) {}
}
