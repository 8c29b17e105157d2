/// Sound engine: procedural 8-bit style effects via rodio.
///
/// rodio's output stream cannot leave the thread that opened it, while the
/// renderer that triggers sounds is shared with the countdown thread. The
/// stream therefore lives on its own "audio" thread; `SoundEngine` is only
/// the sending half of a channel and is `Send + Sync`.
///
/// Compile with `--no-default-features` to disable audio entirely
/// (the stub SoundEngine does nothing).

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    /// Once per second.
    Tick,
    /// Once per second in the last ten seconds.
    TickUrgent,
    WireCut,
    Explosion,
    Defused,
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Arc;
    use std::thread;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        tx: Sender<Sfx>,
    }

    struct Bank {
        tick: Arc<Vec<u8>>,
        tick_urgent: Arc<Vec<u8>>,
        wire_cut: Arc<Vec<u8>>,
        explosion: Arc<Vec<u8>>,
        defused: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// `None` when no audio device is available.
        pub fn new() -> Option<Self> {
            let (tx, rx) = mpsc::channel();
            let (ready_tx, ready_rx) = mpsc::sync_channel(1);
            thread::Builder::new()
                .name("audio".into())
                .spawn(move || {
                    let (_stream, handle) = match OutputStream::try_default() {
                        Ok(pair) => pair,
                        Err(e) => {
                            log::warn!("no audio output: {e}");
                            let _ = ready_tx.send(false);
                            return;
                        }
                    };
                    let _ = ready_tx.send(true);
                    audio_loop(rx, &handle);
                })
                .ok()?;
            match ready_rx.recv() {
                Ok(true) => Some(SoundEngine { tx }),
                _ => None,
            }
        }

        /// Fire-and-forget.
        pub fn play(&self, sfx: Sfx) {
            let _ = self.tx.send(sfx);
        }
    }

    fn audio_loop(rx: Receiver<Sfx>, handle: &OutputStreamHandle) {
        // ── Generate all sound buffers ──
        let bank = Bank {
            tick: Arc::new(make_wav(&gen_blip(880.0, 0.03, 0.2))),
            tick_urgent: Arc::new(make_wav(&gen_blip(1320.0, 0.05, 0.3))),
            wire_cut: Arc::new(make_wav(&gen_snip())),
            explosion: Arc::new(make_wav(&gen_explosion())),
            defused: Arc::new(make_wav(&gen_defused())),
        };
        // Ends when the engine (the sender) is dropped.
        for sfx in rx {
            let buf = match sfx {
                Sfx::Tick => &bank.tick,
                Sfx::TickUrgent => &bank.tick_urgent,
                Sfx::WireCut => &bank.wire_cut,
                Sfx::Explosion => &bank.explosion,
                Sfx::Defused => &bank.defused,
            };
            play(handle, buf);
        }
    }

    fn play(handle: &OutputStreamHandle, buf: &Arc<Vec<u8>>) {
        if let Ok(sink) = Sink::try_new(handle) {
            let cursor = Cursor::new(buf.as_ref().clone());
            if let Ok(src) = rodio::Decoder::new(cursor) {
                sink.append(src);
                sink.detach(); // fire-and-forget
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Wire snip: very short noise click
    fn gen_snip() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.04) as usize;
        let mut rng: u32 = 777;
        (0..n)
            .map(|i| {
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - i as f32 / n as f32).powf(2.0);
                noise * env * 0.35
            })
            .collect()
    }

    /// Explosion: long noise burst over a falling rumble
    fn gen_explosion() -> Vec<f32> {
        let duration = 1.2;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        let mut low = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                // one-pole low-pass: the boom darkens as it decays
                let k = 0.35 - t * 0.3;
                low += (noise - low) * k;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 90.0 - t * 50.0;
                let rumble = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                let env = (1.0 - t).powf(1.6);
                (low * 0.7 + rumble * 0.3) * env * 0.5
            })
            .collect()
    }

    /// Defused: ascending fanfare C5→E5→G5→C6 with a held last note
    fn gen_defused() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0];
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = (t * last_freq * 2.0 * std::f32::consts::PI).sin();
            samples.push(wave * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
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
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.clamp(-1.0, 1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
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
    pub fn play(&self, _sfx: Sfx) {}
}
