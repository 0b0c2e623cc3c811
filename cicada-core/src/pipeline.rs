//! Live capture pipeline (C10, §5): three cooperating tasks connected by
//! bounded/unbounded queues.
//!
//! Grounded in the Python original's `mic_producer`/`transcribe_audio_loop`
//! shape (`imprint/speech.py`), rebuilt with `crossbeam-channel` per the
//! teacher's worker/queue idioms instead of Python's `queue.Queue`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};

/// One mono float audio block, as delivered by the hardware callback.
pub type AudioBlock = Vec<f32>;

/// A transcript chunk handed from the transcription task to the TX task.
#[derive(Debug, Clone)]
pub struct TranscriptChunk {
    pub text: String,
    /// Sample index (relative to pipeline start) of the window this chunk
    /// was decoded from.
    pub window_start_sample: usize,
}

/// Sliding-window transcription timing (§5): decode every `window_sec -
/// overlap_sec`, keeping `overlap_sec` of carry between windows.
#[derive(Debug, Clone)]
pub struct TranscriptionTiming {
    pub sample_rate: f64,
    pub window_sec: f64,
    pub overlap_sec: f64,
}

impl TranscriptionTiming {
    fn window_samples(&self) -> usize {
        (self.window_sec * self.sample_rate).round() as usize
    }

    fn hop_samples(&self) -> usize {
        ((self.window_sec - self.overlap_sec) * self.sample_rate).round() as usize
    }
}

/// Cooperative stop signal shared by all three tasks (§5 "Cancellation").
#[derive(Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Audio source task (§5 item 1): fed by `next_block` (a stand-in for a
/// fixed-rate hardware callback), pushes onto a bounded queue. The producer
/// side never blocks: on queue pressure the oldest buffered block is dropped
/// by draining one entry before retrying.
pub fn run_audio_source<F>(
    tx: Sender<AudioBlock>,
    stop: StopSignal,
    mut next_block: F,
) where
    F: FnMut() -> Option<AudioBlock>,
{
    while !stop.is_stopped() {
        let Some(block) = next_block() else { break };
        match tx.try_send(block) {
            Ok(()) => {}
            Err(TrySendError::Full(block)) => {
                // Queue pressure: drop the oldest buffered block, then retry once.
                let _ = tx.try_recv();
                let _ = tx.try_send(block);
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
}

/// Transcription task (§5 item 2): maintains a sliding buffer and throttles
/// decoding to once per hop. `transcribe` stands in for the ASR backend.
pub fn run_transcription<F>(
    audio_rx: Receiver<AudioBlock>,
    chunk_tx: Sender<TranscriptChunk>,
    stop: StopSignal,
    timing: TranscriptionTiming,
    mut transcribe: F,
) where
    F: FnMut(&[f32]) -> String,
{
    let window_len = timing.window_samples();
    let hop_len = timing.hop_samples().max(1);

    let mut buffer: Vec<f32> = Vec::new();
    let mut samples_seen = 0usize;
    let mut next_decode_at = 0usize;

    while !stop.is_stopped() {
        match audio_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(block) => {
                samples_seen += block.len();
                buffer.extend_from_slice(&block);

                // Drain any further buffered blocks without blocking (§5's
                // audio task never blocks the producer; the consumer should
                // not fall behind either).
                while let Ok(extra) = audio_rx.try_recv() {
                    samples_seen += extra.len();
                    buffer.extend_from_slice(&extra);
                }

                if buffer.len() > window_len * 4 {
                    let excess = buffer.len() - window_len * 4;
                    buffer.drain(0..excess);
                }

                if buffer.len() < window_len || samples_seen < next_decode_at {
                    continue;
                }
                next_decode_at = samples_seen + hop_len;

                let window = &buffer[buffer.len() - window_len..];
                let text = transcribe(window);
                if !text.is_empty() {
                    let chunk = TranscriptChunk {
                        text,
                        window_start_sample: samples_seen - window_len,
                    };
                    if chunk_tx.send(chunk).is_err() {
                        break;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// TX task (§5 item 3): drains the transcript queue, coalescing to the
/// newest chunk via `try_recv`, synthesizes a frame with `synthesize`, and
/// blocks on `play` until playback completes before pulling the next chunk.
pub fn run_tx<S, P>(chunk_rx: Receiver<TranscriptChunk>, stop: StopSignal, mut synthesize: S, mut play: P)
where
    S: FnMut(&TranscriptChunk) -> AudioBlock,
    P: FnMut(&AudioBlock),
{
    while !stop.is_stopped() {
        let chunk = match chunk_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let mut latest = chunk;
        while let Ok(newer) = chunk_rx.try_recv() {
            latest = newer;
        }

        let samples = synthesize(&latest);
        play(&samples);
    }
}

/// Convenience constructor for the bounded audio queue described in §5.
pub fn audio_channel(capacity: usize) -> (Sender<AudioBlock>, Receiver<AudioBlock>) {
    bounded(capacity)
}

/// Convenience constructor for the unbounded transcript queue of §5.
pub fn transcript_channel() -> (Sender<TranscriptChunk>, Receiver<TranscriptChunk>) {
    unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn audio_source_drops_oldest_block_under_pressure() {
        let (tx, rx) = audio_channel(2);
        let stop = StopSignal::new();
        let mut blocks = vec![vec![1.0f32], vec![2.0f32], vec![3.0f32]].into_iter();

        run_audio_source(tx, stop, move || blocks.next());

        let mut received = Vec::new();
        while let Ok(block) = rx.try_recv() {
            received.push(block);
        }
        assert_eq!(received.len(), 2);
        assert_eq!(received.last().unwrap(), &vec![3.0f32]);
    }

    #[test]
    fn transcription_throttles_and_emits_chunks() {
        let (audio_tx, audio_rx) = audio_channel(8);
        let (chunk_tx, chunk_rx) = transcript_channel();
        let stop = StopSignal::new();
        let timing = TranscriptionTiming { sample_rate: 10.0, window_sec: 1.0, overlap_sec: 0.5 };

        for _ in 0..20 {
            audio_tx.send(vec![0.0f32; 2]).unwrap();
        }
        drop(audio_tx);

        let call_count = Arc::new(Mutex::new(0usize));
        let call_count_clone = call_count.clone();
        run_transcription(audio_rx, chunk_tx, stop, timing, move |_window| {
            *call_count_clone.lock().unwrap() += 1;
            "hello world".to_string()
        });

        assert!(*call_count.lock().unwrap() >= 1);
        assert!(chunk_rx.try_recv().is_ok());
    }

    #[test]
    fn tx_task_coalesces_to_newest_buffered_chunk() {
        let (chunk_tx, chunk_rx) = transcript_channel();
        let stop = StopSignal::new();

        chunk_tx
            .send(TranscriptChunk { text: "first".into(), window_start_sample: 0 })
            .unwrap();
        chunk_tx
            .send(TranscriptChunk { text: "second".into(), window_start_sample: 10 })
            .unwrap();
        drop(chunk_tx);

        let played = Arc::new(Mutex::new(Vec::new()));
        let played_clone = played.clone();
        run_tx(
            chunk_rx,
            stop,
            |chunk| vec![chunk.text.len() as f32],
            move |samples| played_clone.lock().unwrap().push(samples.clone()),
        );

        let played = played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0], vec!["second".len() as f32]);
    }
}
