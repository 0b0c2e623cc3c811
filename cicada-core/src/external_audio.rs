//! External audio file I/O (C9): WAV/MP3/FLAC decode via `symphonia`,
//! resampling to the configured sample rate via `rubato`, and WAV encode via
//! `hound`. Audio capture/playback proper are host responsibilities (§1); this
//! module is the "opaque source/sink" boundary the rest of the crate talks to.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use rubato::{FastFixedIn, Resampler};

use crate::errors::AudioError;

/// Load an audio file and resample (if necessary) to `target_sample_rate`.
/// Returns mono float samples in `[-1, 1]`.
pub fn load_audio_file(path: &Path, target_sample_rate: usize) -> Result<Vec<f32>, AudioError> {
    let file = File::open(path).map_err(|e| AudioError::OpenFailed {
        path: path.to_string_lossy().into_owned(),
        reason: e.to_string(),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| AudioError::DecodeFailed {
            path: path.to_string_lossy().into_owned(),
            reason: format!("failed to probe format: {e}"),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::DecodeFailed {
            path: path.to_string_lossy().into_owned(),
            reason: "no audio track found".to_string(),
        })?;

    let track_id = track.id;
    let source_sample_rate = track.codec_params.sample_rate.ok_or_else(|| AudioError::DecodeFailed {
        path: path.to_string_lossy().into_owned(),
        reason: "unknown sample rate".to_string(),
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| AudioError::DecodeFailed {
            path: path.to_string_lossy().into_owned(),
            reason: format!("failed to create decoder: {e}"),
        })?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        if let Ok(decoded) = decoder.decode(&packet) {
            samples.extend_from_slice(&convert_to_mono_f32(&decoded));
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeFailed {
            path: path.to_string_lossy().into_owned(),
            reason: "no audio samples decoded".to_string(),
        });
    }

    if source_sample_rate as usize != target_sample_rate {
        resample_audio(&samples, source_sample_rate as usize, target_sample_rate)
    } else {
        Ok(samples)
    }
}

/// Write mono float samples to a 16-bit PCM WAV file at `sample_rate`.
pub fn write_wav_file(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| AudioError::WriteFailed {
        path: path.to_string_lossy().into_owned(),
        reason: e.to_string(),
    })?;
    for &s in samples {
        let clamped = s.clamp(-1.0, 1.0);
        let v = (clamped * i16::MAX as f32) as i16;
        writer.write_sample(v).map_err(|e| AudioError::WriteFailed {
            path: path.to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;
    }
    writer.finalize().map_err(|e| AudioError::WriteFailed {
        path: path.to_string_lossy().into_owned(),
        reason: e.to_string(),
    })
}

fn convert_to_mono_f32(buffer: &AudioBufferRef) -> Vec<f32> {
    macro_rules! mixdown {
        ($buf:expr, $to_f32:expr) => {{
            let channels = $buf.spec().channels.count();
            let frames = $buf.frames();
            let mut mono = Vec::with_capacity(frames);
            for i in 0..frames {
                let mut sum = 0.0f32;
                for ch in 0..channels {
                    sum += $to_f32($buf.chan(ch)[i]);
                }
                mono.push(sum / channels as f32);
            }
            mono
        }};
    }

    match buffer {
        AudioBufferRef::F32(buf) => {
            let channels = buf.spec().channels.count();
            if channels == 1 {
                buf.chan(0).to_vec()
            } else {
                mixdown!(buf, |s: f32| s)
            }
        }
        AudioBufferRef::F64(buf) => mixdown!(buf, |s: f64| s as f32),
        AudioBufferRef::U8(buf) => mixdown!(buf, |s: u8| (s as f32 - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => mixdown!(buf, |s: u16| (s as f32 - 32768.0) / 32768.0),
        AudioBufferRef::U24(buf) => mixdown!(buf, |s: symphonia::core::sample::u24| {
            (s.inner() as i32 - 8_388_608) as f32 / 8_388_608.0
        }),
        AudioBufferRef::U32(buf) => mixdown!(buf, |s: u32| (s as f64 - 2_147_483_648.0) as f32 / 2_147_483_648.0),
        AudioBufferRef::S8(buf) => mixdown!(buf, |s: i8| s as f32 / 128.0),
        AudioBufferRef::S16(buf) => mixdown!(buf, |s: i16| s as f32 / 32768.0),
        AudioBufferRef::S24(buf) => mixdown!(buf, |s: symphonia::core::sample::i24| s.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => mixdown!(buf, |s: i32| s as f64 as f32 / 2_147_483_648.0),
    }
}

fn resample_audio(samples: &[f32], source_rate: usize, target_rate: usize) -> Result<Vec<f32>, AudioError> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = source_rate;
    let mut resampler = FastFixedIn::<f32>::new(
        target_rate as f64 / source_rate as f64,
        1.0,
        rubato::PolynomialDegree::Linear,
        chunk_size,
        1,
    )
    .map_err(|e| AudioError::ResampleFailed {
        from_hz: source_rate as u32,
        to_hz: target_rate as u32,
        reason: e.to_string(),
    })?;

    let mut output = Vec::new();
    let mut input_buf = vec![Vec::new(); 1];

    for chunk in samples.chunks(chunk_size) {
        input_buf[0].clear();
        input_buf[0].extend_from_slice(chunk);
        if input_buf[0].len() < chunk_size {
            input_buf[0].resize(chunk_size, 0.0);
        }

        let out = resampler
            .process(&input_buf, None)
            .map_err(|e| AudioError::ResampleFailed {
                from_hz: source_rate as u32,
                to_hz: target_rate as u32,
                reason: e.to_string(),
            })?;

        output.extend_from_slice(&out[0]);
    }

    Ok(output)
}

/// Pad or truncate `audio` to exactly `target_length` samples; optionally
/// loop short audio instead of zero-padding.
pub fn prepare_audio_length(audio: &[f32], target_length: usize, loop_audio: bool) -> Vec<f32> {
    if audio.is_empty() {
        return vec![0.0; target_length];
    }
    if audio.len() == target_length {
        return audio.to_vec();
    }
    if audio.len() > target_length {
        return audio[..target_length].to_vec();
    }
    if !loop_audio {
        let mut result = audio.to_vec();
        result.resize(target_length, 0.0);
        return result;
    }
    let mut result = Vec::with_capacity(target_length);
    let full_loops = target_length / audio.len();
    let remainder = target_length % audio.len();
    for _ in 0..full_loops {
        result.extend_from_slice(audio);
    }
    if remainder > 0 {
        result.extend_from_slice(&audio[..remainder]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_audio_exact_match() {
        let audio = vec![1.0, 2.0, 3.0];
        let result = prepare_audio_length(&audio, 3, false);
        assert_eq!(result, audio);
    }

    #[test]
    fn test_prepare_audio_truncate() {
        let audio = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = prepare_audio_length(&audio, 3, false);
        assert_eq!(result, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_prepare_audio_pad() {
        let audio = vec![1.0, 2.0];
        let result = prepare_audio_length(&audio, 5, false);
        assert_eq!(result, vec![1.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_prepare_audio_loop() {
        let audio = vec![1.0, 2.0];
        let result = prepare_audio_length(&audio, 5, true);
        assert_eq!(result, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_prepare_audio_empty() {
        let audio: Vec<f32> = vec![];
        let result = prepare_audio_length(&audio, 3, false);
        assert_eq!(result, vec![0.0, 0.0, 0.0]);
    }
}
