mod config;
mod logging;
mod report;
mod telemetry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use rand::RngCore;

use cicada_core::canon::canonicalize;
use cicada_core::diagnostics::SimulationReport;
use cicada_core::external_audio::{load_audio_file, write_wav_file};
use cicada_core::frame::{FrameHeader, SignedFrame, FRAME_LEN};
use cicada_core::signature::{self, Keypair};
use cicada_core::{channel, Modem};

use config::CliConfig;
use logging::{FrameDecodeEvent, LogEvent, SignatureMatchEvent, SimulationEvent, StructuredLogger};
use report::{write_frames_csv, write_markdown_appendix, FrameRecord};

#[derive(Parser)]
#[command(name = "cicada-cli", version, about = "Acoustic FSK modem: encode, decode, sign and verify framed payloads")]
struct Cli {
    /// Path to a TOML configuration file; falls back to built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a BLS12-381 keypair and write it to `<out-dir>/bls.sk`/`bls.pk`.
    Keygen {
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Modulate a raw payload (as a hex string) directly into a WAV file.
    Encode {
        #[arg(long)]
        payload_hex: String,
        #[arg(long)]
        out: PathBuf,
    },

    /// Demodulate a WAV file into a CSV of recovered frames.
    Decode {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_csv: PathBuf,
    },

    /// Build a signed frame from a transcript and a private key, then modulate it.
    Sign {
        /// Literal transcript text bound into the signature.
        #[arg(long, conflicts_with = "transcript_file")]
        transcript: Option<String>,
        /// Path to a file containing the transcript text.
        #[arg(long)]
        transcript_file: Option<PathBuf>,
        #[arg(long)]
        header_message: String,
        /// Unix timestamp; defaults to the current time.
        #[arg(long)]
        timestamp: Option<u32>,
        #[arg(long)]
        private_key: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Verify decoded frames in a CSV against a transcript and a public key.
    Verify {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, conflicts_with = "transcript_file")]
        transcript: Option<String>,
        #[arg(long)]
        transcript_file: Option<PathBuf>,
        #[arg(long)]
        public_key: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },

    /// Run AWGN encode/noise/decode trials and report aggregate BER (§8.5).
    Simulate {
        #[arg(long)]
        snr_db: Option<f64>,
        #[arg(long)]
        trials: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn load_config(cli: &Cli) -> Result<CliConfig> {
    match &cli.config {
        Some(path) => CliConfig::from_file(path),
        None => Ok(CliConfig::default()),
    }
}

fn read_transcript(text: &Option<String>, file: &Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.clone());
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read transcript file {}", path.display()));
    }
    Err(eyre!("either --transcript or --transcript-file is required"))
}

fn read_private_key(path: &std::path::Path) -> Result<Keypair> {
    let bytes = std::fs::read(path).wrap_err_with(|| format!("failed to read private key {}", path.display()))?;
    let array: [u8; signature::PRIVATE_KEY_LEN] = bytes
        .try_into()
        .map_err(|_| eyre!("private key file must be exactly {} bytes", signature::PRIVATE_KEY_LEN))?;
    Keypair::from_private_key_bytes(&array).map_err(|e| eyre!("invalid private key: {e}"))
}

fn read_public_key(path: &std::path::Path) -> Result<[u8; signature::PUBLIC_KEY_LEN]> {
    let bytes = std::fs::read(path).wrap_err_with(|| format!("failed to read public key {}", path.display()))?;
    bytes
        .try_into()
        .map_err(|_| eyre!("public key file must be exactly {} bytes", signature::PUBLIC_KEY_LEN))
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(eyre!("hex payload must have an even number of digits"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| eyre!("invalid hex digit in payload: {e}")))
        .collect()
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let logger = StructuredLogger::new(config.terminal.logging.format.clone());

    match &cli.command {
        Command::Keygen { out_dir } => run_keygen(out_dir, &logger),
        Command::Encode { payload_hex, out } => run_encode(&config, payload_hex, out, &logger),
        Command::Decode { input, out_csv } => run_decode(&config, input, out_csv, &logger),
        Command::Sign { transcript, transcript_file, header_message, timestamp, private_key, out } => {
            run_sign(&config, transcript, transcript_file, header_message, *timestamp, private_key, out, &logger)
        }
        Command::Verify { csv, transcript, transcript_file, public_key, out } => {
            run_verify(csv, transcript, transcript_file, public_key, out, &logger)
        }
        Command::Simulate { snr_db, trials, seed } => run_simulate(&config, *snr_db, *trials, *seed, &logger),
    }
}

fn run_keygen(out_dir: &std::path::Path, logger: &StructuredLogger) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    let mut ikm = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut ikm);
    let keypair = Keypair::from_ikm(&ikm).map_err(|e| eyre!("key generation failed: {e}"))?;

    let sk_path = out_dir.join("bls.sk");
    let pk_path = out_dir.join("bls.pk");
    std::fs::write(&sk_path, keypair.private_key_bytes())?;
    std::fs::write(&pk_path, keypair.public_key_bytes())?;

    logger.info(format!("wrote {} and {}", sk_path.display(), pk_path.display()));
    Ok(())
}

fn run_encode(config: &CliConfig, payload_hex: &str, out: &std::path::Path, logger: &StructuredLogger) -> Result<()> {
    let modem = Modem::new(config.modem.clone()).map_err(|e| eyre!("invalid modem configuration: {e}"))?;
    let payload = hex_decode(payload_hex)?;
    let samples = modem.encode(&payload);
    write_wav_file(out, &samples, config.modem.waveform.fs as u32)
        .map_err(|e| eyre!("failed to write {}: {e}", out.display()))?;
    logger.info(format!("encoded {} payload bytes to {}", payload.len(), out.display()));
    Ok(())
}

fn run_decode(
    config: &CliConfig,
    input: &std::path::Path,
    out_csv: &std::path::Path,
    logger: &StructuredLogger,
) -> Result<()> {
    let modem = Modem::new(config.modem.clone()).map_err(|e| eyre!("invalid modem configuration: {e}"))?;
    let fs = config.modem.waveform.fs as usize;
    let samples = load_audio_file(input, fs).map_err(|e| eyre!("failed to load {}: {e}", input.display()))?;

    let frames = modem.decode(&samples);
    let mut records = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        logger.log(&LogEvent::FrameDecoded(FrameDecodeEvent {
            frame_index: index,
            start_sample: frame.start_sample,
            ldpc_iterations: frame.ldpc_iterations,
            ldpc_converged: frame.ldpc_converged,
            payload_hex: frame.bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }));

        if frame.bytes.len() < FRAME_LEN {
            logger.warn(format!("frame #{index} is shorter than a signed wire frame; skipping"));
            continue;
        }
        let signed = match SignedFrame::from_bytes(&frame.bytes[..FRAME_LEN]) {
            Ok(signed) => signed,
            Err(e) => {
                logger.warn(format!("frame #{index} has an invalid header, dropping: {e}"));
                continue;
            }
        };
        records.push(FrameRecord {
            frame_start_sample: frame.start_sample as i64,
            timestamp: signed.header.timestamp,
            word_count: signed.header.word_count,
            header_message: signed.header.message,
            signature: signed.signature,
        });
    }

    write_frames_csv(out_csv, &records)?;
    logger.info(format!("wrote {} decoded frame(s) to {}", records.len(), out_csv.display()));
    Ok(())
}

fn run_sign(
    config: &CliConfig,
    transcript: &Option<String>,
    transcript_file: &Option<PathBuf>,
    header_message: &str,
    timestamp: Option<u32>,
    private_key: &std::path::Path,
    out: &std::path::Path,
    logger: &StructuredLogger,
) -> Result<()> {
    let modem = Modem::new(config.modem.clone()).map_err(|e| eyre!("invalid modem configuration: {e}"))?;
    let transcript_text = read_transcript(transcript, transcript_file)?;
    let tokens = canonicalize(&transcript_text);
    let word_count: u8 = tokens
        .len()
        .try_into()
        .map_err(|_| eyre!("transcript has {} tokens, more than the 8-bit word_count field allows", tokens.len()))?;

    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp() as u32);
    let header = FrameHeader::new(timestamp, word_count, header_message)
        .map_err(|e| eyre!("invalid header: {e}"))?;

    let keypair = read_private_key(private_key)?;
    let msg = cicada_core::frame::signed_message(&header, &tokens).map_err(|e| eyre!("invalid transcript: {e}"))?;
    let sig = keypair.sign(&msg);
    let frame = SignedFrame { header, signature: sig };

    let samples = modem.encode(&frame.to_bytes());
    write_wav_file(out, &samples, config.modem.waveform.fs as u32)
        .map_err(|e| eyre!("failed to write {}: {e}", out.display()))?;

    logger.info(format!("signed {} tokens, wrote {}", tokens.len(), out.display()));
    Ok(())
}

fn run_verify(
    csv: &std::path::Path,
    transcript: &Option<String>,
    transcript_file: &Option<PathBuf>,
    public_key: &std::path::Path,
    out: &std::path::Path,
    logger: &StructuredLogger,
) -> Result<()> {
    let transcript_text = read_transcript(transcript, transcript_file)?;
    let tokens = canonicalize(&transcript_text);
    let pubkey = read_public_key(public_key)?;
    let records = report::read_frames_csv(csv)?;

    let matches: Vec<_> = records
        .iter()
        .map(|record| report::match_frame_against_transcript(record, &pubkey, &tokens))
        .collect();

    for (index, m) in matches.iter().enumerate() {
        logger.log(&LogEvent::SignatureMatch(SignatureMatchEvent {
            frame_index: index,
            header_message: m.record.header_message.clone(),
            matched: m.matched(),
            token_offset: m.token_offset,
        }));
    }

    write_markdown_appendix(out, &transcript_text, &matches, 44_100.0)?;
    logger.info(format!(
        "{} of {} frames matched, wrote {}",
        matches.iter().filter(|m| m.matched()).count(),
        matches.len(),
        out.display()
    ));
    Ok(())
}

fn run_simulate(
    config: &CliConfig,
    snr_db: Option<f64>,
    trials: Option<usize>,
    seed: Option<u64>,
    logger: &StructuredLogger,
) -> Result<()> {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    let modem = Modem::new(config.modem.clone()).map_err(|e| eyre!("invalid modem configuration: {e}"))?;
    let snr_db = snr_db.unwrap_or(config.simulation.snr_db);
    let trials = trials.unwrap_or(config.simulation.trials);
    let seed = seed.or(config.simulation.rng_seed).unwrap_or(0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let payload_len = config.modem.data_bits_per_frame() / 8;
    let mut aggregator = telemetry::TrialAggregator::new();

    let progress = indicatif::ProgressBar::new(trials as u64);
    progress.set_style(
        indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} trials ({eta})")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
    );

    for _ in 0..trials {
        let mut payload = vec![0u8; payload_len];
        rng.fill_bytes(&mut payload);

        let samples = modem.encode(&payload);
        let power = channel::signal_power(&samples);
        let noise_std = channel::noise_std_for_snr_db(snr_db, power);
        let noisy = channel::apply_audio_noise(&samples, noise_std, &mut rng);

        let frames = modem.decode(&noisy);
        match frames.first() {
            Some(frame) => aggregator.record_trial(&payload, Some(&frame.bytes[..payload_len.min(frame.bytes.len())]), frame.ldpc_converged),
            None => aggregator.record_trial(&payload, None, false),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let report: SimulationReport = aggregator.report();
    logger.log(&LogEvent::Simulation(SimulationEvent {
        trials: report.trials,
        post_fec_errors: report.post_fec_errors,
        post_fec_ber: report.post_fec_ber,
        converged_trials: report.converged_trials,
        converged_fraction: report.converged_fraction(),
    }));
    Ok(())
}
