//! `marsten`: hide bytes in Markov-generated text.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use marsten_core::codec::config::DEFAULT_MARGIN;
use marsten_core::io::{build_output_path, read_corpus};
use marsten_core::model::DEFAULT_HISTORY;
use marsten_core::{Codec, CodecConfig, ModelBuilder};

#[derive(Parser)]
#[command(name = "marsten")]
#[command(version)]
#[command(about = "Hide data in text generated by a character-level Markov model")]
struct Cli {
	/// Increase log verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Fit a model on one or more training files
	Train {
		/// Training files; every line is one training document
		#[arg(required = true)]
		corpus: Vec<PathBuf>,

		/// Number of previous characters forming a context
		#[arg(long, default_value_t = DEFAULT_HISTORY)]
		history: usize,

		/// Tolerance around a 50/50 split for a step to carry a bit
		#[arg(long, default_value_t = DEFAULT_MARGIN)]
		margin: f64,

		/// Output model file (defaults to the first corpus file with a .bin extension)
		#[arg(short, long)]
		output: Option<PathBuf>,
	},

	/// Hide a payload in generated text
	Encode {
		#[arg(short, long)]
		model: PathBuf,

		/// Payload file (stdin if omitted)
		#[arg(short, long)]
		input: Option<PathBuf>,

		/// Ciphertext file (stdout if omitted)
		#[arg(short, long)]
		output: Option<PathBuf>,

		/// Seed for reproducible output
		#[arg(long)]
		seed: Option<u64>,
	},

	/// Recover a payload from generated text
	Decode {
		#[arg(short, long)]
		model: PathBuf,

		/// Ciphertext file (stdin if omitted)
		#[arg(short, long)]
		input: Option<PathBuf>,

		/// Payload file (stdout if omitted)
		#[arg(short, long)]
		output: Option<PathBuf>,
	},

	/// Print model statistics
	Inspect {
		#[arg(short, long)]
		model: PathBuf,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let level = match cli.verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	match cli.command {
		Commands::Train { corpus, history, margin, output } => train(&corpus, history, margin, output),
		Commands::Encode { model, input, output, seed } => encode(&model, input, output, seed),
		Commands::Decode { model, input, output } => decode(&model, input, output),
		Commands::Inspect { model } => inspect(&model),
	}
}

fn train(corpus: &[PathBuf], history: usize, margin: f64, output: Option<PathBuf>) -> Result<()> {
	let config = CodecConfig::with_margin(margin)?;
	let text = read_corpus(corpus).context("Failed to read training files")?;

	let mut builder = ModelBuilder::new(history)?;
	builder.fit_parallel(&text)?;
	let codec = Codec::new(builder.build()?, config)?;

	let output = match output {
		Some(path) => path,
		None => build_output_path(&corpus[0], "bin")?,
	};
	codec
		.save(&output)
		.with_context(|| format!("Failed to write model to {}", output.display()))?;

	let summary = codec.summary();
	if summary.balanced_contexts == 0 {
		log::warn!("no context is balanced at margin {}; nothing can be encoded", margin);
	}
	eprintln!(
		"Saved {} ({} contexts, {} balanced)",
		output.display(),
		summary.contexts,
		summary.balanced_contexts
	);
	Ok(())
}

fn encode(model: &Path, input: Option<PathBuf>, output: Option<PathBuf>, seed: Option<u64>) -> Result<()> {
	let codec = load(model)?;
	let payload = read_input(input.as_deref())?;

	let mut rng = match seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};
	let document = codec.encode(&payload, &mut rng)?;

	let mut text = document.into_bytes();
	text.push(b'\n');
	write_output(output.as_deref(), &text)
}

fn decode(model: &Path, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
	let codec = load(model)?;
	let bytes = read_input(input.as_deref())?;
	let text = String::from_utf8(bytes).context("Ciphertext is not valid UTF-8")?;

	// Tolerate the newline added on output or by editors.
	let document = text.strip_suffix('\n').unwrap_or(&text);
	let report = codec.decode_report(document)?;
	if report.trailing_bits > 0 {
		log::warn!("discarded {} trailing bits", report.trailing_bits);
	}
	write_output(output.as_deref(), &report.payload)
}

fn inspect(model: &Path) -> Result<()> {
	let summary = load(model)?.summary();
	println!("history:           {}", summary.history);
	println!("margin:            {}", summary.margin);
	println!("contexts:          {}", summary.contexts);
	println!("balanced contexts: {}", summary.balanced_contexts);
	Ok(())
}

fn load(model: &Path) -> Result<Codec> {
	if !model.is_file() {
		bail!("Model file not found: {}", model.display());
	}
	Codec::load(model).with_context(|| format!("Failed to load model {}", model.display()))
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
	match input {
		Some(path) => fs::read(path).with_context(|| format!("Failed to read {}", path.display())),
		None => {
			let mut buffer = Vec::new();
			io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
			Ok(buffer)
		}
	}
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
	match output {
		Some(path) => fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display())),
		None => {
			let mut stdout = io::stdout().lock();
			stdout.write_all(bytes)?;
			stdout.flush()?;
			Ok(())
		}
	}
}
