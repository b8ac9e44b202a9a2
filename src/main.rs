use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use callscope::{
    AnalysisReport, Analyzer, AnthropicClient, AnthropicConfig, CallRecording, EngineConfig,
    Generator, OfflineGenerator, aggregate, read_recordings_file, read_transcript_file, segment,
    write_json,
};

#[derive(Parser)]
#[command(name = "callscope")]
#[command(author, version, about = "Call transcript analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a transcript into speaker messages and print them as JSON
    Segment {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Analyze a single call transcript
    Analyze {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the analysis (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Output file for a human-readable report (text)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Seconds assumed for messages without timing
        #[arg(long, default_value = "5.0")]
        default_duration: f64,

        /// Skip the LLM request (heuristics only)
        #[arg(long)]
        offline: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compute fleet statistics over a set of recordings
    Aggregate {
        /// Input recordings file (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the metrics (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Analyze recordings that have a transcript but no analysis first
        #[arg(long)]
        analyze_missing: bool,

        /// Maximum concurrent analyses when analyzing missing recordings
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Skip the LLM request when analyzing missing recordings
        #[arg(long)]
        offline: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Segment { input } => {
            setup_logging(false);
            segment_transcript(input)
        }
        Commands::Analyze {
            input,
            output,
            report,
            default_duration,
            offline,
            verbose,
        } => {
            setup_logging(verbose);
            let config = EngineConfig {
                default_message_secs: default_duration,
                ..Default::default()
            };
            if offline {
                info!("Skipping LLM request (--offline)");
                let analyzer = Analyzer::with_config(OfflineGenerator, config);
                analyze_transcript(&analyzer, input, output, report).await
            } else {
                let client = AnthropicClient::new(AnthropicConfig::from_env()?)?;
                let analyzer = Analyzer::with_config(client, config);
                analyze_transcript(&analyzer, input, output, report).await
            }
        }
        Commands::Aggregate {
            input,
            output,
            analyze_missing,
            concurrency,
            offline,
            verbose,
        } => {
            setup_logging(verbose);
            let mut recordings =
                read_recordings_file(&input).context("Failed to read recordings")?;
            info!("Loaded {} recordings from {:?}", recordings.len(), input);

            if analyze_missing {
                recordings = if offline {
                    let analyzer = Arc::new(Analyzer::new(OfflineGenerator));
                    analyze_pending(analyzer, recordings, concurrency).await
                } else {
                    let client = AnthropicClient::new(AnthropicConfig::from_env()?)?;
                    let analyzer = Arc::new(Analyzer::new(client));
                    analyze_pending(analyzer, recordings, concurrency).await
                };
            }

            let metrics = aggregate(&recordings);
            write_json(&metrics, &output).context("Failed to write metrics")?;
            info!(
                "Aggregated {} calls ({} analyzed), written to {:?}",
                metrics.total_calls, metrics.analyzed_calls, output
            );
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn segment_transcript(input: PathBuf) -> Result<()> {
    let transcript = read_transcript_file(&input).context("Failed to read transcript")?;
    let messages = segment(&transcript);
    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

async fn analyze_transcript<G: Generator>(
    analyzer: &Analyzer<G>,
    input: PathBuf,
    output: PathBuf,
    report: Option<PathBuf>,
) -> Result<()> {
    info!("Loading transcript from {:?}", input);
    let transcript = read_transcript_file(&input).context("Failed to read transcript")?;
    let messages = segment(&transcript);
    info!("Segmented {} messages", messages.len());

    let resolution = analyzer
        .analyze_detailed(&transcript, &messages)
        .await
        .context("Analysis request failed")?;
    let analysis = resolution.analysis;

    write_json(&analysis, &output).context("Failed to write analysis")?;
    info!("Analysis written to {:?}", output);

    if let Some(report_path) = report {
        AnalysisReport::new(&analysis, &messages)
            .write_file(&report_path)
            .context("Failed to write report")?;
        info!("Report written to {:?}", report_path);
    }

    info!(
        "Complete: {} sentiment ({:.2}), agent rating {}/10",
        analysis.sentiment_score.overall.as_str(),
        analysis.sentiment_score.score,
        analysis.agent_score.rating
    );
    Ok(())
}

/// Analyze recordings with a transcript and no analysis, keeping the rest as-is
async fn analyze_pending<G: Generator + 'static>(
    analyzer: Arc<Analyzer<G>>,
    recordings: Vec<CallRecording>,
    concurrency: usize,
) -> Vec<CallRecording> {
    let (pending, mut done): (Vec<_>, Vec<_>) = recordings
        .into_iter()
        .partition(|r| !r.is_analyzed() && r.transcript.is_some());
    info!("Analyzing {} recordings", pending.len());

    for (recording, result) in analyzer.analyze_batch(pending, concurrency).await {
        if let Err(e) = result {
            warn!("Leaving recording {} unanalyzed: {}", recording.id, e);
        }
        done.push(recording);
    }
    done
}
