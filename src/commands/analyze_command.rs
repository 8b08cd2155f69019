//! `sonargate analyze`: run the analyzer suite over a single file.

use crate::cli::table::{render, AnalyzerResultRow};
use crate::cli::ui::print_error;
use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::core::analyzers::channel_topology::ChannelTopologyAnalyzer;
use crate::core::analyzers::clipping::ClippingAnalyzer;
use crate::core::analyzers::club_stress::ClubStressAnalyzer;
use crate::core::analyzers::gain_reduction::GainReductionAnalyzer;
use crate::core::analyzers::intersample_peak::IntersamplePeakAnalyzer;
use crate::core::analyzers::loudness::LoudnessAnalyzer;
use crate::core::analyzers::replaygain::ReplayGainAnalyzer;
use crate::core::analyzers::spectral_balance::SpectralBalanceAnalyzer;
use crate::core::analyzers::{Analyzer, AnalyzerOptions};

/// Execute `sonargate analyze`.
///
/// The metadata checker is omitted here: its `analyze()` is a neutral stub
/// that requires pre-extracted tags via its synchronous `classify()`
/// method, and no tag-extraction pass exists on this path.
pub async fn execute(args: AnalyzeArgs, config: &Config) -> crate::Result<()> {
    let options = AnalyzerOptions {
        tool_path: config.invoker.tool_path.clone(),
        timeout_secs: config.invoker.timeout_secs,
    };

    let platforms = if args.platforms.is_empty() {
        vec!["spotify".to_string(), "apple_music".to_string()]
    } else {
        args.platforms.clone()
    };

    let loudness = LoudnessAnalyzer::new(&options);
    let intersample_peak = IntersamplePeakAnalyzer::new(&options);
    let clipping = ClippingAnalyzer::new(&options);
    let club_stress = ClubStressAnalyzer::new(&options);
    let channel_topology = ChannelTopologyAnalyzer::new(&options);
    let spectral_balance = SpectralBalanceAnalyzer::new(&options);
    let gain_reduction = GainReductionAnalyzer::new(&options);
    let replaygain = ReplayGainAnalyzer::new(&options, platforms);

    let (loudness, intersample_peak, clipping, club_stress, channel_topology, spectral_balance, gain_reduction, replaygain) = tokio::join!(
        loudness.analyze(&args.path, &options),
        intersample_peak.analyze(&args.path, &options),
        clipping.analyze(&args.path, &options),
        club_stress.analyze(&args.path, &options),
        channel_topology.analyze(&args.path, &options),
        spectral_balance.analyze(&args.path, &options),
        gain_reduction.analyze(&args.path, &options),
        replaygain.analyze(&args.path, &options),
    );

    let mut rows = Vec::new();
    let mut reports = serde_json::Map::new();
    for (name, result) in [
        ("loudness", loudness),
        ("intersample_peak", intersample_peak),
        ("clipping", clipping),
        ("club_stress", club_stress),
        ("channel_topology", channel_topology),
        ("spectral_balance", spectral_balance),
        ("gain_reduction", gain_reduction),
        ("replaygain", replaygain),
    ] {
        match result {
            Ok(report) => {
                rows.push(AnalyzerResultRow {
                    analyzer: name.to_string(),
                    status: report.status.clone(),
                    confidence: format!("{:.2}", report.confidence),
                    description: report.description.clone(),
                });
                reports.insert(name.to_string(), serde_json::to_value(&report)?);
            }
            Err(e) => print_error(&format!("{name}: {}", e.user_friendly_message())),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("{}", render(rows));
    }

    Ok(())
}
