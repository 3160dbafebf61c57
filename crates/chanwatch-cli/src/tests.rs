use chanwatch_core::{Channel, ChannelStatus, ClassificationVerdict, HistoryPoint};
use chanwatch_engine::ChannelEvaluation;
use chrono::NaiveDate;

use super::*;

#[test]
fn parses_evaluate_with_url() {
    let cli = Cli::try_parse_from([
        "chanwatch-cli",
        "evaluate",
        "https://giphy.com/channel/opendroids",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Evaluate { ref channel, json: false })
            if channel == "https://giphy.com/channel/opendroids"
    ));
}

#[test]
fn parses_evaluate_json_flag() {
    let cli = Cli::try_parse_from(["chanwatch-cli", "evaluate", "robo", "--json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Evaluate { json: true, .. })
    ));
}

#[test]
fn evaluate_requires_a_channel() {
    assert!(Cli::try_parse_from(["chanwatch-cli", "evaluate"]).is_err());
}

#[test]
fn parses_refresh() {
    let cli = Cli::try_parse_from(["chanwatch-cli", "refresh"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Refresh)));
}

#[test]
fn history_defaults_to_thirty_days() {
    let cli = Cli::try_parse_from(["chanwatch-cli", "history", "robo"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::History { days: 30, json: false, .. })
    ));
}

#[test]
fn history_accepts_days() {
    let cli = Cli::try_parse_from(["chanwatch-cli", "history", "robo", "--days", "7"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::History { days: 7, .. })
    ));
}

#[test]
fn parses_db_commands() {
    let cli = Cli::try_parse_from(["chanwatch-cli", "db", "ping"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
    let cli = Cli::try_parse_from(["chanwatch-cli", "db", "migrate"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["chanwatch-cli"]).unwrap();
    assert!(cli.command.is_none());
}

#[test]
fn resolve_channel_reads_urls_and_rejects_garbage() {
    assert_eq!(
        resolve_channel("https://giphy.com/opendroids").unwrap(),
        "opendroids"
    );
    assert!(resolve_channel("   ").is_err());
}

#[test]
fn render_evaluation_lists_reasons() {
    let mut channel = Channel::new("robo");
    channel.exists = true;
    channel.item_count = 10;
    channel.aggregate_views = 12_000;
    let evaluation = ChannelEvaluation {
        channel,
        verdict: ClassificationVerdict {
            status: ChannelStatus::Working,
            reasons: vec!["recent uploads (+30)".into(), "fallback score 55".into()],
            score: Some(55),
        },
        visibility: None,
        trend: None,
        fallback: None,
        items_refreshed: 9,
    };

    let out = evaluate::render_evaluation(&evaluation);
    assert!(out.contains("Status:  WORKING"));
    assert!(out.contains("Score:   55"));
    assert!(out.contains("10 (9 refreshed), 12000 total views"));
    assert!(out.contains("  - fallback score 55"));
}

#[test]
fn render_history_shows_daily_change() {
    let history = vec![
        HistoryPoint {
            date: NaiveDate::from_ymd_opt(2026, 5, 9).unwrap(),
            total_views: 1_000,
            items_recorded: 3,
        },
        HistoryPoint {
            date: NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
            total_views: 1_250,
            items_recorded: 3,
        },
    ];

    let out = snapshots::render_history(&history);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2026-05-09"));
    assert!(lines[1].trim_end().ends_with('-'));
    assert!(lines[2].trim_end().ends_with("+250"));
}
