// Feeds a recorded list of inbound frames into a game session. Useful for reproducing
// synchronization problems without a server.

use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use instant::Instant;
use live_chess::config::ClientConfig;
use live_chess::event::{GameDetails, Topic, WireFrame};
use live_chess::rules::StandardChessOracle;
use live_chess::session::{GameSession, SessionEvent};
use live_chess::transport::ChannelTransport;
use log::warn;
use serde::Deserialize;

use crate::tui;


pub struct ReplayConfig {
    pub details_file: String,
    pub transcript_file: String,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct TranscriptEntry {
    #[serde(flatten)]
    pub frame: WireFrame,
    // Time since the session was created.
    #[serde(default)]
    pub at_ms: u64,
}

// One JSON object per line. Empty lines and lines starting with '#' are skipped.
pub fn parse_transcript(text: &str) -> anyhow::Result<Vec<TranscriptEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|(line_idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Bad transcript entry at line {}", line_idx + 1))
        })
        .collect()
}

fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::MoveApplied(record) => format!("move #{}: {}", record.index, record.mv),
        SessionEvent::TimingUpdated { index } => format!("timing for move #{index}"),
        SessionEvent::MovesRetracted { from_index } => format!("retracted from #{from_index}"),
        SessionEvent::PromotionPieceNeeded(mv) => format!("promotion piece needed for {mv}"),
        SessionEvent::GameOver => "game over".to_owned(),
    }
}

pub fn run(config: ReplayConfig) -> anyhow::Result<()> {
    let details_text = std::fs::read_to_string(&config.details_file)
        .with_context(|| format!("Failed to read '{}'", config.details_file))?;
    let details: GameDetails = serde_json::from_str(&details_text)
        .with_context(|| format!("Failed to parse '{}'", config.details_file))?;
    let transcript_text = std::fs::read_to_string(&config.transcript_file)
        .with_context(|| format!("Failed to read '{}'", config.transcript_file))?;
    let transcript = parse_transcript(&transcript_text)?;

    // Outgoing messages are kept to avoid "transport is closed" noise, then discarded.
    let (tx, rx) = mpsc::channel();
    let t0 = Instant::now();
    let mut session = GameSession::new(
        details,
        Rc::new(ChannelTransport::new(tx)),
        Rc::new(StandardChessOracle),
        &ClientConfig::default(),
        t0,
    )?;
    session.add_observer(|event| println!("  {}", describe_event(event)));

    let mut now = t0;
    for entry in transcript {
        now = t0 + Duration::from_millis(entry.at_ms);
        let Some(topic) = Topic::parse(&entry.frame.topic) else {
            warn!("Skipping frame with unknown topic '{}'", entry.frame.topic);
            continue;
        };
        println!("[{} ms] {topic}", entry.at_ms);
        session.process_message(&topic, entry.frame.payload, now);
    }
    println!("\n{}", tui::render_session(&session, now));
    println!("Final position: {}", session.position().to_fen());
    println!("Messages sent by the client: {}", rx.try_iter().count());
    Ok(())
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn transcript_format() {
        let text = r#"
# opening
{"topic": "game/g1/move", "payload": {"index": 1, "from": 52, "to": 36}, "at_ms": 1500}

{"topic": "game/g1/move", "payload": {"index": 0, "from": 12, "to": 28}}
"#;
        let entries = parse_transcript(text).unwrap();
        assert_eq!(entries, vec![
            TranscriptEntry {
                frame: WireFrame {
                    topic: "game/g1/move".to_owned(),
                    payload: json!({ "index": 1, "from": 52, "to": 36 }),
                },
                at_ms: 1500,
            },
            TranscriptEntry {
                frame: WireFrame {
                    topic: "game/g1/move".to_owned(),
                    payload: json!({ "index": 0, "from": 12, "to": 28 }),
                },
                at_ms: 0,
            },
        ]);
    }

    #[test]
    fn bad_transcript_line() {
        let err = parse_transcript("{\"topic\": \"game\"}\nnot json\n").unwrap_err();
        assert_eq!(err.to_string(), "Bad transcript entry at line 2");
    }
}
