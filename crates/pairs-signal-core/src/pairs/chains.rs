use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::signals::SignalRow;
use crate::types::SignalType;
use crate::{PairsError, PairsResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A signal-bearing date, located by its row position in the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub position: usize,
    pub date: NaiveDate,
    pub signal_type: SignalType,
}

/// A signal date labelled with its chain membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainedSignal {
    /// Row position in the frame the points were taken from
    pub position: usize,
    pub date: NaiveDate,
    pub signal_type: SignalType,
    /// 1-based, increments at every break
    pub chain_id: usize,
    /// 1-based position inside the chain
    pub internal_rank: usize,
    pub is_first: bool,
    pub is_last: bool,
}

impl From<&ChainedSignal> for SignalPoint {
    fn from(c: &ChainedSignal) -> Self {
        SignalPoint {
            position: c.position,
            date: c.date,
            signal_type: c.signal_type,
        }
    }
}

/// Aggregate view of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub chain_id: usize,
    /// Type of the chain's first signal
    pub signal_type: SignalType,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Signal-bearing rows of a frame, in frame order.
pub fn signal_points(rows: &[SignalRow]) -> Vec<SignalPoint> {
    rows.iter()
        .enumerate()
        .filter_map(|(position, row)| {
            row.signal_type().map(|signal_type| SignalPoint {
                position,
                date: row.date,
                signal_type,
            })
        })
        .collect()
}

/// Group signal dates into chains.
///
/// A chain breaks before a point when more than `max_gap_days` calendar days
/// lie strictly between it and the previous point; the first point always
/// opens a chain. Points must be in strictly ascending date order.
pub fn detect_chains(points: &[SignalPoint], max_gap_days: i64) -> PairsResult<Vec<ChainedSignal>> {
    let mut chained: Vec<ChainedSignal> = Vec::with_capacity(points.len());
    let mut chain_id = 0;
    let mut rank = 0;
    let mut prev: Option<NaiveDate> = None;

    for point in points {
        let is_break = match prev {
            None => true,
            Some(prev) => {
                if point.date <= prev {
                    return Err(PairsError::InvalidInput {
                        field: "dates".into(),
                        reason: format!(
                            "signal dates must be strictly ascending ({} followed by {})",
                            prev, point.date
                        ),
                    });
                }
                let days_between = (point.date - prev).num_days() - 1;
                days_between > max_gap_days
            }
        };

        if is_break {
            chain_id += 1;
            rank = 0;
            if let Some(last) = chained.last_mut() {
                last.is_last = true;
            }
        }
        rank += 1;

        chained.push(ChainedSignal {
            position: point.position,
            date: point.date,
            signal_type: point.signal_type,
            chain_id,
            internal_rank: rank,
            is_first: rank == 1,
            is_last: false,
        });
        prev = Some(point.date);
    }
    if let Some(last) = chained.last_mut() {
        last.is_last = true;
    }

    debug!(signals = points.len(), chains = chain_id, "chain detection");
    Ok(chained)
}

/// Chain-level summaries in chain order.
pub fn summarize_chains(chained: &[ChainedSignal]) -> Vec<ChainSummary> {
    let mut summaries: Vec<ChainSummary> = Vec::new();
    for c in chained {
        match summaries.last_mut() {
            Some(s) if s.chain_id == c.chain_id => {
                s.end = c.date;
                s.length += 1;
            }
            _ => summaries.push(ChainSummary {
                chain_id: c.chain_id,
                signal_type: c.signal_type,
                start: c.date,
                end: c.date,
                length: 1,
            }),
        }
    }
    summaries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
