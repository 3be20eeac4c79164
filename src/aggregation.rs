//! Availability aggregation.
//!
//! [aggregate] folds an event's participants and availability rows into a per-slot heatmap
//! and ranks the best matching slots. Every view (dashboard summary, event page, analytics)
//! renders from the same [Aggregation], recomputed in full from the current rows on each
//! request.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Availability, Event, Participant};

/// Number of slots reported in [Aggregation::best_matches].
pub const BEST_MATCH_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRef {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl From<&Participant> for ParticipantRef {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            color: p.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSummary {
    pub time_block: String,
    pub count: usize,
    pub participants: Vec<ParticipantRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub slots: Vec<SlotSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMatch {
    pub date: NaiveDate,
    pub time_block: String,
    pub count: usize,
    pub percentage: f64,
    pub participants: Vec<ParticipantRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantTotal {
    pub participant: ParticipantRef,
    pub available_slots: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub total_participants: usize,
    /// Participants with at least one available slot.
    pub responded_participants: usize,
    pub total_slots: usize,
    pub days: Vec<DaySummary>,
    pub best_matches: Vec<BestMatch>,
    pub participant_totals: Vec<ParticipantTotal>,
}

impl Aggregation {
    pub fn slot(&self, date: NaiveDate, time_block: &str) -> Option<&SlotSummary> {
        self.days
            .iter()
            .find(|day| day.date == date)?
            .slots
            .iter()
            .find(|slot| slot.time_block == time_block)
    }
}

/// Share of participants available, in percent, rounded to one decimal.
///
/// Returns 0 when there are no participants.
pub fn percentage(count: usize, total_participants: usize) -> f64 {
    if total_participants == 0 {
        return 0.0;
    }
    let raw = count as f64 / total_participants as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

pub fn aggregate(
    event: &Event,
    participants: &[Participant],
    availability: &[Availability],
) -> Aggregation {
    let mut days: Vec<DaySummary> = event
        .dates()
        .map(|date| DaySummary {
            date,
            slots: event
                .time_blocks
                .iter()
                .map(|block| SlotSummary {
                    time_block: block.clone(),
                    count: 0,
                    participants: Vec::new(),
                })
                .collect(),
        })
        .collect();

    let mut index: HashMap<(NaiveDate, &str), (usize, usize)> = HashMap::new();
    for (day_idx, day) in days.iter().enumerate() {
        for (slot_idx, block) in event.time_blocks.iter().enumerate() {
            index.insert((day.date, block.as_str()), (day_idx, slot_idx));
        }
    }

    let by_id: HashMap<Uuid, &Participant> = participants.iter().map(|p| (p.id, p)).collect();
    let mut per_participant: HashMap<Uuid, usize> = HashMap::new();

    for record in availability.iter().filter(|r| r.available) {
        let Some(&(day_idx, slot_idx)) = index.get(&(record.date, record.time_block.as_str()))
        else {
            continue;
        };
        let Some(participant) = by_id.get(&record.participant_id) else {
            continue;
        };
        let slot = &mut days[day_idx].slots[slot_idx];
        if slot.participants.iter().any(|p| p.id == participant.id) {
            continue;
        }
        slot.count += 1;
        slot.participants.push(ParticipantRef::from(*participant));
        *per_participant.entry(participant.id).or_default() += 1;
    }

    let total_participants = participants.len();

    // `days` is already chronological, so the stable sort ranks the earliest slot first
    // among equal counts.
    let mut ranked: Vec<(NaiveDate, &SlotSummary)> = days
        .iter()
        .flat_map(|day| day.slots.iter().map(move |slot| (day.date, slot)))
        .filter(|(_, slot)| slot.count > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));

    let best_matches = ranked
        .into_iter()
        .take(BEST_MATCH_LIMIT)
        .map(|(date, slot)| BestMatch {
            date,
            time_block: slot.time_block.clone(),
            count: slot.count,
            percentage: percentage(slot.count, total_participants),
            participants: slot.participants.clone(),
        })
        .collect();

    let participant_totals: Vec<ParticipantTotal> = participants
        .iter()
        .map(|p| ParticipantTotal {
            participant: ParticipantRef::from(p),
            available_slots: per_participant.get(&p.id).copied().unwrap_or(0),
        })
        .collect();

    Aggregation {
        total_participants,
        responded_participants: per_participant.len(),
        total_slots: days.len() * event.time_blocks.len(),
        days,
        best_matches,
        participant_totals,
    }
}
