use crate::core::agent::Agent;
use crate::interfaces::render_interface::LeaderboardEntry;
use std::cmp::Ordering;
use std::time::Instant;

/// cmp_race_order orders two agents by race progress: retired agents last, then more completed
/// laps first, then more distance first. Two retired agents compare equal.
pub fn cmp_race_order(a: &Agent, b: &Agent) -> Ordering {
    match (a.is_dnf(), b.is_dnf()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.lap().cmp(&a.lap()).then_with(|| {
            b.distance()
                .partial_cmp(&a.distance())
                .unwrap_or(Ordering::Equal)
        }),
    }
}

/// rank_agents returns the store indices of all agents in race order. The sort is stable with
/// respect to the store order, so ranking an unchanged store always yields the same order.
pub fn rank_agents(agents: &[Agent]) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..agents.len()).collect();
    idxs.sort_by(|&a, &b| cmp_race_order(&agents[a], &agents[b]));
    idxs
}

/// rank_of returns the 0-based rank of the agent with the given id, if it exists.
pub fn rank_of(agents: &[Agent], ranking: &[usize], agent_id: u32) -> Option<usize> {
    ranking.iter().position(|&idx| agents[idx].id == agent_id)
}

/// calc_heart_rate returns the cosmetic heart rate for a 1-based rank.
pub fn calc_heart_rate(rank: usize, is_raining: bool, hr_variation: i32) -> i32 {
    let base = match (rank, is_raining) {
        (1, false) => 130,
        (1, true) => 135,
        (2..=3, false) => 145,
        (2..=3, true) => 150,
        (_, false) => 150,
        (_, true) => 155,
    };
    base + hr_variation
}

/// calc_win_probability returns the cosmetic win probability band (%) for a 1-based rank.
pub fn calc_win_probability(rank: usize) -> u8 {
    match rank {
        1 => 80,
        2 => 15,
        3 => 4,
        _ => 1,
    }
}

/// calc_display_lap returns the lap shown by the lap counter: the leader's lap if it is racing,
/// else the lap of the first racing agent, else 0, capped at the total number of laps.
pub fn calc_display_lap(agents: &[Agent], ranking: &[usize], tot_no_laps: u32) -> u32 {
    let lap = ranking
        .iter()
        .map(|&idx| &agents[idx])
        .find(|agent| agent.is_racing())
        .map(|agent| agent.lap())
        .unwrap_or(0);

    lap.min(tot_no_laps)
}

/// derive_leaderboard creates the ranked leaderboard rows from the agent store.
pub fn derive_leaderboard(
    agents: &[Agent],
    ranking: &[usize],
    is_raining: bool,
    now: Instant,
) -> Vec<LeaderboardEntry> {
    ranking
        .iter()
        .enumerate()
        .map(|(i, &idx)| {
            let agent = &agents[idx];
            let rank = i + 1;

            LeaderboardEntry {
                rank,
                id: agent.id,
                name: agent.name.to_owned(),
                tire_laps: agent.tire_laps(),
                status: agent.status_kind(),
                pit_remaining_s: agent.pit_remaining(now).map(|t| t.as_secs_f64()),
                heart_rate: if agent.is_racing() {
                    Some(calc_heart_rate(rank, is_raining, agent.hr_variation))
                } else {
                    None
                },
                win_probability: if agent.is_dnf() {
                    None
                } else {
                    Some(calc_win_probability(rank))
                },
            }
        })
        .collect()
}
