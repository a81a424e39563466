use std::cmp::Ordering;
use std::collections::HashSet;

use matchmvp_models::{MvpDecision, PlayerStat, ScoreComponent, SelectorConfig, StatCategory};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::SelectionError;

/// A player's composite score, broken down per category.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub total: Decimal,
    pub components: Vec<ScoreComponent>,
}

/// Deterministic MVP policy: eligibility filter, dominance filter, weighted
/// composite score, then a total-order tie-break. The result never depends on
/// input order.
///
/// A player beaten on both goals+assists and rating by another eligible player
/// is never a candidate, so a strict leader in both wins whatever the weights.
#[derive(Debug, Clone)]
pub struct MvpSelector {
    config: SelectorConfig,
}

impl MvpSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn is_eligible(&self, player: &PlayerStat) -> bool {
        player.minutes_played >= self.config.min_minutes
    }

    pub fn score(&self, player: &PlayerStat) -> ScoreCard {
        let w = &self.config.weights;
        let hundred = Decimal::ONE_HUNDRED;

        let passing = player.pass_accuracy.clamp(Decimal::ZERO, hundred) / hundred * w.pass_accuracy
            + Decimal::from(player.key_passes) * w.key_pass;
        let duels = player.duel_win_rate().unwrap_or_default() * w.duel_win_rate;
        let discipline = -(Decimal::from(player.yellow_cards) * w.yellow_card
            + Decimal::from(player.red_cards) * w.red_card);

        let components = vec![
            component(
                StatCategory::Goals,
                Decimal::from(player.goals) * w.goal,
                plural(player.goals, "goal"),
            ),
            component(
                StatCategory::Assists,
                Decimal::from(player.assists) * w.assist,
                plural(player.assists, "assist"),
            ),
            component(
                StatCategory::Rating,
                player.rating.unwrap_or_default() * w.rating,
                match player.rating {
                    Some(rating) => format!("rating {}", rating.normalize()),
                    None => "no rating".to_string(),
                },
            ),
            component(
                StatCategory::Passing,
                passing,
                format!(
                    "{}% pass accuracy, {}",
                    player.pass_accuracy.round_dp(1).normalize(),
                    plural(player.key_passes, "key pass")
                ),
            ),
            component(
                StatCategory::Defence,
                Decimal::from(player.defensive_actions()) * w.defensive_action,
                format!(
                    "{} tackles won, {} interceptions",
                    player.tackles_won, player.interceptions
                ),
            ),
            component(
                StatCategory::Duels,
                duels,
                format!("{}/{} duels won", player.duels_won, player.duels_total),
            ),
            component(
                StatCategory::Discipline,
                discipline,
                format!(
                    "{}, {}",
                    plural(player.yellow_cards, "yellow card"),
                    plural(player.red_cards, "red card")
                ),
            ),
            component(
                StatCategory::Minutes,
                Decimal::from(player.minutes_played) / Decimal::from(90) * w.full_match,
                format!("{} minutes", player.minutes_played),
            ),
        ];

        let total = components.iter().map(|c| c.points).sum();
        ScoreCard { total, components }
    }

    pub fn select(&self, players: &[PlayerStat]) -> Result<MvpDecision, SelectionError> {
        let mut seen = HashSet::new();
        if let Some(dup) = players.iter().find(|p| !seen.insert(p.player_id.as_str())) {
            return Err(SelectionError::DuplicatePlayer(dup.player_id.clone()));
        }

        let eligible: Vec<&PlayerStat> = players.iter().filter(|p| self.is_eligible(p)).collect();
        let scored: Vec<(&PlayerStat, ScoreCard)> = eligible
            .iter()
            .filter(|p| !eligible.iter().any(|rival| outranks(rival, p)))
            .map(|&p| (p, self.score(p)))
            .collect();

        let top = scored
            .iter()
            .map(|(_, card)| card.total)
            .max()
            .ok_or(SelectionError::InsufficientData {
                total: players.len(),
                min_minutes: self.config.min_minutes,
            })?;

        let (winner, card) = scored
            .iter()
            .filter(|(_, card)| top - card.total <= self.config.tie_epsilon)
            .min_by(|(a, _), (b, _)| tie_break(a, b))
            .ok_or(SelectionError::InsufficientData {
                total: players.len(),
                min_minutes: self.config.min_minutes,
            })?;

        let candidates = scored.len();
        let eligible = eligible.len();
        let excluded = players.len() - eligible;
        debug!(
            eligible,
            candidates,
            excluded,
            winner = %winner.player_id,
            total = %card.total,
            "Scored players"
        );

        let mut contributing: Vec<ScoreComponent> = card
            .components
            .iter()
            .filter(|c| !c.points.is_zero())
            .cloned()
            .collect();
        contributing.sort_by(|a, b| {
            b.points
                .abs()
                .cmp(&a.points.abs())
                .then(a.category.cmp(&b.category))
        });

        let score = card.total.round_dp(2);
        let rationale = self.template_rationale(winner, score, &contributing, eligible, excluded);

        Ok(MvpDecision {
            player_id: winner.player_id.clone(),
            name: winner.name.clone(),
            team: winner.team.clone(),
            score,
            rationale,
            contributing_stats: contributing,
            eligible_players: eligible,
            excluded_players: excluded,
        })
    }

    fn template_rationale(
        &self,
        winner: &PlayerStat,
        score: Decimal,
        contributing: &[ScoreComponent],
        eligible: usize,
        excluded: usize,
    ) -> String {
        let highlights: Vec<&str> = contributing
            .iter()
            .filter(|c| c.points > Decimal::ZERO)
            .take(3)
            .map(|c| c.detail.as_str())
            .collect();

        let mut text = format!(
            "{} ({}) is the MVP with a score of {}",
            winner.name, winner.team, score
        );
        if !highlights.is_empty() {
            text.push_str(&format!(", led by {}", highlights.join("; ")));
        }
        text.push_str(&format!(". Chosen from {eligible} eligible players"));
        if excluded > 0 {
            text.push_str(&format!(
                " ({excluded} excluded for playing under {} minutes)",
                self.config.min_minutes
            ));
        }
        text.push('.');
        text
    }
}

/// Strictly more goals+assists and a strictly higher rating (absent lowest).
fn outranks(a: &PlayerStat, b: &PlayerStat) -> bool {
    a.goal_contributions() > b.goal_contributions() && a.rating > b.rating
}

/// goals+assists desc, then rating desc (absent lowest), then playerId asc.
fn tie_break(a: &PlayerStat, b: &PlayerStat) -> Ordering {
    b.goal_contributions()
        .cmp(&a.goal_contributions())
        .then_with(|| b.rating.cmp(&a.rating))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

fn component(category: StatCategory, points: Decimal, detail: String) -> ScoreComponent {
    ScoreComponent {
        category,
        points,
        detail,
    }
}

fn plural(count: u32, noun: &str) -> String {
    match count {
        1 => format!("1 {noun}"),
        n if noun.ends_with("ss") => format!("{n} {noun}es"),
        n => format!("{n} {noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::player;
    use rust_decimal_macros::dec;

    fn selector() -> MvpSelector {
        MvpSelector::new(SelectorConfig::default())
    }

    #[test]
    fn minimum_minutes_boundary() {
        let s = selector();
        assert!(s.is_eligible(&player("1", "A", "X").minutes(5).build()));
        assert!(!s.is_eligible(&player("2", "B", "X").minutes(4).build()));
    }

    #[test]
    fn all_below_minimum_is_insufficient() {
        let players = vec![
            player("1", "Late Sub", "Barcelona").minutes(4).goals(2).build(),
            player("2", "Unused", "Barcelona").build(),
        ];
        assert_eq!(
            selector().select(&players),
            Err(SelectionError::InsufficientData {
                total: 2,
                min_minutes: 5
            })
        );
        assert_eq!(
            selector().select(&[]),
            Err(SelectionError::InsufficientData {
                total: 0,
                min_minutes: 5
            })
        );
    }

    #[test]
    fn substitute_with_hat_trick_excluded_below_minimum() {
        let players = vec![
            player("1", "Super Sub", "Real Madrid").minutes(4).goals(3).build(),
            player("2", "Starter", "Real Madrid").minutes(90).rating(dec!(6.8)).build(),
        ];
        let decision = selector().select(&players).unwrap();
        assert_eq!(decision.player_id, "2");
        assert_eq!(decision.eligible_players, 1);
        assert_eq!(decision.excluded_players, 1);
        assert!(decision.rationale.contains("1 excluded for playing under 5 minutes"));
    }

    #[test]
    fn clear_leader_wins() {
        let players = vec![
            player("5", "Jude Bellingham", "Real Madrid")
                .minutes(90)
                .goals(1)
                .assists(1)
                .rating(dec!(8.5))
                .pass_accuracy(dec!(88))
                .build(),
            player("9", "Robert Lewandowski", "Barcelona")
                .minutes(90)
                .rating(dec!(7.1))
                .pass_accuracy(dec!(80))
                .build(),
            player("8", "Ilkay Gundogan", "Barcelona")
                .minutes(90)
                .assists(1)
                .rating(dec!(7.6))
                .pass_accuracy(dec!(92))
                .build(),
        ];
        let decision = selector().select(&players).unwrap();
        assert_eq!(decision.name, "Jude Bellingham");
        assert_eq!(decision.contributing_stats[0].category, StatCategory::Goals);
        assert!(decision.rationale.starts_with("Jude Bellingham (Real Madrid) is the MVP"));
        assert!(decision.rationale.contains("1 goal"));
    }

    #[test]
    fn score_components_follow_weights() {
        let stat = player("1", "A", "X")
            .minutes(90)
            .goals(2)
            .assists(1)
            .rating(dec!(7.5))
            .pass_accuracy(dec!(80))
            .key_passes(3)
            .tackles(2)
            .interceptions(2)
            .duels(6, 8)
            .yellow_cards(1)
            .build();
        let card = selector().score(&stat);

        let points = |category| {
            card.components
                .iter()
                .find(|c| c.category == category)
                .unwrap()
                .points
        };
        assert_eq!(points(StatCategory::Goals), dec!(20));
        assert_eq!(points(StatCategory::Assists), dec!(7));
        assert_eq!(points(StatCategory::Rating), dec!(7.5));
        assert_eq!(points(StatCategory::Passing), dec!(5.4));
        assert_eq!(points(StatCategory::Defence), dec!(2));
        assert_eq!(points(StatCategory::Duels), dec!(1.5));
        assert_eq!(points(StatCategory::Discipline), dec!(-2));
        assert_eq!(points(StatCategory::Minutes), dec!(1));
        assert_eq!(card.total, dec!(42.4));
    }

    #[test]
    fn absent_rating_scores_zero() {
        let rated = player("1", "A", "X").minutes(90).rating(dec!(6.0)).build();
        let unrated = player("2", "B", "X").minutes(90).build();
        let s = selector();
        assert_eq!(s.score(&rated).total - s.score(&unrated).total, dec!(6.0));
    }

    #[test]
    fn duels_normalised_by_attempts() {
        let s = selector();
        let busy = player("1", "A", "X").minutes(90).duels(10, 20).build();
        let tidy = player("2", "B", "X").minutes(90).duels(3, 6).build();
        let none = player("3", "C", "X").minutes(90).build();
        assert_eq!(s.score(&busy).total, s.score(&tidy).total);
        assert_eq!(s.score(&busy).total - s.score(&none).total, dec!(1));
    }

    #[test]
    fn cards_are_penalised() {
        let s = selector();
        let clean = player("1", "A", "X").minutes(90).goals(1).build();
        let booked = player("2", "B", "X").minutes(90).goals(1).yellow_cards(1).build();
        let sent_off = player("3", "C", "X").minutes(90).goals(1).red_cards(1).build();
        assert_eq!(s.score(&clean).total - s.score(&booked).total, dec!(2));
        assert_eq!(s.score(&clean).total - s.score(&sent_off).total, dec!(6));

        let decision = s.select(&[booked, clean, sent_off]).unwrap();
        assert_eq!(decision.player_id, "1");
    }

    fn permutations(players: &[PlayerStat]) -> Vec<Vec<PlayerStat>> {
        if players.len() <= 1 {
            return vec![players.to_vec()];
        }
        let mut all = Vec::new();
        for i in 0..players.len() {
            let mut rest = players.to_vec();
            let first = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, first.clone());
                all.push(tail);
            }
        }
        all
    }

    #[test]
    fn input_order_does_not_matter() {
        let players = vec![
            player("3", "C", "X").minutes(90).goals(1).rating(dec!(7.0)).build(),
            player("1", "A", "Y").minutes(90).assists(2).rating(dec!(7.2)).build(),
            player("2", "B", "X").minutes(60).goals(1).assists(1).build(),
            player("4", "D", "Y").minutes(3).goals(2).build(),
            player("5", "E", "Y").minutes(90).key_passes(25).rating(dec!(6.5)).build(),
        ];
        let expected = selector().select(&players).unwrap();
        assert_eq!(expected.player_id, "1");

        let orders = permutations(&players);
        assert_eq!(orders.len(), 120);
        for order in orders {
            assert_eq!(selector().select(&order).unwrap(), expected);
        }
    }

    #[test]
    fn tied_twins_resolve_identically_in_every_order() {
        let players = vec![
            player("20", "Twin B", "X").minutes(90).goals(1).rating(dec!(7.0)).build(),
            player("10", "Twin A", "X").minutes(90).goals(1).rating(dec!(7.0)).build(),
            player("30", "Keeper", "Y").minutes(90).rating(dec!(6.8)).build(),
            player("40", "Winger", "Y").minutes(75).assists(1).rating(dec!(6.9)).build(),
        ];
        for order in permutations(&players) {
            assert_eq!(selector().select(&order).unwrap().player_id, "10");
        }
    }

    #[test]
    fn strict_leader_beats_any_lower_tier_profile() {
        let leader = player("1", "Leader", "X")
            .minutes(90)
            .goals(1)
            .rating(dec!(7.0))
            .pass_accuracy(dec!(70))
            .build();
        let workers = vec![
            player("2", "Worker", "Y")
                .minutes(90)
                .rating(dec!(6.9))
                .pass_accuracy(dec!(95))
                .key_passes(6)
                .tackles(6)
                .interceptions(4)
                .duels(10, 12)
                .build(),
            player("3", "Playmaker", "Y")
                .minutes(90)
                .rating(dec!(6.9))
                .pass_accuracy(dec!(100))
                .key_passes(30)
                .build(),
            player("4", "Destroyer", "Y")
                .minutes(90)
                .rating(dec!(6.5))
                .tackles(25)
                .interceptions(25)
                .duels(20, 20)
                .build(),
            player("5", "Unrated", "Y")
                .minutes(90)
                .key_passes(15)
                .tackles(10)
                .duels(9, 9)
                .build(),
        ];

        let s = selector();
        for worker in &workers {
            assert!(s.score(worker).total > s.score(&leader).total, "{}", worker.name);
            let decision = s.select(&[worker.clone(), leader.clone()]).unwrap();
            assert_eq!(decision.name, "Leader", "against {}", worker.name);
        }

        let mut everyone = workers.clone();
        everyone.push(leader);
        let decision = s.select(&everyone).unwrap();
        assert_eq!(decision.name, "Leader");
        assert_eq!(decision.eligible_players, 5);
    }

    #[test]
    fn level_rating_keeps_both_as_candidates() {
        // Equal ratings: neither outranks the other, so score decides.
        let scorer = player("1", "Scorer", "X").minutes(90).goals(1).rating(dec!(7.0)).build();
        let creator = player("2", "Creator", "Y")
            .minutes(90)
            .rating(dec!(7.0))
            .key_passes(14)
            .build();
        assert_eq!(selector().select(&[scorer, creator]).unwrap().name, "Creator");
    }

    #[test]
    fn tie_prefers_goal_contributions() {
        // 1 goal (10) vs 10 key passes (10): level on score.
        let scorer = player("b", "Scorer", "X").minutes(90).goals(1).build();
        let creator = player("a", "Creator", "X").minutes(90).key_passes(10).build();
        let s = selector();
        assert_eq!(s.score(&scorer).total, s.score(&creator).total);
        assert_eq!(s.select(&[creator, scorer]).unwrap().name, "Scorer");
    }

    #[test]
    fn tie_then_prefers_rating_with_absent_lowest() {
        // 7.0 rating + 1 key pass vs no rating + 8 key passes: both 8 points.
        let rated = player("b", "Rated", "X").minutes(90).rating(dec!(7.0)).key_passes(1).build();
        let unrated = player("a", "Unrated", "X").minutes(90).key_passes(8).build();
        let s = selector();
        assert_eq!(s.score(&rated).total, s.score(&unrated).total);
        assert_eq!(s.select(&[unrated, rated]).unwrap().name, "Rated");
    }

    #[test]
    fn tie_finally_by_player_id() {
        let twin_b = player("20", "Twin B", "X").minutes(90).goals(1).build();
        let twin_a = player("10", "Twin A", "X").minutes(90).goals(1).build();
        let s = selector();
        assert_eq!(s.select(&[twin_b.clone(), twin_a.clone()]).unwrap().player_id, "10");
        assert_eq!(s.select(&[twin_a, twin_b]).unwrap().player_id, "10");
    }

    #[test]
    fn scores_within_epsilon_are_tied() {
        // 0.006 apart: the lower score wins on goal contributions.
        let ahead = player("1", "Ahead", "X")
            .minutes(90)
            .pass_accuracy(dec!(0.2))
            .key_passes(10)
            .build();
        let scorer = player("2", "Scorer", "X").minutes(90).goals(1).build();
        let s = selector();
        assert!(s.score(&ahead).total > s.score(&scorer).total);
        assert_eq!(s.select(&[ahead, scorer]).unwrap().name, "Scorer");
    }

    #[test]
    fn pass_accuracy_capped_at_full_marks() {
        let s = selector();
        let perfect = player("1", "A", "X").minutes(90).pass_accuracy(dec!(100)).build();
        let bogus = player("2", "B", "X").minutes(90).pass_accuracy(dec!(340)).build();
        assert_eq!(s.score(&perfect).total, s.score(&bogus).total);
    }

    #[test]
    fn duplicate_player_rejected() {
        let p = player("7", "Joselu", "Real Madrid").minutes(90).build();
        assert_eq!(
            selector().select(&[p.clone(), p]),
            Err(SelectionError::DuplicatePlayer("7".to_string()))
        );
    }

    #[test]
    fn contributing_stats_skip_zero_and_rank_by_weight() {
        let stat = player("1", "A", "X").minutes(90).goals(1).yellow_cards(1).build();
        let decision = selector().select(&[stat]).unwrap();
        let categories: Vec<StatCategory> = decision
            .contributing_stats
            .iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(
            categories,
            [StatCategory::Goals, StatCategory::Discipline, StatCategory::Minutes]
        );
        assert_eq!(decision.score, dec!(9));
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "goal"), "1 goal");
        assert_eq!(plural(0, "assist"), "0 assists");
        assert_eq!(plural(2, "key pass"), "2 key passes");
    }
}
