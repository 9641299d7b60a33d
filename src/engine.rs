//! Turn resolution for a 3v3 battle between two agents.
//!
//! Each call to [`Battle::step`] plays one turn: both agents pick an action,
//! defends are raised, the initiative mode orders the remaining actions,
//! rewards are computed and handed back to each agent's learner.

use std::fmt;

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::agent::Agent;
use crate::character::Archetype;
use crate::players::{BattleRng, Player};
use crate::state::Action;

pub const KNOCKOUT_BONUS: f64 = 50.0;
pub const VICTORY_BONUS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitiativeMode {
    /// Switches resolve first, then both hits land without checking whether
    /// the other side already fell.
    Simultaneous,
    /// Faster side is more likely to act first.
    Probabilistic,
    /// Sides take turns acting first.
    Alternate,
    /// Faster side acts first, ties go to side A.
    Deterministic,
}

impl InitiativeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InitiativeMode::Simultaneous => "simultaneous",
            InitiativeMode::Probabilistic => "probabilistic",
            InitiativeMode::Alternate => "alternate",
            InitiativeMode::Deterministic => "deterministic",
        }
    }
}

impl fmt::Display for InitiativeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winner {
    A,
    B,
    Draw,
}

impl Winner {
    pub fn as_str(self) -> &'static str {
        match self {
            Winner::A => "A",
            Winner::B => "B",
            Winner::Draw => "draw",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that happened to one side during a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct SideReport {
    pub action: Action,
    /// Roster slot that chose the action.
    pub actor: usize,
    pub damage_dealt: i32,
    pub reward: f64,
    pub knocked_out: bool,
    /// Active slot before and after the turn, when it changed.
    pub active_change: Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub turn: u32,
    pub first: Option<Side>,
    pub a: SideReport,
    pub b: SideReport,
}

/// Decides who acts first in an ordered turn. `switch_a`/`switch_b` mark a
/// switch action, which always goes before a non-switch one.
pub fn choose_order(
    mode: InitiativeMode,
    switch_a: bool,
    switch_b: bool,
    speed_a: u32,
    speed_b: u32,
    alternate_toggle: &mut bool,
    rng: &mut BattleRng,
) -> Side {
    if switch_a != switch_b {
        return if switch_a { Side::A } else { Side::B };
    }
    match mode {
        InitiativeMode::Probabilistic => {
            let total = speed_a as f64 + speed_b as f64;
            let p_a = if total == 0.0 {
                0.5
            } else {
                speed_a as f64 / total
            };
            if rng.gen_bool(p_a) {
                Side::A
            } else {
                Side::B
            }
        }
        InitiativeMode::Alternate => {
            *alternate_toggle = !*alternate_toggle;
            if *alternate_toggle {
                Side::A
            } else {
                Side::B
            }
        }
        InitiativeMode::Deterministic | InitiativeMode::Simultaneous => {
            if speed_a >= speed_b {
                Side::A
            } else {
                Side::B
            }
        }
    }
}

/// Applies a non-defend action from `actor` against `target`. Returns damage dealt.
/// When `guarded`, dead actors and dead targets are skipped and a switch
/// needs a living bench member.
fn execute_action<P: Player, Q: Player>(
    actor: &mut Agent<P>,
    target: &mut Agent<Q>,
    action: Action,
    guarded: bool,
) -> i32 {
    match action {
        Action::Attack | Action::SuperAttack => {
            if guarded && (!actor.active().is_alive() || !target.active().is_alive()) {
                return 0;
            }
            let attacker = actor.active_mut();
            let defender = target.active_mut();
            if action == Action::Attack {
                attacker.attack(defender)
            } else {
                attacker.super_attack(defender)
            }
        }
        Action::Switch => {
            if guarded && !actor.has_switch_available() {
                return 0;
            }
            actor.perform_switch(None);
            0
        }
        // Raised before ordering.
        Action::Defend => 0,
    }
}

pub struct Battle<A: Player, B: Player> {
    agent_a: Agent<A>,
    agent_b: Agent<B>,
    initiative_mode: InitiativeMode,
    alternate_toggle: bool,
    rng: BattleRng,
    turn: u32,
    actions_log: Vec<String>,
    last_turn: Option<TurnReport>,
}

impl<A: Player, B: Player> Battle<A, B> {
    pub fn new(agent_a: Agent<A>, agent_b: Agent<B>, initiative_mode: InitiativeMode, seed: u64) -> Self {
        Battle {
            agent_a,
            agent_b,
            initiative_mode,
            alternate_toggle: false,
            rng: BattleRng::seed_from_u64(seed),
            turn: 0,
            actions_log: Vec::new(),
            last_turn: None,
        }
    }

    pub fn agent_a(&self) -> &Agent<A> {
        &self.agent_a
    }

    pub fn agent_b(&self) -> &Agent<B> {
        &self.agent_b
    }

    pub fn initiative_mode(&self) -> InitiativeMode {
        self.initiative_mode
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn actions_log(&self) -> &[String] {
        &self.actions_log
    }

    pub fn last_turn(&self) -> Option<&TurnReport> {
        self.last_turn.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.agent_a.all_fainted() || self.agent_b.all_fainted()
    }

    /// `None` while both teams still have someone standing.
    pub fn winner(&self) -> Option<Winner> {
        match (self.agent_a.all_fainted(), self.agent_b.all_fainted()) {
            (true, true) => Some(Winner::Draw),
            (false, true) => Some(Winner::A),
            (true, false) => Some(Winner::B),
            (false, false) => None,
        }
    }

    pub fn reset_episode(&mut self) {
        self.turn = 0;
        self.actions_log.clear();
        self.last_turn = None;
        self.agent_a.reset_for_episode();
        self.agent_b.reset_for_episode();
    }

    /// Plays one turn. Returns false once either team is fully knocked out.
    /// Must not be called again after it has returned false.
    pub fn step(&mut self) -> bool {
        self.turn += 1;

        let state_a = self.agent_a.get_state(&self.agent_b);
        let state_b = self.agent_b.get_state(&self.agent_a);

        let action_a = self.agent_a.choose_action(&self.agent_b);
        let action_b = self.agent_b.choose_action(&self.agent_a);

        let start_a = self.agent_a.active_index();
        let start_b = self.agent_b.active_index();
        let archetype_a = self.agent_a.active().archetype();
        let archetype_b = self.agent_b.active().archetype();

        if action_a == Action::Defend {
            self.agent_a.active_mut().defend();
        }
        if action_b == Action::Defend {
            self.agent_b.active_mut().defend();
        }

        let alive_a = self.agent_a.count_alive();
        let alive_b = self.agent_b.count_alive();

        let (damage_a, damage_b, first) = if self.initiative_mode == InitiativeMode::Simultaneous {
            // Switches land before either hit, whichever side makes them.
            let switch_a = action_a == Action::Switch;
            let switch_b = action_b == Action::Switch;
            if switch_a {
                execute_action(&mut self.agent_a, &mut self.agent_b, action_a, false);
            }
            if switch_b {
                execute_action(&mut self.agent_b, &mut self.agent_a, action_b, false);
            }
            let damage_a = if switch_a {
                0
            } else {
                execute_action(&mut self.agent_a, &mut self.agent_b, action_a, false)
            };
            let damage_b = if switch_b {
                0
            } else {
                execute_action(&mut self.agent_b, &mut self.agent_a, action_b, false)
            };
            (damage_a, damage_b, None)
        } else {
            let first = choose_order(
                self.initiative_mode,
                action_a == Action::Switch,
                action_b == Action::Switch,
                self.agent_a.active().speed(),
                self.agent_b.active().speed(),
                &mut self.alternate_toggle,
                &mut self.rng,
            );
            let (damage_a, damage_b) = match first {
                Side::A => {
                    let damage_a = execute_action(&mut self.agent_a, &mut self.agent_b, action_a, true);
                    let damage_b = execute_action(&mut self.agent_b, &mut self.agent_a, action_b, true);
                    (damage_a, damage_b)
                }
                Side::B => {
                    let damage_b = execute_action(&mut self.agent_b, &mut self.agent_a, action_b, true);
                    let damage_a = execute_action(&mut self.agent_a, &mut self.agent_b, action_a, true);
                    (damage_a, damage_b)
                }
            };
            (damage_a, damage_b, Some(first))
        };

        let mut reward_a = (damage_a - damage_b) as f64;
        let mut reward_b = (damage_b - damage_a) as f64;

        // Slots that fought this turn, before any forced replacement.
        let fought_a = self.agent_a.active_index();
        let fought_b = self.agent_b.active_index();

        let knocked_out_a = self.agent_a.count_alive() < alive_a;
        let knocked_out_b = self.agent_b.count_alive() < alive_b;
        if knocked_out_a {
            debug!(turn = self.turn, "A's {} was knocked out", self.agent_a.active());
            reward_a -= KNOCKOUT_BONUS;
            reward_b += KNOCKOUT_BONUS;
            self.agent_a.force_switch_if_fainted();
        }
        if knocked_out_b {
            debug!(turn = self.turn, "B's {} was knocked out", self.agent_b.active());
            reward_b -= KNOCKOUT_BONUS;
            reward_a += KNOCKOUT_BONUS;
            self.agent_b.force_switch_if_fainted();
        }

        let fainted_a = self.agent_a.all_fainted();
        let fainted_b = self.agent_b.all_fainted();
        if fainted_b && !fainted_a {
            reward_a += VICTORY_BONUS;
            reward_b -= VICTORY_BONUS;
        } else if fainted_a && !fainted_b {
            reward_a -= VICTORY_BONUS;
            reward_b += VICTORY_BONUS;
        }

        let end_a = self.agent_a.active_index();
        let end_b = self.agent_b.active_index();
        let report = TurnReport {
            turn: self.turn,
            first,
            a: SideReport {
                action: action_a,
                actor: start_a,
                damage_dealt: damage_a,
                reward: reward_a,
                knocked_out: knocked_out_a,
                active_change: (start_a != end_a).then_some((start_a, end_a)),
            },
            b: SideReport {
                action: action_b,
                actor: start_b,
                damage_dealt: damage_b,
                reward: reward_b,
                knocked_out: knocked_out_b,
                active_change: (start_b != end_b).then_some((start_b, end_b)),
            },
        };

        let line = self.describe_turn(&report, (archetype_a, archetype_b), (fought_a, fought_b));
        trace!("{}", line);
        self.actions_log.push(line);

        let next_state_a = self.agent_a.get_state(&self.agent_b);
        let next_state_b = self.agent_b.get_state(&self.agent_a);
        self.agent_a.update_q(state_a, action_a, reward_a, &next_state_a);
        self.agent_b.update_q(state_b, action_b, reward_b, &next_state_b);

        self.agent_a.reset_turn();
        self.agent_b.reset_turn();
        self.last_turn = Some(report);

        !(fainted_a || fainted_b)
    }

    /// `fought` holds the slots standing when the hits landed, so a knockout
    /// shows as 0 HP rather than the replacement's health.
    fn describe_turn(
        &self,
        report: &TurnReport,
        (archetype_a, archetype_b): (Archetype, Archetype),
        (fought_a, fought_b): (usize, usize),
    ) -> String {
        let fighter_a = &self.agent_a.team()[fought_a];
        let fighter_b = &self.agent_b.team()[fought_b];
        let mut line = format!(
            "Turn {}: A[{}]={} (dmg={}), B[{}]={} (dmg={}) | HP A={}/{} B={}/{} | alive A={} B={}",
            report.turn,
            archetype_a,
            report.a.action,
            report.a.damage_dealt,
            archetype_b,
            report.b.action,
            report.b.damage_dealt,
            fighter_a.health(),
            fighter_a.max_health(),
            fighter_b.health(),
            fighter_b.max_health(),
            self.agent_a.count_alive(),
            self.agent_b.count_alive(),
        );
        for (label, agent_change, team) in [
            ("A", report.a.active_change, self.agent_a.team()),
            ("B", report.b.active_change, self.agent_b.team()),
        ] {
            if let Some((from, to)) = agent_change {
                line.push_str(&format!(
                    " | {} switched {} -> {}",
                    label,
                    team[from].archetype(),
                    team[to].archetype()
                ));
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::players::{QLearningPlayer, RandomPlayer};
    use crate::q_table::QTable;
    use crate::state::DiscreteState;

    /// Plays a fixed action when allowed, attack otherwise.
    #[derive(Debug, Clone)]
    struct Scripted {
        action: Action,
    }

    impl Player for Scripted {
        fn choose_action(
            &self,
            _state: &DiscreteState,
            allowed: &[Action],
            _rng: &mut BattleRng,
        ) -> Action {
            if allowed.contains(&self.action) {
                self.action
            } else {
                Action::Attack
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn uniform_team(archetype: Archetype, side: &str) -> Vec<Character> {
        (0..3)
            .map(|i| Character::new(archetype, format!("{}_{}{}", archetype, side, i)))
            .collect()
    }

    fn scripted(team: Vec<Character>, action: Action, seed: u64) -> Agent<Scripted> {
        Agent::new(team, Scripted { action }, seed).unwrap()
    }

    fn mixed_team(side: &str) -> Vec<Character> {
        vec![
            Character::new(Archetype::Offensive, format!("Offensive_{}", side)),
            Character::new(Archetype::Hybrid, format!("Hybrid_{}", side)),
            Character::new(Archetype::Tank, format!("Tank_{}", side)),
        ]
    }

    #[test]
    fn test_deterministic_order() {
        let mut toggle = false;
        let mut rng = BattleRng::seed_from_u64(0);
        let mode = InitiativeMode::Deterministic;
        assert_eq!(Side::B, choose_order(mode, false, false, 6, 14, &mut toggle, &mut rng));
        assert_eq!(Side::A, choose_order(mode, false, false, 14, 6, &mut toggle, &mut rng));
        assert_eq!(Side::A, choose_order(mode, false, false, 10, 10, &mut toggle, &mut rng));
        assert_eq!(Side::A, choose_order(mode, true, true, 10, 10, &mut toggle, &mut rng));
    }

    #[test]
    fn test_switch_goes_first() {
        let mut toggle = false;
        let mut rng = BattleRng::seed_from_u64(0);
        for mode in [
            InitiativeMode::Deterministic,
            InitiativeMode::Probabilistic,
            InitiativeMode::Alternate,
        ] {
            assert_eq!(Side::A, choose_order(mode, true, false, 1, 100, &mut toggle, &mut rng));
            assert_eq!(Side::B, choose_order(mode, false, true, 100, 1, &mut toggle, &mut rng));
        }
    }

    #[test]
    fn test_alternate_order() {
        let mut toggle = false;
        let mut rng = BattleRng::seed_from_u64(0);
        let mode = InitiativeMode::Alternate;
        let order: Vec<Side> = (0..4)
            .map(|_| choose_order(mode, false, false, 1, 100, &mut toggle, &mut rng))
            .collect();
        assert_eq!(vec![Side::A, Side::B, Side::A, Side::B], order);
    }

    #[test]
    fn test_probabilistic_order() {
        let mut toggle = false;
        let mut rng = BattleRng::seed_from_u64(42);
        let mode = InitiativeMode::Probabilistic;

        for _ in 0..100 {
            assert_eq!(Side::A, choose_order(mode, false, false, 10, 0, &mut toggle, &mut rng));
            assert_eq!(Side::B, choose_order(mode, false, false, 0, 10, &mut toggle, &mut rng));
        }

        let a_first = (0..2000)
            .filter(|_| choose_order(mode, false, false, 14, 6, &mut toggle, &mut rng) == Side::A)
            .count();
        assert!(a_first > 1200 && a_first < 1600, "a_first = {}", a_first);

        let a_first = (0..2000)
            .filter(|_| choose_order(mode, false, false, 0, 0, &mut toggle, &mut rng) == Side::A)
            .count();
        assert!(a_first > 850 && a_first < 1150, "a_first = {}", a_first);
    }

    #[test]
    fn test_tank_beats_offensive() {
        let tanks = scripted(uniform_team(Archetype::Tank, "A"), Action::Attack, 1);
        let offensives = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(tanks, offensives, InitiativeMode::Deterministic, 3);

        assert!(battle.step());
        let report = battle.last_turn().unwrap();
        assert_eq!(Some(Side::B), report.first);
        assert_eq!(15, report.a.damage_dealt);
        assert_eq!(25, report.b.damage_dealt);
        assert_eq!(125, battle.agent_a().active().health());
        assert_eq!(55, battle.agent_b().active().health());

        let mut turns = 1;
        while battle.step() {
            turns += 1;
            assert_eq!(Some(Side::B), battle.last_turn().unwrap().first);
            assert!(turns < 100);
        }
        assert_eq!(17, battle.turn());
        assert_eq!(Some(Winner::A), battle.winner());
        assert!(battle.agent_b().all_fainted());
        assert_eq!(1, battle.agent_a().count_alive());
        assert_eq!(25, battle.agent_a().active().health());
    }

    #[test]
    fn test_winner_follows_tank_side() {
        let offensives = scripted(uniform_team(Archetype::Offensive, "A"), Action::Attack, 1);
        let tanks = scripted(uniform_team(Archetype::Tank, "B"), Action::Attack, 2);
        let mut battle = Battle::new(offensives, tanks, InitiativeMode::Deterministic, 3);
        while battle.step() {}
        assert_eq!(Some(Winner::B), battle.winner());
        assert_eq!(Some(Side::A), battle.last_turn().unwrap().first);
    }

    #[test]
    fn test_dead_actor_is_skipped() {
        let tanks = scripted(uniform_team(Archetype::Tank, "A"), Action::Attack, 1);
        let offensives = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(tanks, offensives, InitiativeMode::Deterministic, 3);
        for _ in 0..5 {
            battle.step();
        }
        // Turn 6: the fresh offensive strikes first and finishes the tank.
        battle.step();
        let report = battle.last_turn().unwrap();
        assert_eq!(25, report.b.damage_dealt);
        assert_eq!(0, report.a.damage_dealt);
        assert!(report.a.knocked_out);
        assert!(!report.b.knocked_out);
        assert_eq!(Some((0, 1)), report.a.active_change);
        assert_eq!(70, battle.agent_b().active().health());
    }

    #[test]
    fn test_knockout_rewards() {
        let tanks = scripted(uniform_team(Archetype::Tank, "A"), Action::Attack, 1);
        let offensives = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(tanks, offensives, InitiativeMode::Deterministic, 3);
        for _ in 0..4 {
            battle.step();
        }
        battle.step();
        let report = battle.last_turn().unwrap().clone();
        assert!(report.b.knocked_out);
        assert_eq!(15.0 - 25.0 + KNOCKOUT_BONUS, report.a.reward);
        assert_eq!(25.0 - 15.0 - KNOCKOUT_BONUS, report.b.reward);
        assert_eq!(Some((0, 1)), report.b.active_change);
        assert!(battle.actions_log()[4].contains("B switched Offensive -> Offensive"));

        while battle.step() {}
        let report = battle.last_turn().unwrap();
        assert!(report.b.knocked_out);
        assert_eq!(15.0 - 25.0 + KNOCKOUT_BONUS + VICTORY_BONUS, report.a.reward);
        assert_eq!(25.0 - 15.0 - KNOCKOUT_BONUS - VICTORY_BONUS, report.b.reward);
    }

    #[test]
    fn test_defend_applies_before_attacks() {
        // The attacker is faster, yet the slower side's defend still halves the hit.
        let offensives = scripted(uniform_team(Archetype::Offensive, "A"), Action::Attack, 1);
        let defenders = scripted(uniform_team(Archetype::Hybrid, "B"), Action::Defend, 2);
        let mut battle = Battle::new(offensives, defenders, InitiativeMode::Deterministic, 3);

        battle.step();
        let report = battle.last_turn().unwrap();
        assert_eq!(Some(Side::A), report.first);
        assert_eq!(10, report.a.damage_dealt);
        assert_eq!(0, report.b.damage_dealt);
        assert_eq!(90, battle.agent_b().active().health());
        assert!(!battle.agent_b().active().is_defending());
    }

    #[test]
    fn test_super_attack_after_cooldown() {
        let a = scripted(uniform_team(Archetype::Hybrid, "A"), Action::SuperAttack, 1);
        let b = scripted(uniform_team(Archetype::Tank, "B"), Action::Defend, 2);
        let mut battle = Battle::new(a, b, InitiativeMode::Deterministic, 3);

        for _ in 0..3 {
            battle.step();
            assert_eq!(Action::Attack, battle.last_turn().unwrap().a.action);
        }
        battle.step();
        let report = battle.last_turn().unwrap();
        assert_eq!(Action::SuperAttack, report.a.action);
        assert_eq!(20, report.a.damage_dealt);
        assert_eq!(3, battle.agent_a().active().cooldown());
    }

    #[test]
    fn test_switch_resolves_before_attack() {
        let switcher = scripted(mixed_team("A"), Action::Switch, 1);
        let attacker = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(switcher, attacker, InitiativeMode::Deterministic, 3);

        battle.step();
        let report = battle.last_turn().unwrap();
        assert_eq!(Some(Side::A), report.first);
        let (from, to) = report.a.active_change.unwrap();
        assert_eq!(0, from);
        assert_ne!(0, to);
        // The incoming member takes the hit, the starter stays untouched.
        assert_eq!(70, battle.agent_a().team()[0].health());
        let incoming = &battle.agent_a().team()[to];
        assert_eq!(incoming.max_health() - 25, incoming.health());
    }

    #[test]
    fn test_simultaneous_trade() {
        let a = scripted(uniform_team(Archetype::Offensive, "A"), Action::Attack, 1);
        let b = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(a, b, InitiativeMode::Simultaneous, 3);

        for _ in 0..2 {
            assert!(battle.step());
        }
        // Both sit at 20 HP; both strike and both fall.
        assert!(battle.step());
        let report = battle.last_turn().unwrap();
        assert_eq!(None, report.first);
        assert!(report.a.knocked_out && report.b.knocked_out);
        assert_eq!(25, report.a.damage_dealt);
        assert_eq!(25, report.b.damage_dealt);
        assert_eq!(0.0, report.a.reward);
        assert_eq!(0.0, report.b.reward);
    }

    #[test]
    fn test_simultaneous_double_knockout_is_draw() {
        let a = scripted(uniform_team(Archetype::Offensive, "A"), Action::Attack, 1);
        let b = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(a, b, InitiativeMode::Simultaneous, 3);
        let mut turns = 0;
        while battle.step() {
            turns += 1;
            assert!(turns < 100);
        }
        assert_eq!(9, battle.turn());
        assert!(battle.agent_a().all_fainted());
        assert!(battle.agent_b().all_fainted());
        assert_eq!(Some(Winner::Draw), battle.winner());
        let report = battle.last_turn().unwrap();
        assert_eq!(report.a.reward, report.b.reward);
    }

    #[test]
    fn test_reward_symmetry_without_bonuses() {
        for mode in [
            InitiativeMode::Probabilistic,
            InitiativeMode::Alternate,
            InitiativeMode::Deterministic,
            InitiativeMode::Simultaneous,
        ] {
            for seed in 0..20u64 {
                let a = Agent::new(mixed_team("A"), RandomPlayer {}, seed).unwrap();
                let b = Agent::new(mixed_team("B"), RandomPlayer {}, seed + 100).unwrap();
                let mut battle = Battle::new(a, b, mode, seed + 200);
                let mut turns = 0;
                loop {
                    let running = battle.step();
                    let report = battle.last_turn().unwrap();
                    if !report.a.knocked_out && !report.b.knocked_out {
                        assert_eq!(report.a.reward, -report.b.reward);
                    }
                    for character in battle.agent_a().team().iter().chain(battle.agent_b().team()) {
                        assert!(character.health() >= 0);
                        assert!(character.health() <= character.max_health());
                        assert!(!character.is_defending());
                    }
                    turns += 1;
                    if !running || turns >= 200 {
                        break;
                    }
                }
            }
        }
    }

    #[test]
    fn test_q_tables_are_updated() {
        let a = Agent::new(mixed_team("A"), QLearningPlayer::new(0.1, 0.95, 0.05), 1).unwrap();
        let b = Agent::new(mixed_team("B"), QLearningPlayer::new(0.1, 0.95, 0.05), 2).unwrap();
        let mut battle = Battle::new(a, b, InitiativeMode::Probabilistic, 3);

        let state_a = battle.agent_a().get_state(battle.agent_b());
        battle.step();
        let report = battle.last_turn().unwrap().clone();
        let table: &QTable = battle.agent_a().q_table().unwrap();
        assert_eq!(1, table.len());
        let expected = 0.1 * report.a.reward;
        assert!((table.get(&state_a, report.a.action) - expected).abs() < 1e-9);
        assert_eq!(1, battle.agent_b().q_table().unwrap().len());
    }

    #[test]
    fn test_log_line_and_reset() {
        let tanks = scripted(uniform_team(Archetype::Tank, "A"), Action::Attack, 1);
        let offensives = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(tanks, offensives, InitiativeMode::Deterministic, 3);
        battle.step();
        assert_eq!(
            "Turn 1: A[Tank]=attack (dmg=15), B[Offensive]=attack (dmg=25) | HP A=125/150 B=55/70 | alive A=3 B=3",
            battle.actions_log()[0]
        );

        while battle.step() {}
        assert!(battle.is_over());
        battle.reset_episode();
        assert_eq!(0, battle.turn());
        assert!(battle.actions_log().is_empty());
        assert!(battle.last_turn().is_none());
        assert_eq!(None, battle.winner());
        assert_eq!(3, battle.agent_b().count_alive());
    }

    #[test]
    fn test_knockout_line_shows_fallen_member() {
        let tanks = scripted(uniform_team(Archetype::Tank, "A"), Action::Attack, 1);
        let offensives = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(tanks, offensives, InitiativeMode::Deterministic, 3);
        for _ in 0..5 {
            battle.step();
        }
        assert_eq!(
            "Turn 5: A[Tank]=attack (dmg=15), B[Offensive]=attack (dmg=25) | HP A=25/150 B=0/70 \
             | alive A=3 B=2 | B switched Offensive -> Offensive",
            battle.actions_log()[4]
        );
    }

    #[test]
    fn test_simultaneous_switch_is_mirrored() {
        // Whichever side switches, the incoming member takes the hit.
        let a = scripted(uniform_team(Archetype::Offensive, "A"), Action::Switch, 1);
        let b = scripted(uniform_team(Archetype::Offensive, "B"), Action::Attack, 2);
        let mut battle = Battle::new(a, b, InitiativeMode::Simultaneous, 3);
        battle.step();
        let (_, to) = battle.last_turn().unwrap().a.active_change.unwrap();
        assert_eq!(70, battle.agent_a().team()[0].health());
        assert_eq!(45, battle.agent_a().team()[to].health());
        assert_eq!(0, battle.last_turn().unwrap().a.damage_dealt);

        let a = scripted(uniform_team(Archetype::Offensive, "A"), Action::Attack, 1);
        let b = scripted(uniform_team(Archetype::Offensive, "B"), Action::Switch, 2);
        let mut battle = Battle::new(a, b, InitiativeMode::Simultaneous, 3);
        battle.step();
        let (_, to) = battle.last_turn().unwrap().b.active_change.unwrap();
        assert_eq!(70, battle.agent_b().team()[0].health());
        assert_eq!(45, battle.agent_b().team()[to].health());
        assert_eq!(0, battle.last_turn().unwrap().b.damage_dealt);
    }

    #[test]
    fn test_simultaneous_knockout_while_switching() {
        let a = scripted(uniform_team(Archetype::Offensive, "A"), Action::Attack, 1);
        let b = scripted(uniform_team(Archetype::Offensive, "B"), Action::Switch, 2);
        let mut battle = Battle::new(a, b, InitiativeMode::Simultaneous, 3);

        loop {
            assert!(battle.step());
            assert!(battle.turn() < 20);
            let report = battle.last_turn().unwrap();
            if battle.agent_b().count_alive() == 2 {
                assert!(report.b.knocked_out);
                assert_eq!(25.0 + KNOCKOUT_BONUS, report.a.reward);
                assert_eq!(-25.0 - KNOCKOUT_BONUS, report.b.reward);
                assert!(battle.agent_b().active().is_alive());
                break;
            }
            assert!(!report.b.knocked_out);
            assert_eq!(25.0, report.a.reward);
        }
    }

    #[test]
    fn test_initiative_mode_names() {
        assert_eq!("deterministic", InitiativeMode::Deterministic.to_string());
        assert_eq!(
            InitiativeMode::Alternate,
            <InitiativeMode as clap::ValueEnum>::from_str("alternate", false).unwrap()
        );
    }
}
