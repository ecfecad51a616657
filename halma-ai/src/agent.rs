//! 对弈代理
//!
//! 每回合唯一的入口是 [`Agent::choose_move`]：先消化上次连跳留下的后续走法，
//! 否则向搜索策略要一个回合计划，再把计划换算成一步可执行的走法。

use std::collections::VecDeque;

use halma_core::{reconstruct_hop_path, BoardState, HalmaError, Move, PlayerId, Point};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::annealing::AnnealingEngine;
use crate::evaluate::{Evaluator, LOSS_SCORE};
use crate::mcts::MctsEngine;
use crate::search::AlphaBetaEngine;
use crate::successors::{BoardPointPair, MoveGenerator};

/// 搜索策略给出的回合计划
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPlan {
    /// 整回合的起点与终点，跳跃时由代理还原路径
    Relocate { from: Point, to: Point, is_hop: bool },
    /// 明确的走法序列，第一步立即执行，其余排队
    Sequence(Vec<Move>),
    /// 单步走法
    Single(Move),
}

impl TurnPlan {
    /// 由后继局面得到计划；没有实际位移的后继就是结束回合
    pub fn from_pair(pair: &BoardPointPair, before: &BoardState) -> Self {
        match (pair.origin, pair.destination) {
            (Some(from), Some(to)) if from != to => Self::Relocate {
                from,
                to,
                is_hop: pair.is_hop,
            },
            _ => Self::Single(Move::end_turn(before.turn())),
        }
    }
}

/// 搜索策略
pub trait SearchStrategy {
    fn name(&self) -> &'static str;

    /// 为走子方规划本回合；没有可用计划时返回 None，由代理兜底
    fn plan(&mut self, state: &BoardState) -> Option<TurnPlan>;
}

impl SearchStrategy for AlphaBetaEngine {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn plan(&mut self, state: &BoardState) -> Option<TurnPlan> {
        let report = self.search(state);
        report.best.map(|pair| TurnPlan::from_pair(&pair, state))
    }
}

impl SearchStrategy for MctsEngine {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn plan(&mut self, state: &BoardState) -> Option<TurnPlan> {
        self.search(state).best.map(TurnPlan::Single)
    }
}

impl SearchStrategy for AnnealingEngine {
    fn name(&self) -> &'static str {
        "annealing"
    }

    fn plan(&mut self, state: &BoardState) -> Option<TurnPlan> {
        let report = self.search(state);
        if report.best.is_empty() {
            None
        } else {
            Some(TurnPlan::Sequence(report.best))
        }
    }
}

/// 一步贪心：评估所有整回合后继，取最高分
pub struct GreedyStrategy {
    evaluator: Evaluator,
    rng: ChaCha8Rng,
}

impl GreedyStrategy {
    pub fn new(evaluator: Evaluator, seed: u64) -> Self {
        Self {
            evaluator,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for GreedyStrategy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn plan(&mut self, state: &BoardState) -> Option<TurnPlan> {
        let player = state.turn();
        let mut best = None;
        let mut best_score = LOSS_SCORE;
        for pair in MoveGenerator::new(state, Some(&mut self.rng)) {
            let score = self.evaluator.evaluate(&pair.state, state, player);
            if score > best_score {
                best_score = score;
                best = Some(pair);
            }
        }
        best.map(|pair| TurnPlan::from_pair(&pair, state))
    }
}

/// 在所有整回合后继中均匀随机选择
pub struct RandomStrategy {
    rng: ChaCha8Rng,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn plan(&mut self, state: &BoardState) -> Option<TurnPlan> {
        let successors: Vec<BoardPointPair> = MoveGenerator::new(state, None).collect();
        successors
            .choose(&mut self.rng)
            .map(|pair| TurnPlan::from_pair(pair, state))
    }
}

/// 兜底走法：优先第一个非跳跃的合法走法，其次任意合法走法
pub fn fallback_move(state: &BoardState) -> halma_core::Result<Move> {
    let moves = state.legal_moves();
    moves
        .iter()
        .find(|mv| !mv.is_hop())
        .or_else(|| moves.first())
        .copied()
        .ok_or(HalmaError::NoLegalMove {
            player: state.turn().id(),
        })
}

/// 对弈代理
pub struct Agent {
    player: PlayerId,
    strategy: Box<dyn SearchStrategy>,
    pending: VecDeque<Move>,
}

impl Agent {
    pub fn new(player: PlayerId, strategy: Box<dyn SearchStrategy>) -> Self {
        Self {
            player,
            strategy,
            pending: VecDeque::new(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// 排队中的后续走法
    pub fn pending(&self) -> impl Iterator<Item = &Move> {
        self.pending.iter()
    }

    /// 选择本步走法
    pub fn choose_move(&mut self, state: &BoardState) -> Move {
        if let Some(mv) = self.pending.pop_front() {
            if state.is_legal(&mv) {
                tracing::debug!(player = %self.player, %mv, "queued move");
                return mv;
            }
            tracing::warn!(
                player = %self.player,
                %mv,
                discarded = self.pending.len() + 1,
                "queued move no longer legal"
            );
            self.pending.clear();
        }

        let planned = self
            .strategy
            .plan(state)
            .and_then(|plan| self.realize(state, plan));

        let mv = match planned {
            Some(mv) if state.is_legal(&mv) => mv,
            other => {
                if let Some(mv) = other {
                    tracing::warn!(player = %self.player, %mv, "strategy chose an illegal move");
                }
                self.pending.clear();
                match fallback_move(state) {
                    Ok(mv) => mv,
                    Err(e) => {
                        tracing::error!(player = %self.player, error = %e, "forcing end of turn");
                        Move::end_turn(state.turn())
                    }
                }
            }
        };

        tracing::info!(
            player = %self.player,
            strategy = self.strategy.name(),
            %mv,
            queued = self.pending.len(),
            "move chosen"
        );
        mv
    }

    /// 把计划换算成第一步，其余走法排队
    fn realize(&mut self, state: &BoardState, plan: TurnPlan) -> Option<Move> {
        match plan {
            TurnPlan::Single(mv) => Some(mv),
            TurnPlan::Relocate { from, to, is_hop: false } => Some(Move::step(state.turn(), from, to)),
            TurnPlan::Relocate { from, to, is_hop: true } => {
                let Some(path) = reconstruct_hop_path(state, from, to) else {
                    tracing::warn!(player = %self.player, %from, %to, "no hop path found");
                    return None;
                };
                self.enqueue(path)
            }
            TurnPlan::Sequence(moves) => self.enqueue(moves),
        }
    }

    fn enqueue(&mut self, moves: Vec<Move>) -> Option<Move> {
        let mut moves = VecDeque::from(moves);
        let first = moves.pop_front()?;
        self.pending = moves;
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use halma_core::{base_points, Board};

    fn p(x: u8, y: u8) -> Point {
        Point::new_unchecked(x, y)
    }

    fn player(id: u8) -> PlayerId {
        PlayerId::new_unchecked(id)
    }

    /// 总是给出同一个计划，并记录被调用的次数
    struct Scripted {
        plan: Option<TurnPlan>,
        calls: Rc<Cell<u32>>,
    }

    impl SearchStrategy for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn plan(&mut self, _state: &BoardState) -> Option<TurnPlan> {
            self.calls.set(self.calls.get() + 1);
            self.plan.clone()
        }
    }

    fn scripted(plan: Option<TurnPlan>) -> (Agent, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let strategy = Scripted {
            plan,
            calls: Rc::clone(&calls),
        };
        (Agent::new(player(0), Box::new(strategy)), calls)
    }

    fn hop_board() -> BoardState {
        let mut board = Board::empty();
        board.set(p(2, 2), Some(player(0)));
        board.set(p(3, 3), Some(player(1)));
        board.set(p(5, 5), Some(player(1)));
        BoardState::from_board(board, player(0))
    }

    #[test]
    fn test_hop_relocation_is_queued() {
        let (mut agent, calls) = scripted(Some(TurnPlan::Relocate {
            from: p(2, 2),
            to: p(6, 6),
            is_hop: true,
        }));
        let mut state = hop_board();

        let first = agent.choose_move(&state);
        assert_eq!(first, Move::step(player(0), p(2, 2), p(4, 4)));
        assert_eq!(agent.pending().count(), 2);
        state.apply_move(first).unwrap();

        let second = agent.choose_move(&state);
        assert_eq!(second, Move::step(player(0), p(4, 4), p(6, 6)));
        state.apply_move(second).unwrap();

        let third = agent.choose_move(&state);
        assert_eq!(third, Move::end_turn(player(0)));
        state.apply_move(third).unwrap();

        assert_eq!(state.turn(), player(1));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_stale_queue_is_discarded() {
        let (mut agent, calls) = scripted(Some(TurnPlan::Relocate {
            from: p(2, 2),
            to: p(6, 6),
            is_hop: true,
        }));
        let state = hop_board();
        let first = agent.choose_move(&state);
        assert!(first.is_hop());

        // 不执行第一步，排队的 (4,4)->(6,6) 在原局面下不合法
        let again = agent.choose_move(&state);
        assert_eq!(again, first);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_slide_relocation() {
        let (mut agent, _) = scripted(Some(TurnPlan::Relocate {
            from: p(2, 2),
            to: p(2, 3),
            is_hop: false,
        }));
        let state = hop_board();
        assert_eq!(agent.choose_move(&state), Move::step(player(0), p(2, 2), p(2, 3)));
        assert_eq!(agent.pending().count(), 0);
    }

    #[test]
    fn test_sequence_plan() {
        let moves = vec![
            Move::step(player(0), p(2, 2), p(4, 4)),
            Move::end_turn(player(0)),
        ];
        let (mut agent, _) = scripted(Some(TurnPlan::Sequence(moves.clone())));
        let mut state = hop_board();
        let first = agent.choose_move(&state);
        assert_eq!(first, moves[0]);
        state.apply_move(first).unwrap();
        assert_eq!(agent.choose_move(&state), moves[1]);
    }

    #[test]
    fn test_fallback_prefers_slides() {
        let (mut agent, _) = scripted(None);
        let state = hop_board();
        let mv = agent.choose_move(&state);
        assert!(state.is_legal(&mv));
        assert!(!mv.is_hop());
    }

    #[test]
    fn test_illegal_plan_falls_back() {
        let (mut agent, _) = scripted(Some(TurnPlan::Single(Move::step(
            player(0),
            p(2, 2),
            p(9, 9),
        ))));
        let state = hop_board();
        let mv = agent.choose_move(&state);
        assert!(state.is_legal(&mv));
    }

    #[test]
    fn test_no_legal_move_forces_end_turn() {
        let mut board = Board::empty();
        board.set(p(8, 8), Some(player(1)));
        let state = BoardState::from_board(board, player(0));
        assert!(matches!(
            fallback_move(&state),
            Err(HalmaError::NoLegalMove { player: 0 })
        ));

        let (mut agent, _) = scripted(None);
        assert_eq!(agent.choose_move(&state), Move::end_turn(player(0)));
    }

    #[test]
    fn test_pair_without_origin_ends_turn() {
        let mut board = Board::empty();
        for &cell in base_points(3) {
            board.set(cell, Some(player(0)));
        }
        let state = BoardState::from_board(board, player(0));
        let pair = MoveGenerator::new(&state, None)
            .find(|pair| pair.origin.is_none())
            .unwrap();
        assert_eq!(
            TurnPlan::from_pair(&pair, &state),
            TurnPlan::Single(Move::end_turn(player(0)))
        );
    }

    #[test]
    fn test_greedy_and_random_plans_are_legal() {
        let state = BoardState::initial();
        let mut strategies: Vec<Box<dyn SearchStrategy>> = vec![
            Box::new(GreedyStrategy::new(Evaluator::default(), 1)),
            Box::new(RandomStrategy::new(2)),
        ];
        for strategy in strategies.drain(..) {
            let mut agent = Agent::new(player(0), strategy);
            let mv = agent.choose_move(&state);
            assert!(state.is_legal(&mv), "{} 给出了非法走法", agent.strategy_name());
        }
    }
}
