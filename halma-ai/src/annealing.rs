//! 模拟退火
//!
//! 反复随机重启：随机选第一步，之后不断随机抽取后续走法，更优则接受，
//! 否则以 exp(Δ/T) 的概率接受；温度按固定比例下降。记录所有重启中得分最高的走法前缀。

use std::time::{Duration, Instant};

use halma_core::{BoardState, Move};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::evaluate::{Evaluator, LOSS_SCORE};
use crate::search::StopReason;

/// 模拟退火配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    pub time_limit_ms: u64,
    pub initial_temperature: f64,
    /// 每步温度乘以 (1 - cooling_rate)
    pub cooling_rate: f64,
    /// 温度降到该值以下时结束本次重启
    pub min_temperature: f64,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 200,
            initial_temperature: 10_000.0,
            cooling_rate: 0.003,
            min_temperature: 1.0,
        }
    }
}

/// 一次搜索的结果
#[derive(Debug, Clone)]
pub struct AnnealingReport {
    /// 最佳走法序列，中途停下时已补上结束回合
    pub best: Vec<Move>,
    pub score: f64,
    pub restarts: u32,
    pub stop: StopReason,
}

/// 模拟退火引擎
pub struct AnnealingEngine {
    config: AnnealingConfig,
    evaluator: Evaluator,
    rng: ChaCha8Rng,
}

impl AnnealingEngine {
    pub fn new(config: AnnealingConfig, evaluator: Evaluator, seed: u64) -> Self {
        Self {
            config,
            evaluator,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// 在时间上限内搜索
    pub fn search(&mut self, state: &BoardState) -> AnnealingReport {
        let deadline = Instant::now() + Duration::from_millis(self.config.time_limit_ms);
        let mut report = self.run(state, |restarts| restarts > 0 && Instant::now() >= deadline);
        report.stop = StopReason::Deadline;
        report
    }

    /// 固定重启次数搜索
    pub fn run_restarts(&mut self, state: &BoardState, restarts: u32) -> AnnealingReport {
        self.run(state, |done| done >= restarts)
    }

    fn run(&mut self, state: &BoardState, mut finished: impl FnMut(u32) -> bool) -> AnnealingReport {
        let mut best = Vec::new();
        let mut best_score = LOSS_SCORE;
        let mut restarts = 0;

        while !finished(restarts) {
            if let Some((sequence, score)) = self.restart(state) {
                if score > best_score {
                    best_score = score;
                    best = sequence;
                }
            }
            restarts += 1;
        }

        // 停在连跳中途时补上结束回合
        if best.last().is_some_and(|mv| mv.is_hop()) {
            best.push(Move::end_turn(state.turn()));
        }

        tracing::debug!(
            restarts,
            score = best_score,
            length = best.len(),
            "annealing finished"
        );
        AnnealingReport {
            best,
            score: best_score,
            restarts,
            stop: StopReason::Completed,
        }
    }

    /// 单次重启，返回本次找到的最佳前缀及其得分
    fn restart(&mut self, root: &BoardState) -> Option<(Vec<Move>, f64)> {
        let player = root.turn();
        let first = *root.legal_moves().choose(&mut self.rng)?;

        let mut current = root.clone();
        apply(&mut current, first);
        let mut sequence = vec![first];
        let mut score = self.evaluator.evaluate(&current, root, player);

        let mut best = sequence.clone();
        let mut best_score = score;
        let mut temperature = self.config.initial_temperature;

        while temperature > self.config.min_temperature
            && current.turn() == player
            && current.is_hop_active()
        {
            let moves = current.legal_moves();
            let Some(&candidate) = moves.choose(&mut self.rng) else {
                break;
            };
            let mut next = current.clone();
            apply(&mut next, candidate);
            let next_score = self.evaluator.evaluate(&next, root, player);
            let delta = next_score - score;

            if delta > 0.0 || (delta / temperature).exp() > self.rng.gen::<f64>() {
                current = next;
                score = next_score;
                sequence.push(candidate);
                if score > best_score {
                    best_score = score;
                    best = sequence.clone();
                }
                if candidate.is_end_turn() {
                    break;
                }
            }
            temperature *= 1.0 - self.config.cooling_rate;
        }

        Some((best, best_score))
    }
}

fn apply(state: &mut BoardState, mv: Move) {
    if let Err(e) = state.apply_move(mv) {
        unreachable!("annealing produced an illegal move: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halma_core::{Board, PlayerId, Point};

    fn p(x: u8, y: u8) -> Point {
        Point::new_unchecked(x, y)
    }

    fn player(id: u8) -> PlayerId {
        PlayerId::new_unchecked(id)
    }

    fn assert_sequence_is_playable(state: &BoardState, sequence: &[Move]) {
        let mover = state.turn();
        let mut board = state.clone();
        for mv in sequence {
            assert!(board.is_legal(mv), "序列中的走法不合法: {}", mv);
            board.apply_move(*mv).unwrap();
        }
        assert_ne!(board.turn(), mover, "序列结束后应交出走子权");
    }

    #[test]
    fn test_sequence_is_legal_from_start() {
        let state = BoardState::initial();
        let mut engine = AnnealingEngine::new(
            AnnealingConfig::default(),
            Evaluator::new(Evaluator::annealing_features()),
            13,
        );
        let report = engine.run_restarts(&state, 30);
        assert!(!report.best.is_empty());
        assert_eq!(report.restarts, 30);
        assert_sequence_is_playable(&state, &report.best);
    }

    #[test]
    fn test_sequence_on_hop_board() {
        // 一长串可连跳的棋子
        let mut board = Board::empty();
        board.set(p(2, 2), Some(player(0)));
        for i in 0..5u8 {
            board.set(p(3 + 2 * i, 3 + 2 * i), Some(player(1)));
        }
        let state = BoardState::from_board(board, player(0));
        let mut engine = AnnealingEngine::new(
            AnnealingConfig::default(),
            Evaluator::new(Evaluator::annealing_features()),
            5,
        );
        let report = engine.run_restarts(&state, 100);
        assert_sequence_is_playable(&state, &report.best);
        // 沿对角线跳得越远越好
        assert!(report.best.len() >= 2);
    }

    #[test]
    fn test_timed_search() {
        let state = BoardState::initial();
        let config = AnnealingConfig {
            time_limit_ms: 0,
            ..AnnealingConfig::default()
        };
        let mut engine = AnnealingEngine::new(config, Evaluator::default(), 3);
        let report = engine.search(&state);
        assert_eq!(report.restarts, 1);
        assert_eq!(report.stop, StopReason::Deadline);
        assert_sequence_is_playable(&state, &report.best);
    }

    #[test]
    fn test_no_legal_move_gives_empty_sequence() {
        let mut board = Board::empty();
        board.set(p(0, 0), Some(player(1)));
        let state = BoardState::from_board(board, player(0));
        let mut engine = AnnealingEngine::new(AnnealingConfig::default(), Evaluator::default(), 1);
        let report = engine.run_restarts(&state, 3);
        assert!(report.best.is_empty());
        assert_eq!(report.score, LOSS_SCORE);
    }
}
