//! 搜索引擎
//!
//! 实现 Minimax + Alpha-Beta 剪枝 + 迭代加深，可选整队回合组合

use std::time::{Duration, Instant};

use halma_core::{in_objective_base, BoardState, PlayerId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::evaluate::{Evaluator, LOSS_SCORE, WIN_SCORE};
use crate::successors::{BoardPointPair, CombinedMoveGenerator, MoveGenerator};

/// 对局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Opening,
    Midgame,
    Endgame,
}

/// 阶段划分阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    /// 达到该回合数后进入中局
    pub midgame_turn: u32,
    /// 目标营地内的棋子数达到该值后进入残局
    pub endgame_pieces: usize,
}

impl PhaseThresholds {
    pub fn classify(&self, state: &BoardState, player: PlayerId) -> GamePhase {
        let arrived = state
            .pieces(player)
            .iter()
            .filter(|p| in_objective_base(player, **p))
            .count();
        if arrived >= self.endgame_pieces {
            GamePhase::Endgame
        } else if state.turns_played() >= self.midgame_turn {
            GamePhase::Midgame
        } else {
            GamePhase::Opening
        }
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            midgame_turn: 20,
            endgame_pieces: 9,
        }
    }
}

/// Minimax 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    pub opening_depth: u8,
    pub midgame_depth: u8,
    pub endgame_depth: u8,
    /// 在整队回合边界使用组合生成器
    pub use_combined: bool,
    /// Alpha-Beta 剪枝；关闭时为普通 Minimax
    pub pruning: bool,
    /// 打乱后继顺序
    pub randomize_order: bool,
    /// 每步时间上限；为空时按固定深度搜索
    pub time_limit_ms: Option<u64>,
    pub phases: PhaseThresholds,
}

impl MinimaxConfig {
    /// 当前阶段的搜索深度
    pub fn depth_for(&self, phase: GamePhase) -> u8 {
        match phase {
            GamePhase::Opening => self.opening_depth,
            GamePhase::Midgame => self.midgame_depth,
            GamePhase::Endgame => self.endgame_depth,
        }
    }

    /// 固定深度、不限时、不打乱顺序
    pub fn fixed_depth(depth: u8) -> Self {
        Self {
            opening_depth: depth,
            midgame_depth: depth,
            endgame_depth: depth,
            use_combined: false,
            pruning: true,
            randomize_order: false,
            time_limit_ms: None,
            phases: PhaseThresholds::default(),
        }
    }
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            opening_depth: 2,
            midgame_depth: 3,
            endgame_depth: 3,
            use_combined: true,
            pruning: true,
            randomize_order: true,
            time_limit_ms: Some(800),
            phases: PhaseThresholds::default(),
        }
    }
}

/// 搜索结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// 按计划完成
    Completed,
    /// 到达时间上限
    Deadline,
}

/// 一次搜索的结果
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// 最佳后继；所有后继都不优于初始界时为空
    pub best: Option<BoardPointPair>,
    pub score: f64,
    /// 完整搜索过的最大深度
    pub depth_reached: u8,
    pub nodes: u64,
    pub stop: StopReason,
}

/// Alpha-Beta 搜索引擎
pub struct AlphaBetaEngine {
    config: MinimaxConfig,
    evaluator: Evaluator,
    rng: ChaCha8Rng,
    nodes_searched: u64,
    timed_out: bool,
}

impl AlphaBetaEngine {
    /// 创建新的搜索引擎
    pub fn new(config: MinimaxConfig, evaluator: Evaluator, seed: u64) -> Self {
        Self {
            config,
            evaluator,
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes_searched: 0,
            timed_out: false,
        }
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }

    /// 搜索最佳后继局面
    pub fn search(&mut self, state: &BoardState) -> SearchReport {
        self.nodes_searched = 0;
        self.timed_out = false;

        let root_player = state.turn();
        let phase = self.config.phases.classify(state, root_player);
        let target = self.config.depth_for(phase).max(1);
        let deadline = self
            .config
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        // 根节点总是用单人生成器，保证选出的是自己的走法
        let rng = self.config.randomize_order.then_some(&mut self.rng);
        let children: Vec<BoardPointPair> = MoveGenerator::new(state, rng).collect();

        let mut report = SearchReport {
            best: None,
            score: LOSS_SCORE,
            depth_reached: 0,
            nodes: 0,
            stop: StopReason::Completed,
        };

        // 有时限时从深度 1 开始迭代加深，否则直接搜索目标深度
        let first_depth = if deadline.is_some() { 1 } else { target };
        for depth in first_depth..=target {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                report.stop = StopReason::Deadline;
                break;
            }

            let (best, score) = self.search_root(state, &children, depth, deadline.as_ref());

            if self.timed_out {
                report.stop = StopReason::Deadline;
                // 没有完成任何一层时才采用不完整的结果
                if report.depth_reached == 0 {
                    report.best = best.map(|i| children[i].clone());
                    report.score = score;
                }
                break;
            }

            report.best = best.map(|i| children[i].clone());
            report.score = score;
            report.depth_reached = depth;
        }

        report.nodes = self.nodes_searched;
        tracing::debug!(
            player = %root_player,
            ?phase,
            depth = report.depth_reached,
            nodes = report.nodes,
            score = report.score,
            stop = ?report.stop,
            "minimax search finished"
        );
        report
    }

    /// 搜索根节点的所有后继，返回最佳后继的下标
    fn search_root(
        &mut self,
        root: &BoardState,
        children: &[BoardPointPair],
        depth: u8,
        deadline: Option<&Instant>,
    ) -> (Option<usize>, f64) {
        let root_player = root.turn();
        let mut best = None;
        let mut best_score = LOSS_SCORE;
        let mut alpha = LOSS_SCORE;
        let beta = WIN_SCORE;

        for (i, child) in children.iter().enumerate() {
            let score = self.alpha_beta(
                &child.state,
                root,
                depth - 1,
                alpha,
                beta,
                root_player,
                deadline,
            );
            if self.timed_out {
                break;
            }

            // 严格优于才替换，相同分数保留先找到的后继
            if score > best_score {
                best_score = score;
                best = Some(i);
            }
            if self.config.pruning && score > alpha {
                alpha = score;
            }
        }

        (best, best_score)
    }

    /// Alpha-Beta 搜索
    ///
    /// 走子方与根节点同队时取最大值，否则取最小值。超时后返回静态评估值。
    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &mut self,
        state: &BoardState,
        root: &BoardState,
        depth: u8,
        mut alpha: f64,
        mut beta: f64,
        root_player: PlayerId,
        deadline: Option<&Instant>,
    ) -> f64 {
        self.nodes_searched += 1;

        if deadline.is_some_and(|d| Instant::now() >= *d) {
            self.timed_out = true;
            return self.evaluator.evaluate(state, root, root_player);
        }

        if depth == 0 || state.winner().is_decided() {
            return self.evaluator.evaluate(state, root, root_player);
        }

        let maximizing = state.turn().team() == root_player.team();
        let combined = self.config.use_combined
            && depth >= 2
            && CombinedMoveGenerator::applies_to(state);

        let rng = self.config.randomize_order.then_some(&mut self.rng);
        let (successors, next_depth): (Box<dyn Iterator<Item = BoardPointPair>>, u8) =
            if combined {
                (Box::new(CombinedMoveGenerator::new(state, rng)), depth - 2)
            } else {
                (Box::new(MoveGenerator::new(state, rng)), depth - 1)
            };

        let mut best = if maximizing { LOSS_SCORE } else { WIN_SCORE };
        let mut any = false;

        for child in successors {
            any = true;
            let score = self.alpha_beta(
                &child.state,
                root,
                next_depth,
                alpha,
                beta,
                root_player,
                deadline,
            );

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }

            if self.timed_out || (self.config.pruning && alpha >= beta) {
                break;
            }
        }

        // 无棋可走
        if !any {
            return self.evaluator.evaluate(state, root, root_player);
        }

        best
    }

    /// 获取搜索的节点数
    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}
