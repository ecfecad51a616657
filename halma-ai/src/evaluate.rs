//! 局面评估

use halma_core::{BoardState, PlayerId, Winner};

use crate::features::Feature;

/// 己方队伍获胜
pub const WIN_SCORE: f64 = i32::MAX as f64;
/// 对方队伍获胜
pub const LOSS_SCORE: f64 = i32::MIN as f64;

/// 评估器：有序的特征列表的线性组合
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    features: Vec<Feature>,
}

impl Evaluator {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Minimax 默认使用的特征组合
    pub fn default_features() -> Vec<Feature> {
        vec![
            Feature::GoalProgress(0.9),
            Feature::LeaveBase(0.002),
            Feature::CanHop(0.005),
            Feature::OutsideObjective(0.015),
            Feature::AdjacentToObjective(0.05),
            Feature::Huddle(0.25),
            Feature::AvoidOpponentBase(0.25),
            Feature::DontBlockTeammate,
        ]
    }

    /// 模拟退火使用的特征组合
    pub fn annealing_features() -> Vec<Feature> {
        vec![
            Feature::GoalProgress(0.8),
            Feature::LeaveBase(0.002),
            Feature::CanHop(0.01),
            Feature::OutsideObjective(0.02),
            Feature::AdjacentToObjective(0.05),
        ]
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// 从 `player` 的角度评估后继局面 `board`（`original` 为走子前的局面）
    ///
    /// 已分出胜负的局面直接返回哨兵值。
    pub fn evaluate(&self, board: &BoardState, original: &BoardState, player: PlayerId) -> f64 {
        match board.winner() {
            Winner::Team(team) if team == player.team() => WIN_SCORE,
            Winner::Team(_) => LOSS_SCORE,
            Winner::Draw | Winner::Nobody => self
                .features
                .iter()
                .map(|f| f.weighted(board, original, player))
                .sum(),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Self::default_features())
    }
}
