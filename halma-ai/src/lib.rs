//! Halma AI 引擎
//!
//! 包含:
//! - 整回合后继生成（含整队回合组合）
//! - 可配置特征的局面评估
//! - Minimax + Alpha-Beta 搜索、蒙特卡洛树搜索、模拟退火
//! - 对弈代理与配置

mod agent;
mod annealing;
mod config;
mod evaluate;
mod features;
mod mcts;
mod search;
mod successors;

pub use agent::{fallback_move, Agent, GreedyStrategy, RandomStrategy, SearchStrategy, TurnPlan};
pub use annealing::{AnnealingConfig, AnnealingEngine, AnnealingReport};
pub use config::{AgentConfig, ConfigError, Difficulty, StrategyConfig};
pub use evaluate::{Evaluator, LOSS_SCORE, WIN_SCORE};
pub use features::Feature;
pub use mcts::{MctsConfig, MctsEngine, MctsReport, NodeId};
pub use search::{
    AlphaBetaEngine, GamePhase, MinimaxConfig, PhaseThresholds, SearchReport, StopReason,
};
pub use successors::{BoardPointPair, CombinedMoveGenerator, MoveGenerator};
