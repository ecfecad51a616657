//! 代理配置
//!
//! 选择搜索策略、特征组合与随机种子，可从 JSON 读取，也可按难度生成预设。

use anyhow::Context;
use halma_core::PlayerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{Agent, GreedyStrategy, RandomStrategy, SearchStrategy};
use crate::annealing::{AnnealingConfig, AnnealingEngine};
use crate::evaluate::Evaluator;
use crate::features::Feature;
use crate::mcts::{MctsConfig, MctsEngine};
use crate::search::{AlphaBetaEngine, MinimaxConfig};

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// 配置取值错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("search depth must be at least 1")]
    ZeroDepth,

    #[error("{name} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// 搜索策略及其参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Minimax(MinimaxConfig),
    Mcts(MctsConfig),
    Annealing(AnnealingConfig),
    Greedy,
    Random,
}

/// 代理配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub strategy: StrategyConfig,
    /// 为空时使用策略对应的默认特征组合
    #[serde(default)]
    pub features: Option<Vec<Feature>>,
    /// 为空时每次构建都取新的随机种子
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let strategy = match difficulty {
            Difficulty::Easy => StrategyConfig::Minimax(MinimaxConfig {
                opening_depth: 1,
                midgame_depth: 1,
                endgame_depth: 2,
                use_combined: false,
                time_limit_ms: Some(300),
                ..MinimaxConfig::default()
            }),
            Difficulty::Medium => StrategyConfig::Minimax(MinimaxConfig::default()),
            Difficulty::Hard => StrategyConfig::Minimax(MinimaxConfig {
                opening_depth: 3,
                midgame_depth: 4,
                endgame_depth: 4,
                time_limit_ms: Some(2000),
                ..MinimaxConfig::default()
            }),
        };
        Self {
            strategy,
            features: None,
            seed: None,
        }
    }

    /// 从 JSON 文本读取并校验
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text).context("failed to parse agent config")?;
        config.validate().context("invalid agent config")?;
        Ok(config)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize agent config")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.strategy {
            StrategyConfig::Minimax(c) => {
                if c.opening_depth == 0 || c.midgame_depth == 0 || c.endgame_depth == 0 {
                    return Err(ConfigError::ZeroDepth);
                }
            }
            StrategyConfig::Mcts(c) => {
                check_range("exploration", c.exploration, 0.0, f64::MAX)?;
                check_range("prior_weight", c.prior_weight, 0.0, f64::MAX)?;
                check_range("rollout_epsilon", c.rollout_epsilon, 0.0, 1.0)?;
            }
            StrategyConfig::Annealing(c) => {
                check_range("cooling_rate", c.cooling_rate, f64::EPSILON, 1.0 - f64::EPSILON)?;
                check_range("min_temperature", c.min_temperature, 0.0, c.initial_temperature)?;
            }
            StrategyConfig::Greedy | StrategyConfig::Random => {}
        }
        Ok(())
    }

    fn evaluator(&self) -> Evaluator {
        match (&self.features, &self.strategy) {
            (Some(features), _) => Evaluator::new(features.clone()),
            (None, StrategyConfig::Annealing(_)) => Evaluator::new(Evaluator::annealing_features()),
            (None, _) => Evaluator::default(),
        }
    }

    /// 为指定玩家构建代理；同一种子下各玩家的随机序列互不相同
    pub fn build(&self, player: PlayerId) -> Agent {
        let seed = self
            .seed
            .unwrap_or_else(rand::random)
            .wrapping_add(u64::from(player.id()));
        let evaluator = self.evaluator();
        let strategy: Box<dyn SearchStrategy> = match &self.strategy {
            StrategyConfig::Minimax(c) => Box::new(AlphaBetaEngine::new(c.clone(), evaluator, seed)),
            StrategyConfig::Mcts(c) => Box::new(MctsEngine::new(c.clone(), evaluator, seed)),
            StrategyConfig::Annealing(c) => Box::new(AnnealingEngine::new(c.clone(), evaluator, seed)),
            StrategyConfig::Greedy => Box::new(GreedyStrategy::new(evaluator, seed)),
            StrategyConfig::Random => Box::new(RandomStrategy::new(seed)),
        };
        tracing::debug!(player = %player, strategy = strategy.name(), seed, "agent built");
        Agent::new(player, strategy)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Medium)
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
