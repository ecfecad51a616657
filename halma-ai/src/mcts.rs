//! 蒙特卡洛树搜索
//!
//! 以单步走法为边的四阶段循环：UCT 选择、展开全部合法走法、半随机模拟、回传。
//! 节点存放在连续的 Vec 中，用 NodeId 引用。

use std::time::{Duration, Instant};

use halma_core::{goal_distance, BoardState, Move, PlayerId, Team, Winner};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::evaluate::Evaluator;
use crate::search::StopReason;

/// 平局的回报
const DRAW_REWARD: f64 = 0.5;

/// MCTS 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// 每步时间上限
    pub time_limit_ms: u64,
    /// UCT 探索系数
    pub exploration: f64,
    /// 静态评估先验的权重，0 表示不使用
    pub prior_weight: f64,
    /// 模拟时完全随机走子的概率，其余按贪心走子
    pub rollout_epsilon: f64,
    /// 模拟的最大步数；为空时模拟到终局
    pub rollout_depth: Option<u32>,
    /// 模拟未分胜负时，评估值到回报的映射（按阈值从高到低，取第一个不超过评估值的阈值）
    pub reward_table: Vec<(f64, f64)>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 800,
            exploration: std::f64::consts::SQRT_2,
            prior_weight: 0.0,
            rollout_epsilon: 0.1,
            rollout_depth: Some(64),
            reward_table: vec![(0.05, 1.0), (0.0, 0.6), (-0.05, 0.4)],
        }
    }
}

impl MctsConfig {
    /// 把评估值离散化为 [0, 1] 的回报
    pub fn reward_for(&self, evaluation: f64) -> f64 {
        self.reward_table
            .iter()
            .find(|(threshold, _)| evaluation >= *threshold)
            .map_or(0.0, |(_, reward)| *reward)
    }
}

/// 节点编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct MctsNode {
    state: BoardState,
    /// 到达该节点的走法（根节点为空）
    mv: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: bool,
    visits: u32,
    /// 从走出 `mv` 的一方看的累计回报
    reward: f64,
    prior: f64,
}

impl MctsNode {
    fn new(state: BoardState, mv: Option<Move>, parent: Option<NodeId>, prior: f64) -> Self {
        Self {
            state,
            mv,
            parent,
            children: Vec::new(),
            expanded: false,
            visits: 0,
            reward: 0.0,
            prior,
        }
    }

    /// UCT 分值；未访问过的节点优先
    fn uct(&self, parent_visits: u32, config: &MctsConfig) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        let exploitation = self.reward / visits;
        let exploration = config.exploration * ((parent_visits as f64).ln() / visits).sqrt();
        let bias = config.prior_weight * self.prior / (visits + 1.0);
        exploitation + exploration + bias
    }
}

/// 一次搜索的结果
#[derive(Debug, Clone)]
pub struct MctsReport {
    /// 访问次数最多的根节点子走法
    pub best: Option<Move>,
    pub rounds: u32,
    pub root_visits: u32,
    pub stop: StopReason,
}

/// MCTS 引擎
pub struct MctsEngine {
    config: MctsConfig,
    evaluator: Evaluator,
    rng: ChaCha8Rng,
    nodes: Vec<MctsNode>,
}

impl MctsEngine {
    pub fn new(config: MctsConfig, evaluator: Evaluator, seed: u64) -> Self {
        Self {
            config,
            evaluator,
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes: Vec::new(),
        }
    }

    /// 在时间上限内搜索
    pub fn search(&mut self, state: &BoardState) -> MctsReport {
        let deadline = Instant::now() + Duration::from_millis(self.config.time_limit_ms);
        self.reset(state);
        let mut rounds = 0;
        // 至少完成一轮
        loop {
            self.round();
            rounds += 1;
            if Instant::now() >= deadline {
                break;
            }
        }
        self.report(rounds, StopReason::Deadline)
    }

    /// 固定轮数搜索
    pub fn run_rounds(&mut self, state: &BoardState, rounds: u32) -> MctsReport {
        self.reset(state);
        for _ in 0..rounds {
            self.round();
        }
        self.report(rounds, StopReason::Completed)
    }

    /// 根节点各子走法的访问次数
    pub fn child_visits(&self) -> Vec<(Move, u32)> {
        let Some(root) = self.nodes.first() else {
            return Vec::new();
        };
        root.children
            .iter()
            .filter_map(|id| {
                let child = self.node(*id);
                Some((child.mv?, child.visits))
            })
            .collect()
    }

    /// 树中节点总数
    pub fn tree_size(&self) -> usize {
        self.nodes.len()
    }

    fn report(&self, rounds: u32, stop: StopReason) -> MctsReport {
        let report = MctsReport {
            best: self.best_action(),
            rounds,
            root_visits: self.nodes.first().map_or(0, |root| root.visits),
            stop,
        };
        tracing::debug!(
            rounds = report.rounds,
            nodes = self.nodes.len(),
            best = ?report.best,
            "mcts search finished"
        );
        report
    }

    fn reset(&mut self, state: &BoardState) {
        self.nodes.clear();
        self.nodes.push(MctsNode::new(state.clone(), None, None, 0.0));
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.index()]
    }

    fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// 一轮：选择、展开、模拟、回传
    fn round(&mut self) {
        let mut current = self.root();
        while self.node(current).expanded {
            match self.select_child(current) {
                Some(child) => current = child,
                None => break,
            }
        }

        if !self.node(current).expanded && !self.node(current).state.winner().is_decided() {
            self.expand(current);
            if let Some(child) = self.select_child(current) {
                current = child;
            }
        }

        let first_team_reward = self.simulate(current);
        self.backpropagate(current, first_team_reward);
    }

    fn select_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for &child in &node.children {
            let score = self.node(child).uct(node.visits, &self.config);
            if best.is_none() || score > best_score {
                best = Some(child);
                best_score = score;
            }
        }
        best
    }

    /// 为每个合法走法生成子节点
    fn expand(&mut self, id: NodeId) {
        let state = self.node(id).state.clone();
        let mover = state.turn();
        let mut moves = state.legal_moves();
        moves.shuffle(&mut self.rng);

        for mv in moves {
            let mut next = state.clone();
            if let Err(e) = next.apply_move(mv) {
                unreachable!("legal move rejected during expansion: {e}");
            }
            let prior = if self.config.prior_weight > 0.0 {
                self.evaluator.evaluate(&next, &state, mover)
            } else {
                0.0
            };
            let child = self.allocate(MctsNode::new(next, Some(mv), Some(id), prior));
            self.node_mut(id).children.push(child);
        }
        self.node_mut(id).expanded = true;
    }

    /// 从节点出发模拟，返回第一队（0 号与 3 号）的回报
    fn simulate(&mut self, id: NodeId) -> f64 {
        let start = self.node(id).state.clone();
        let perspective = start.turn();
        let mut board = start.clone();
        let mut steps = 0u32;

        while !board.winner().is_decided() {
            if self.config.rollout_depth.is_some_and(|limit| steps >= limit) {
                break;
            }
            let moves = board.legal_moves();
            let Some(mv) = self.rollout_move(&board, &moves) else {
                break;
            };
            if let Err(e) = board.apply_move(mv) {
                unreachable!("legal move rejected during rollout: {e}");
            }
            steps += 1;
        }

        match board.winner() {
            Winner::Team(Team::First) => 1.0,
            Winner::Team(Team::Second) => 0.0,
            Winner::Draw => DRAW_REWARD,
            Winner::Nobody => {
                let evaluation = self.evaluator.evaluate(&board, &start, perspective);
                let reward = self.config.reward_for(evaluation);
                match perspective.team() {
                    Team::First => reward,
                    Team::Second => 1.0 - reward,
                }
            }
        }
    }

    /// 模拟走子：小概率完全随机，否则选离目标最近的一步
    fn rollout_move(&mut self, board: &BoardState, moves: &[Move]) -> Option<Move> {
        if moves.is_empty() {
            return None;
        }
        if self.rng.gen::<f64>() < self.config.rollout_epsilon {
            return moves.choose(&mut self.rng).copied();
        }

        let mut shuffled = moves.to_vec();
        shuffled.shuffle(&mut self.rng);
        let mover = board.turn();
        shuffled
            .into_iter()
            .max_by_key(|mv| progress(mover, mv))
    }

    /// 回传：路径上每个节点访问次数加一，回报记在走出该节点的一方
    fn backpropagate(&mut self, leaf: NodeId, first_team_reward: f64) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let parent = self.node(id).parent;
            let mover_team = parent.map(|p| self.node(p).state.turn().team());
            let node = self.node_mut(id);
            node.visits += 1;
            match mover_team {
                Some(Team::First) => node.reward += first_team_reward,
                Some(Team::Second) => node.reward += 1.0 - first_team_reward,
                None => {}
            }
            current = parent;
        }
    }

    fn best_action(&self) -> Option<Move> {
        let root = self.nodes.first()?;
        let mut best: Option<&MctsNode> = None;
        for &child in &root.children {
            let node = self.node(child);
            if best.is_none_or(|b| node.visits > b.visits) {
                best = Some(node);
            }
        }
        best.and_then(|node| node.mv)
    }
}

/// 走法让棋子离目标角落近了多少（结束回合为 0）
fn progress(mover: PlayerId, mv: &Move) -> i64 {
    match (mv.from(), mv.to()) {
        (Some(from), Some(to)) => {
            goal_distance(mover, from) as i64 - goal_distance(mover, to) as i64
        }
        _ => 0,
    }
}
