//! 局面特征
//!
//! 每个特征只依赖（后继局面，原局面，评估方）和静态几何表，给出权重与得分，
//! 评估值为各特征“权重 × 得分”之和。

use halma_core::{
    corner_distance, corner_relative, goal_distance, in_home_base, in_objective_base, BoardState,
    PlayerId, Point, DIRECTIONS, MAX_BASE_TURN, PIECES_PER_PLAYER,
};
use serde::{Deserialize, Serialize};

/// 曼哈顿距离的上界，加 2 保证每枚棋子的贡献为正
const GOAL_DISTANCE_CEILING: f64 = 32.0;
const GOAL_DISTANCE_NORMALIZER: f64 = PIECES_PER_PLAYER as f64 * 30.0;

/// 距离对方营地角落小于该值时开始扣分
const OPPONENT_BASE_RADIUS: f64 = 5.0;

/// 与最近己方棋子的距离超过该值才算离群
const HUDDLE_THRESHOLD: f64 = 3.0;

/// 堵死队友时的惩罚
const BLOCK_PENALTY: f64 = -500.0;

/// 相对目标角落的“前进”方向（0 号玩家视角）
const PROGRESS_OFFSETS: [(i8, i8); 3] = [(0, 1), (1, 1), (1, 0)];

/// 各玩家前进方向的符号
const PLAYER_MULTIPLIERS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// 堵住队友最后一格时，队友所在的格子（相对目标角落）
const TRAPPED_FRIEND: (u8, u8) = (0, 0);

/// 堵住队友最后一格时，围住它的己方棋子（相对目标角落）
const TRAP_CELLS: [(u8, u8); 6] = [(1, 1), (0, 1), (1, 0), (2, 0), (0, 2), (2, 2)];

/// 局面特征
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    /// 己方与队友离目标角落越近越好，对手反之
    GoalProgress(f64),
    /// 早期离开出发营地的激励，权重随回合数线性增长，期限后归零
    LeaveBase(f64),
    /// 仍然能跳的棋子（或已进入目标营地的棋子）越多越好
    CanHop(f64),
    /// 不在目标营地内的棋子数惩罚
    OutsideObjective(f64),
    /// 靠近对手出发角落的惩罚
    AvoidOpponentBase(f64),
    /// 新增的可以一步进入目标营地空位的棋子
    AdjacentToObjective(f64),
    /// 离群棋子惩罚
    Huddle(f64),
    /// 把队友最后一枚棋子堵在目标角落时的固定惩罚
    DontBlockTeammate,
}

impl Feature {
    /// 特征权重
    pub fn weight(&self, board: &BoardState, _original: &BoardState, _player: PlayerId) -> f64 {
        match *self {
            Feature::LeaveBase(per_turn) => {
                let turns = board.turns_played();
                if turns <= MAX_BASE_TURN {
                    turns as f64 * per_turn
                } else {
                    0.0
                }
            }
            Feature::GoalProgress(w)
            | Feature::CanHop(w)
            | Feature::OutsideObjective(w)
            | Feature::AvoidOpponentBase(w)
            | Feature::AdjacentToObjective(w)
            | Feature::Huddle(w) => w,
            Feature::DontBlockTeammate => 1.0,
        }
    }

    /// 特征得分
    pub fn score(&self, board: &BoardState, original: &BoardState, player: PlayerId) -> f64 {
        match self {
            Feature::GoalProgress(_) => goal_progress(board, player),
            Feature::LeaveBase(_) => {
                let at_home = board
                    .pieces(player)
                    .iter()
                    .filter(|p| in_home_base(player, **p))
                    .count();
                -(at_home as f64) / 10.0
            }
            Feature::CanHop(_) => {
                let mobile = board
                    .pieces(player)
                    .iter()
                    .filter(|p| in_objective_base(player, **p) || can_hop(board, **p))
                    .count();
                mobile as f64 / 10.0
            }
            Feature::OutsideObjective(_) => {
                let outside = board
                    .pieces(player)
                    .iter()
                    .filter(|p| !in_objective_base(player, **p))
                    .count();
                -(outside as f64) / 10.0
            }
            Feature::AvoidOpponentBase(_) => avoid_opponent_base(board, player),
            Feature::AdjacentToObjective(_) => {
                let gained = adjacent_to_objective(board, player) as f64
                    - adjacent_to_objective(original, player) as f64;
                gained.max(0.0) / 10.0
            }
            Feature::Huddle(_) => huddle(board, player),
            Feature::DontBlockTeammate => {
                if blocks_teammate(board, player) {
                    BLOCK_PENALTY
                } else {
                    0.0
                }
            }
        }
    }

    /// 加权得分
    pub fn weighted(&self, board: &BoardState, original: &BoardState, player: PlayerId) -> f64 {
        self.weight(board, original, player) * self.score(board, original, player)
    }
}

fn goal_progress(board: &BoardState, player: PlayerId) -> f64 {
    let side_total = |members: [PlayerId; 2]| -> f64 {
        members
            .iter()
            .flat_map(|m| {
                board
                    .pieces(*m)
                    .into_iter()
                    .map(move |p| GOAL_DISTANCE_CEILING - goal_distance(*m, p) as f64)
            })
            .sum::<f64>()
            / GOAL_DISTANCE_NORMALIZER
    };
    side_total([player, player.teammate()]) - side_total(player.opponents())
}

/// 棋子在任意方向上是否有可跳的位置
fn can_hop(board: &BoardState, from: Point) -> bool {
    DIRECTIONS.iter().any(|&(dx, dy)| {
        let over = from.offset(dx, dy);
        let landing = from.offset(dx * 2, dy * 2);
        matches!((over, landing), (Some(over), Some(landing))
            if board.piece_at(over).is_some() && board.piece_at(landing).is_none())
    })
}

fn avoid_opponent_base(board: &BoardState, player: PlayerId) -> f64 {
    let mut total = 0.0;
    for p in board.pieces(player) {
        for opponent in player.opponents() {
            let d = corner_distance(opponent.index(), p);
            if d < OPPONENT_BASE_RADIUS {
                total -= (OPPONENT_BASE_RADIUS - d).powi(2);
            }
        }
    }
    total
}

/// 目标营地外、沿前进方向一步（滑或跳）即可进入目标营地空位的棋子数
fn adjacent_to_objective(board: &BoardState, player: PlayerId) -> usize {
    let (mx, my) = PLAYER_MULTIPLIERS[player.index()];
    board
        .pieces(player)
        .into_iter()
        .filter(|p| !in_objective_base(player, *p))
        .filter(|p| {
            PROGRESS_OFFSETS.iter().any(|&(ox, oy)| {
                let (dx, dy) = (ox * mx, oy * my);
                let Some(next) = p.offset(dx, dy) else {
                    return false;
                };
                if board.piece_at(next).is_none() {
                    return in_objective_base(player, next);
                }
                match p.offset(dx * 2, dy * 2) {
                    Some(landing) => {
                        board.piece_at(landing).is_none() && in_objective_base(player, landing)
                    }
                    None => false,
                }
            })
        })
        .count()
}

fn huddle(board: &BoardState, player: PlayerId) -> f64 {
    let pieces = board.pieces(player);
    let tally: f64 = pieces
        .iter()
        .filter(|p| !in_objective_base(player, **p))
        .map(|p| {
            let closest = pieces
                .iter()
                .filter(|other| *other != p)
                .map(|other| p.euclidean(*other))
                .fold(1000.0, f64::min);
            (closest - HUDDLE_THRESHOLD).max(0.0)
        })
        .sum();
    tally / -(2.0 * PIECES_PER_PLAYER as f64)
}

/// 队友在目标角落，且周围六格全是自己的棋子
fn blocks_teammate(board: &BoardState, player: PlayerId) -> bool {
    let corner = player.teammate().index();
    let (fx, fy) = TRAPPED_FRIEND;
    if board.piece_at(corner_relative(corner, fx, fy)) != Some(player.teammate()) {
        return false;
    }
    TRAP_CELLS
        .iter()
        .all(|&(x, y)| board.piece_at(corner_relative(corner, x, y)) == Some(player))
}

#[cfg(test)]
mod tests {
    use super::*;
    use halma_core::{Board, Move};

    fn p(x: u8, y: u8) -> Point {
        Point::new_unchecked(x, y)
    }

    fn player(id: u8) -> PlayerId {
        PlayerId::new_unchecked(id)
    }

    #[test]
    fn test_goal_progress_symmetric_at_start() {
        let state = BoardState::initial();
        let score = Feature::GoalProgress(1.0).score(&state, &state, player(0));
        assert!(score.abs() < 1e-9, "初始局面两队对称，得分应为 0: {}", score);
    }

    #[test]
    fn test_goal_progress_rewards_advance() {
        let before = BoardState::initial();
        let mut after = before.clone();
        after
            .apply_move(Move::step(player(0), p(3, 1), p(4, 2)))
            .unwrap();
        let feature = Feature::GoalProgress(0.9);
        assert!(
            feature.score(&after, &before, player(0)) > feature.score(&before, &before, player(0))
        );
        // 队友视角相同
        assert_eq!(
            feature.score(&after, &before, player(0)),
            feature.score(&after, &before, player(3))
        );
    }

    #[test]
    fn test_leave_base_weight_by_turn() {
        let feature = Feature::LeaveBase(0.002);
        let early = BoardState::initial().with_turn_number(50);
        let late = BoardState::initial().with_turn_number(MAX_BASE_TURN + 1);
        assert!((feature.weight(&early, &early, player(0)) - 0.1).abs() < 1e-9);
        assert_eq!(feature.weight(&late, &late, player(0)), 0.0);
        assert!((feature.score(&early, &early, player(0)) + 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_outside_objective() {
        let state = BoardState::initial();
        let score = Feature::OutsideObjective(1.0).score(&state, &state, player(0));
        assert!((score + 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_can_hop_counts_mobile_pieces() {
        let mut board = Board::empty();
        board.set(p(5, 5), Some(player(0)));
        board.set(p(6, 5), Some(player(1)));
        board.set(p(10, 2), Some(player(0)));
        let state = BoardState::from_board(board, player(0));
        let score = Feature::CanHop(1.0).score(&state, &state, player(0));
        assert!((score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_avoid_opponent_base() {
        let mut board = Board::empty();
        // 离 1 号角落 (15,0) 距离 3
        board.set(p(12, 0), Some(player(0)));
        let state = BoardState::from_board(board, player(0));
        let score = Feature::AvoidOpponentBase(1.0).score(&state, &state, player(0));
        assert!((score + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjacent_to_objective_gain() {
        let mut before_board = Board::empty();
        before_board.set(p(10, 10), Some(player(0)));
        let before = BoardState::from_board(before_board, player(0));

        // (13,11) 沿 (1,1) 方向一步可进入 (14,12)
        let mut after_board = Board::empty();
        after_board.set(p(13, 11), Some(player(0)));
        let after = BoardState::from_board(after_board, player(0));

        let feature = Feature::AdjacentToObjective(1.0);
        assert!((feature.score(&after, &before, player(0)) - 0.1).abs() < 1e-9);
        assert_eq!(feature.score(&before, &after, player(0)), 0.0);
    }

    #[test]
    fn test_huddle_penalizes_stragglers() {
        let mut board = Board::empty();
        board.set(p(5, 5), Some(player(0)));
        board.set(p(6, 5), Some(player(0)));
        let close = BoardState::from_board(board.clone(), player(0));
        assert_eq!(Feature::Huddle(1.0).score(&close, &close, player(0)), 0.0);

        board.set(p(6, 5), None);
        board.set(p(10, 5), Some(player(0)));
        let apart = BoardState::from_board(board, player(0));
        let score = Feature::Huddle(1.0).score(&apart, &apart, player(0));
        // 两枚棋子各距 5，各超出 2
        assert!((score + 4.0 / 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_dont_block_teammate() {
        let mut board = Board::empty();
        // 3 号玩家的最后一枚棋子在 (0,0)，被 0 号玩家围住
        board.set(p(0, 0), Some(player(3)));
        for (x, y) in TRAP_CELLS {
            board.set(p(x, y), Some(player(0)));
        }
        let state = BoardState::from_board(board.clone(), player(0));
        let feature = Feature::DontBlockTeammate;
        assert_eq!(feature.weight(&state, &state, player(0)), 1.0);
        // 0 号玩家的目标角落是 (15,15)，这里堵住的是 3 号玩家
        assert_eq!(feature.score(&state, &state, player(3)), 0.0);

        let mut mirrored = Board::empty();
        mirrored.set(p(15, 15), Some(player(3)));
        for (x, y) in TRAP_CELLS {
            mirrored.set(p(15 - x, 15 - y), Some(player(0)));
        }
        let state = BoardState::from_board(mirrored, player(0));
        assert_eq!(feature.score(&state, &state, player(0)), BLOCK_PENALTY);
    }

    #[test]
    fn test_feature_serde() {
        let features = vec![Feature::GoalProgress(0.9), Feature::DontBlockTeammate];
        let json = serde_json::to_string(&features).unwrap();
        let parsed: Vec<Feature> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, features);
    }
}
