//! 走法定义、合法性校验与合法走法生成

use serde::{Deserialize, Serialize};

use crate::board::{leaves_objective, BoardState};
use crate::constants::DIRECTIONS;
use crate::piece::{PlayerId, Point};

/// 走法
///
/// `Step` 为滑动（距离 1）或跳跃（距离 2），`EndTurn` 结束本回合的连跳。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Step {
        player: PlayerId,
        from: Point,
        to: Point,
    },
    EndTurn {
        player: PlayerId,
    },
}

impl Move {
    /// 创建移动棋子的走法
    pub fn step(player: PlayerId, from: Point, to: Point) -> Self {
        Move::Step { player, from, to }
    }

    /// 创建结束回合的走法
    pub fn end_turn(player: PlayerId) -> Self {
        Move::EndTurn { player }
    }

    pub fn player(&self) -> PlayerId {
        match self {
            Move::Step { player, .. } | Move::EndTurn { player } => *player,
        }
    }

    pub fn from(&self) -> Option<Point> {
        match self {
            Move::Step { from, .. } => Some(*from),
            Move::EndTurn { .. } => None,
        }
    }

    pub fn to(&self) -> Option<Point> {
        match self {
            Move::Step { to, .. } => Some(*to),
            Move::EndTurn { .. } => None,
        }
    }

    pub fn is_end_turn(&self) -> bool {
        matches!(self, Move::EndTurn { .. })
    }

    /// 起点到终点的切比雪夫距离，结束回合为 0
    pub fn max_dist(&self) -> u8 {
        match self {
            Move::Step { from, to, .. } => from.chebyshev(*to),
            Move::EndTurn { .. } => 0,
        }
    }

    /// 是否为沿八个方向之一、距离为 2 的跳跃
    pub fn is_hop(&self) -> bool {
        match self {
            Move::Step { from, to, .. } => {
                let dx = from.x.abs_diff(to.x);
                let dy = from.y.abs_diff(to.y);
                (dx == 2 || dy == 2) && (dx == 0 || dx == 2) && (dy == 0 || dy == 2)
            }
            Move::EndTurn { .. } => false,
        }
    }

    /// 跳跃越过的中间格
    pub fn mid(&self) -> Option<Point> {
        match self {
            Move::Step { from, to, .. } if self.is_hop() => Some(Point::new_unchecked(
                (from.x + to.x) / 2,
                (from.y + to.y) / 2,
            )),
            _ => None,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Step { player, from, to } => write!(f, "{}: {} -> {}", player, from, to),
            Move::EndTurn { player } => write!(f, "{}: end turn", player),
        }
    }
}

impl BoardState {
    /// 校验走法是否合法
    pub fn is_legal(&self, mv: &Move) -> bool {
        match *mv {
            Move::EndTurn { player } => {
                player == self.turn()
                    && (self.is_hop_active() || self.has_reached_objective(player))
            }
            Move::Step { player, from, to } => {
                if !from.is_valid() || !to.is_valid() {
                    return false;
                }
                if player != self.turn()
                    || self.piece_at(from) != Some(player)
                    || self.piece_at(to).is_some()
                {
                    return false;
                }
                // 进入目标营地的棋子不能再离开
                if leaves_objective(player, from, to) {
                    return false;
                }

                if mv.is_hop() {
                    let over = mv.mid().and_then(|m| self.piece_at(m));
                    let chain_ok = match self.last_moved() {
                        None => true,
                        Some(last) => last == from,
                    };
                    over.is_some() && chain_ok && !self.visited_this_turn(to)
                } else if mv.max_dist() == 1 {
                    !self.is_hop_active()
                } else {
                    false
                }
            }
        }
    }

    /// 生成当前走子方的所有合法走法
    ///
    /// 连跳进行中时只有结束回合与继续跳跃；否则对每枚棋子的八个方向各给出一个候选
    /// （相邻有子则跳，否则滑），占满目标营地后再附加结束回合。
    pub fn legal_moves(&self) -> Vec<Move> {
        let player = self.turn();

        if let Some(last) = self.last_moved() {
            let mut moves = vec![Move::end_turn(player)];
            moves.extend(self.hops_from(last));
            return moves;
        }

        let mut moves = Vec::with_capacity(64);
        for from in self.pieces(player) {
            self.collect_piece_moves(from, &mut moves);
        }
        if self.has_reached_objective(player) {
            moves.push(Move::end_turn(player));
        }
        moves
    }

    /// 生成指定棋子的合法走法（非当前走子方的棋子返回空）
    pub fn legal_moves_for_piece(&self, from: Point) -> Vec<Move> {
        if self.piece_at(from) != Some(self.turn()) {
            return Vec::new();
        }
        match self.last_moved() {
            Some(last) if last == from => self.hops_from(from),
            Some(_) => Vec::new(),
            None => {
                let mut moves = Vec::with_capacity(8);
                self.collect_piece_moves(from, &mut moves);
                moves
            }
        }
    }

    /// 从指定位置出发的合法跳跃
    pub fn hops_from(&self, from: Point) -> Vec<Move> {
        let player = self.turn();
        DIRECTIONS
            .iter()
            .filter_map(|&(dx, dy)| {
                from.offset(dx, dy)?;
                from.offset(dx * 2, dy * 2)
            })
            .map(|to| Move::step(player, from, to))
            .filter(|mv| self.is_legal(mv))
            .collect()
    }

    fn collect_piece_moves(&self, from: Point, moves: &mut Vec<Move>) {
        let player = self.turn();
        for (dx, dy) in DIRECTIONS {
            let Some(neighbour) = from.offset(dx, dy) else {
                continue;
            };
            let to = if self.piece_at(neighbour).is_some() {
                match from.offset(dx * 2, dy * 2) {
                    Some(to) => to,
                    None => continue,
                }
            } else {
                neighbour
            };
            let mv = Move::step(player, from, to);
            if self.is_legal(&mv) {
                moves.push(mv);
            }
        }
    }
}
