//! 连跳路径还原
//!
//! 搜索只给出连跳的起点与终点，这里把它还原为逐步执行的跳跃序列，末尾附加结束回合。

use std::collections::HashSet;

use crate::board::{leaves_objective, Board, BoardState};
use crate::constants::DIRECTIONS;
use crate::moves::Move;
use crate::piece::{PlayerId, Point};

/// 还原从 `from` 连跳到 `to` 的走法序列
///
/// 深度优先，返回找到的第一条路径（不保证最短）。找不到时返回 None。
pub fn reconstruct_hop_path(state: &BoardState, from: Point, to: Point) -> Option<Vec<Move>> {
    let player = state.piece_at(from)?;
    if from == to {
        return None;
    }

    // 把移动的棋子从棋盘上拿走，起点不能作为被跳过的格子
    let mut board = state.board().clone();
    board.set(from, None);

    // 连跳中途还原时，本回合已经到过的格子同样不能再落
    let mut visited: HashSet<Point> = state.hop_trail().iter().copied().collect();
    visited.insert(from);
    let mut path = Vec::new();
    if search(&board, player, from, to, &mut visited, &mut path) {
        path.push(Move::end_turn(player));
        Some(path)
    } else {
        None
    }
}

fn search(
    board: &Board,
    player: PlayerId,
    current: Point,
    target: Point,
    visited: &mut HashSet<Point>,
    path: &mut Vec<Move>,
) -> bool {
    if current == target {
        return true;
    }

    for (dx, dy) in DIRECTIONS {
        let Some(over) = current.offset(dx, dy) else {
            continue;
        };
        let Some(landing) = current.offset(dx * 2, dy * 2) else {
            continue;
        };
        if board.get(over).is_none()
            || board.get(landing).is_some()
            || visited.contains(&landing)
            || leaves_objective(player, current, landing)
        {
            continue;
        }

        visited.insert(landing);
        path.push(Move::step(player, current, landing));
        if search(board, player, landing, target, visited, path) {
            return true;
        }
        path.pop();
    }

    false
}
