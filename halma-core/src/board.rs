//! 棋盘与对局状态

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_CELLS, BOARD_SIZE, MAX_BASE_TURN, MAX_TURN, NUMBER_OF_PLAYERS};
use crate::error::{HalmaError, Result};
use crate::geometry::{base_points, in_base, in_objective_base};
use crate::moves::Move;
use crate::piece::{PlayerId, Point, Team};

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// 16x16 棋盘，索引为 y * 16 + x
    squares: Vec<Option<PlayerId>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; BOARD_CELLS],
        }
    }

    /// 创建初始棋盘：每名玩家的 13 枚棋子占满自己的出发营地
    pub fn initial() -> Self {
        let mut board = Self::empty();
        for player in PlayerId::ALL {
            for &p in base_points(player.index()) {
                board.set(p, Some(player));
            }
        }
        board
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Point) -> Option<PlayerId> {
        if pos.is_valid() {
            self.squares[pos.to_index()]
        } else {
            None
        }
    }

    /// 设置指定位置的棋子
    pub fn set(&mut self, pos: Point, owner: Option<PlayerId>) {
        if pos.is_valid() {
            self.squares[pos.to_index()] = owner;
        }
    }

    /// 移动棋子（不检查规则）
    pub fn move_piece(&mut self, from: Point, to: Point) {
        let owner = self.get(from);
        self.set(from, None);
        self.set(to, owner);
    }

    /// 获取指定玩家的所有棋子位置
    pub fn pieces(&self, player: PlayerId) -> Vec<Point> {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(player))
            .filter_map(|(index, _)| Point::from_index(index))
            .collect()
    }

    /// 获取所有棋子
    pub fn all_pieces(&self) -> Vec<(Point, PlayerId)> {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, owner)| Some((Point::from_index(index)?, (*owner)?)))
            .collect()
    }

    /// 玩家是否已占满自己的目标营地
    pub fn has_reached_objective(&self, player: PlayerId) -> bool {
        base_points(player.teammate().index())
            .iter()
            .all(|p| self.get(*p) == Some(player))
    }

    /// 队伍是否获胜（两名队员都占满各自目标营地）
    pub fn team_has_won(&self, team: Team) -> bool {
        team.members().iter().all(|p| self.has_reached_objective(*p))
    }

    /// 玩家是否还有棋子停留在目标营地以外的任何营地
    pub fn lingers_in_foreign_base(&self, player: PlayerId) -> bool {
        let objective = player.teammate().index();
        self.pieces(player).iter().any(|p| {
            (0..NUMBER_OF_PLAYERS).any(|corner| corner != objective && in_base(corner, *p))
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Board {
    /// 从 y=15 到 y=0 逐行输出，空格分隔，`-` 表示空位
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in (0..BOARD_SIZE as u8).rev() {
            let row: Vec<String> = (0..BOARD_SIZE as u8)
                .map(|x| match self.get(Point::new_unchecked(x, y)) {
                    Some(owner) => owner.id().to_string(),
                    None => "-".to_string(),
                })
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

/// 胜负结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    /// 对局进行中
    Nobody,
    /// 达到回合上限判和
    Draw,
    /// 某队获胜
    Team(Team),
}

impl Winner {
    /// 对局是否已结束
    pub fn is_decided(&self) -> bool {
        !matches!(self, Winner::Nobody)
    }
}

/// 完整的对局状态（棋盘、走子方、回合数、连跳状态）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    board: Board,
    /// 完整回合数（3 号玩家交出走子权时 +1）
    turn_number: u32,
    turn_player: PlayerId,
    winner: Winner,
    /// 本回合连跳中最后落子的位置，仅在连跳进行中非空
    last_moved: Option<Point>,
    /// 本回合连跳经过的格子（起点及每个落点）
    hop_trail: Vec<Point>,
}

impl BoardState {
    /// 创建初始状态
    pub fn initial() -> Self {
        Self::from_board(Board::initial(), PlayerId::new_unchecked(0))
    }

    /// 从棋盘创建状态
    pub fn from_board(board: Board, turn_player: PlayerId) -> Self {
        let mut state = Self {
            board,
            turn_number: 0,
            turn_player,
            winner: Winner::Nobody,
            last_moved: None,
            hop_trail: Vec::new(),
        };
        state.winner = state.team_winner().map_or(Winner::Nobody, Winner::Team);
        state
    }

    /// 设置回合数
    pub fn with_turn_number(mut self, turn_number: u32) -> Self {
        self.turn_number = turn_number;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 当前胜负；回合数达到上限时总是判和
    pub fn winner(&self) -> Winner {
        if self.turn_number >= MAX_TURN {
            Winner::Draw
        } else {
            self.winner
        }
    }

    /// 直接指定获胜方（超时、掉线等由外部裁定的情况）
    pub fn force_winner(&mut self, team: Team) {
        self.winner = Winner::Team(team);
    }

    /// 当前走子方
    pub fn turn(&self) -> PlayerId {
        self.turn_player
    }

    /// 已完成的完整回合数
    pub fn turns_played(&self) -> u32 {
        self.turn_number
    }

    pub fn last_moved(&self) -> Option<Point> {
        self.last_moved
    }

    /// 本回合连跳是否正在进行
    pub fn is_hop_active(&self) -> bool {
        self.last_moved.is_some()
    }

    /// 本回合连跳是否已经到过该格
    pub(crate) fn visited_this_turn(&self, p: Point) -> bool {
        self.hop_trail.contains(&p)
    }

    /// 本回合连跳经过的格子
    pub(crate) fn hop_trail(&self) -> &[Point] {
        &self.hop_trail
    }

    pub fn piece_at(&self, p: Point) -> Option<PlayerId> {
        self.board.get(p)
    }

    pub fn pieces(&self, player: PlayerId) -> Vec<Point> {
        self.board.pieces(player)
    }

    pub fn has_reached_objective(&self, player: PlayerId) -> bool {
        self.board.has_reached_objective(player)
    }

    /// 执行走法
    ///
    /// 非法走法返回 `InvalidMove`，状态保持不变。
    pub fn apply_move(&mut self, mv: Move) -> Result<()> {
        if !self.is_legal(&mv) {
            return Err(HalmaError::InvalidMove(mv));
        }

        let mover = mv.player();
        let turn_number = self.turn_number;
        match mv {
            Move::Step { from, to, .. } if mv.is_hop() => {
                self.board.move_piece(from, to);
                if self.hop_trail.is_empty() {
                    self.hop_trail.push(from);
                }
                self.hop_trail.push(to);
                self.last_moved = Some(to);
            }
            Move::Step { from, to, .. } => {
                self.board.move_piece(from, to);
                self.end_turn();
            }
            Move::EndTurn { .. } => self.end_turn(),
        }

        self.update_winner(mover, turn_number, !self.is_hop_active());
        Ok(())
    }

    /// 交出走子权
    fn end_turn(&mut self) {
        self.last_moved = None;
        self.hop_trail.clear();
        if self.turn_player.index() == NUMBER_OF_PLAYERS - 1 {
            self.turn_number += 1;
        }
        self.turn_player = self.turn_player.next();
    }

    fn team_winner(&self) -> Option<Team> {
        [Team::First, Team::Second]
            .into_iter()
            .find(|team| self.board.team_has_won(*team))
    }

    /// 走子后更新胜负
    ///
    /// 超过期限仍有棋子留在非目标营地的一方判负；同一步产生的队伍胜利优先。
    /// 期限按走子方所在的回合判断（`turn_number` 为走子前的回合数）。
    fn update_winner(&mut self, mover: PlayerId, turn_number: u32, handed_over: bool) {
        if self.winner.is_decided() {
            return;
        }
        if handed_over
            && turn_number >= MAX_BASE_TURN
            && self.board.lingers_in_foreign_base(mover)
        {
            tracing::debug!(
                player = %mover,
                turn = turn_number,
                "pieces left in a base after the deadline"
            );
            self.winner = Winner::Team(mover.team().other());
        }
        if let Some(team) = self.team_winner() {
            self.winner = Winner::Team(team);
        }
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}

/// 走法是否把棋子带出目标营地
pub(crate) fn leaves_objective(player: PlayerId, from: Point, to: Point) -> bool {
    in_objective_base(player, from) && !in_objective_base(player, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PIECES_PER_PLAYER;

    fn p(x: u8, y: u8) -> Point {
        Point::new_unchecked(x, y)
    }

    fn player(id: u8) -> PlayerId {
        PlayerId::new_unchecked(id)
    }

    #[test]
    fn test_initial_board() {
        let board = Board::initial();
        for id in 0..4 {
            assert_eq!(board.pieces(player(id)).len(), PIECES_PER_PLAYER);
        }
        assert_eq!(board.get(p(0, 0)), Some(player(0)));
        assert_eq!(board.get(p(15, 0)), Some(player(1)));
        assert_eq!(board.get(p(0, 15)), Some(player(2)));
        assert_eq!(board.get(p(15, 15)), Some(player(3)));
        assert_eq!(board.get(p(7, 7)), None);
        assert_eq!(board.all_pieces().len(), 4 * PIECES_PER_PLAYER);
    }

    #[test]
    fn test_move_piece() {
        let mut board = Board::initial();
        board.move_piece(p(3, 1), p(4, 2));
        assert!(board.get(p(3, 1)).is_none());
        assert_eq!(board.get(p(4, 2)), Some(player(0)));
    }

    #[test]
    fn test_display_rows() {
        let text = Board::initial().to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 16);
        assert_eq!(rows[0], "2 2 2 2 - - - - - - - - 3 3 3 3");
        assert_eq!(rows[15], "0 0 0 0 - - - - - - - - 1 1 1 1");
    }

    #[test]
    fn test_slide_advances_turn() {
        let mut state = BoardState::initial();
        state
            .apply_move(Move::step(player(0), p(3, 1), p(4, 2)))
            .unwrap();
        assert_eq!(state.turn(), player(1));
        assert_eq!(state.turns_played(), 0);
        assert!(!state.is_hop_active());
    }

    #[test]
    fn test_turn_number_after_full_round() {
        let mut state = BoardState::initial();
        let slides = [
            Move::step(player(0), p(3, 1), p(4, 2)),
            Move::step(player(1), p(12, 1), p(11, 2)),
            Move::step(player(2), p(3, 14), p(4, 13)),
            Move::step(player(3), p(12, 14), p(11, 13)),
        ];
        for mv in slides {
            state.apply_move(mv).unwrap();
        }
        assert_eq!(state.turn(), player(0));
        assert_eq!(state.turns_played(), 1);
    }

    #[test]
    fn test_illegal_move_rejected() {
        let mut state = BoardState::initial();
        let before = state.clone();
        let mv = Move::step(player(1), p(12, 1), p(11, 2));
        assert_eq!(state.apply_move(mv), Err(HalmaError::InvalidMove(mv)));
        assert_eq!(state, before, "非法走法不应改变状态");
    }

    #[test]
    fn test_hop_keeps_turn_until_end() {
        let mut state = BoardState::initial();
        state
            .apply_move(Move::step(player(0), p(2, 1), p(4, 3)))
            .unwrap_err();

        // (1,1) 跳过 (2,2) 落到 (3,3)
        state
            .apply_move(Move::step(player(0), p(1, 1), p(3, 3)))
            .unwrap();
        assert_eq!(state.turn(), player(0));
        assert_eq!(state.last_moved(), Some(p(3, 3)));

        state.apply_move(Move::end_turn(player(0))).unwrap();
        assert_eq!(state.turn(), player(1));
        assert!(state.last_moved().is_none());
    }

    #[test]
    fn test_draw_at_turn_cap() {
        let state = BoardState::initial().with_turn_number(MAX_TURN);
        assert_eq!(state.winner(), Winner::Draw);
        let state = BoardState::initial().with_turn_number(MAX_TURN - 1);
        assert_eq!(state.winner(), Winner::Nobody);
    }

    #[test]
    fn test_deadline_loss() {
        // 0 号玩家在第 100 回合后仍有棋子留在出发营地
        let mut state = BoardState::initial().with_turn_number(MAX_BASE_TURN);
        state
            .apply_move(Move::step(player(0), p(3, 1), p(4, 2)))
            .unwrap();
        assert_eq!(state.winner(), Winner::Team(Team::Second));
    }

    #[test]
    fn test_deadline_not_reached() {
        let mut state = BoardState::initial().with_turn_number(MAX_BASE_TURN - 1);
        state
            .apply_move(Move::step(player(0), p(3, 1), p(4, 2)))
            .unwrap();
        assert_eq!(state.winner(), Winner::Nobody);
    }

    #[test]
    fn test_deadline_uses_movers_turn() {
        // 3 号玩家交出走子权时回合数才加一，期限仍按走子前的回合判断
        for (mover, from, to) in [(0, p(3, 1), p(4, 2)), (3, p(12, 14), p(11, 13))] {
            let mut state = BoardState::from_board(Board::initial(), player(mover))
                .with_turn_number(MAX_BASE_TURN - 1);
            state.apply_move(Move::step(player(mover), from, to)).unwrap();
            assert_eq!(state.winner(), Winner::Nobody, "player {}", mover);

            let mut state = BoardState::from_board(Board::initial(), player(mover))
                .with_turn_number(MAX_BASE_TURN);
            state.apply_move(Move::step(player(mover), from, to)).unwrap();
            assert_eq!(state.winner(), Winner::Team(Team::Second), "player {}", mover);
        }
    }

    #[test]
    fn test_team_win_detected() {
        let mut board = Board::empty();
        for &cell in base_points(3) {
            board.set(cell, Some(player(0)));
        }
        for &cell in base_points(0) {
            board.set(cell, Some(player(3)));
        }
        let state = BoardState::from_board(board, player(1));
        assert_eq!(state.winner(), Winner::Team(Team::First));
    }

    #[test]
    fn test_last_slide_wins_after_deadline() {
        let mut board = Board::empty();
        for &cell in base_points(3) {
            board.set(cell, Some(player(0)));
        }
        for &cell in base_points(0) {
            board.set(cell, Some(player(3)));
        }
        // 3 号玩家还差 (1,3) 一格
        board.set(p(1, 3), None);
        board.set(p(2, 3), Some(player(3)));
        let mut state =
            BoardState::from_board(board, player(3)).with_turn_number(MAX_BASE_TURN);
        assert_eq!(state.winner(), Winner::Nobody);

        state
            .apply_move(Move::step(player(3), p(2, 3), p(1, 3)))
            .unwrap();
        assert_eq!(state.winner(), Winner::Team(Team::First));
    }

    #[test]
    fn test_force_winner() {
        let mut state = BoardState::initial();
        state.force_winner(Team::Second);
        assert_eq!(state.winner(), Winner::Team(Team::Second));
    }
}
