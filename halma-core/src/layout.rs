//! 局面文本格式解析和生成
//!
//! 格式：`<棋盘> <走子方> <回合数>`
//!
//! 棋盘部分从 y=15 到 y=0 共 16 行，以 `/` 分隔；每行 16 个字符，
//! `0`-`3` 表示该玩家的棋子，`-` 表示空位。连跳中间状态不可表示。

use crate::board::{Board, BoardState};
use crate::constants::BOARD_SIZE;
use crate::error::{HalmaError, Result};
use crate::piece::{PlayerId, Point};

/// 初始局面
pub const INITIAL_LAYOUT: &str = "2222--------3333/2222--------3333/222----------333/22------------33/\
----------------/----------------/----------------/----------------/\
----------------/----------------/----------------/----------------/\
00------------11/000----------111/0000--------1111/0000--------1111 0 0";

/// 局面文本格式处理
pub struct Layout;

impl Layout {
    /// 解析局面文本为对局状态
    pub fn parse(text: &str) -> Result<BoardState> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let Some(board_part) = parts.first() else {
            return Err(invalid("Empty layout string"));
        };

        let board = Self::parse_board(board_part)?;

        // 走子方（默认 0 号）
        let turn = match parts.get(1) {
            Some(s) => {
                let id: u8 = s
                    .parse()
                    .map_err(|_| invalid(format!("Invalid turn: {}", s)))?;
                PlayerId::new(id).ok_or(HalmaError::InvalidPlayer(id))?
            }
            None => PlayerId::new_unchecked(0),
        };

        // 回合数（默认 0）
        let turn_number = match parts.get(2) {
            Some(s) => s
                .parse()
                .map_err(|_| invalid(format!("Invalid turn number: {}", s)))?,
            None => 0,
        };

        Ok(BoardState::from_board(board, turn).with_turn_number(turn_number))
    }

    /// 解析棋盘部分
    pub fn parse_board(text: &str) -> Result<Board> {
        let rows: Vec<&str> = text.split('/').collect();
        if rows.len() != BOARD_SIZE {
            return Err(invalid(format!(
                "Expected {} rows, got {}",
                BOARD_SIZE,
                rows.len()
            )));
        }

        let mut board = Board::empty();
        for (row_idx, row) in rows.iter().enumerate() {
            let y = (BOARD_SIZE - 1 - row_idx) as u8;
            let cells: Vec<char> = row.chars().collect();
            if cells.len() != BOARD_SIZE {
                return Err(invalid(format!(
                    "Row {} has {} columns, expected {}",
                    row_idx,
                    cells.len(),
                    BOARD_SIZE
                )));
            }
            for (x, c) in cells.into_iter().enumerate() {
                let owner = match c {
                    '-' => None,
                    '0'..='3' => PlayerId::new(c as u8 - b'0'),
                    _ => return Err(invalid(format!("Invalid cell character: {}", c))),
                };
                board.set(Point::new_unchecked(x as u8, y), owner);
            }
        }
        Ok(board)
    }

    /// 将对局状态转换为局面文本
    pub fn to_string(state: &BoardState) -> String {
        format!(
            "{} {} {}",
            Self::board_to_string(state.board()),
            state.turn().id(),
            state.turns_played()
        )
    }

    /// 将棋盘转换为局面文本的棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        (0..BOARD_SIZE as u8)
            .rev()
            .map(|y| {
                (0..BOARD_SIZE as u8)
                    .map(|x| match board.get(Point::new_unchecked(x, y)) {
                        Some(owner) => char::from(b'0' + owner.id()),
                        None => '-',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn invalid(reason: impl Into<String>) -> HalmaError {
    HalmaError::InvalidLayout {
        reason: reason.into(),
    }
}
