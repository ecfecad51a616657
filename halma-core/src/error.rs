//! 错误类型定义

use thiserror::Error;

use crate::moves::Move;

/// 规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalmaError {
    /// 无效的位置
    #[error("Invalid position: ({x}, {y})")]
    InvalidPosition { x: i16, y: i16 },

    /// 无效的玩家编号
    #[error("Invalid player id: {0}")]
    InvalidPlayer(u8),

    /// 非法走法
    #[error("Invalid move sent: {0}")]
    InvalidMove(Move),

    /// 当前走子方没有任何合法走法
    #[error("No legal move for player {player}")]
    NoLegalMove { player: u8 },

    /// 无效的局面文本
    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, HalmaError>;
