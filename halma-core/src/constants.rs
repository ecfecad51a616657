//! 规则常量定义

/// 棋盘边长
pub const BOARD_SIZE: usize = 16;

/// 棋盘格子总数
pub const BOARD_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// 玩家数量
pub const NUMBER_OF_PLAYERS: usize = 4;

/// 每名玩家的棋子数（= 营地格子数）
pub const PIECES_PER_PLAYER: usize = 13;

/// 达到该回合数即判和
pub const MAX_TURN: u32 = 5000;

/// 超过该回合数仍有棋子停留在非目标营地的一方判负
pub const MAX_BASE_TURN: u32 = 100;

/// 八个方向的单位偏移
pub const DIRECTIONS: [(i8, i8); 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

/// 0 号角落营地的 13 个格子，其余角落由镜像得到
pub const BASE_POINTS: [(u8, u8); PIECES_PER_PLAYER] = [
    (0, 0),
    (1, 0),
    (2, 0),
    (3, 0),
    (0, 1),
    (1, 1),
    (2, 1),
    (3, 1),
    (0, 2),
    (1, 2),
    (2, 2),
    (0, 3),
    (1, 3),
];
