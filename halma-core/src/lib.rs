//! Halma（四人组队跳棋）规则库
//!
//! 包含:
//! - 16x16 棋盘、玩家、队伍、坐标等核心数据结构
//! - 角落营地与目标距离等静态几何表
//! - 走法合法性校验、连跳状态机、胜负判定
//! - 连跳路径还原
//! - 局面文本格式（Layout）

mod board;
mod constants;
mod error;
mod geometry;
mod layout;
mod moves;
mod path;
mod piece;

pub use board::{Board, BoardState, Winner};
pub use constants::*;
pub use error::{HalmaError, Result};
pub use geometry::{
    base_points, corner_distance, corner_point, corner_relative, goal_distance, in_base,
    in_home_base, in_objective_base,
};
pub use layout::{Layout, INITIAL_LAYOUT};
pub use moves::Move;
pub use path::reconstruct_hop_path;
pub use piece::{PlayerId, Point, Team};
