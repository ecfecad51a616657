//! 静态几何表
//!
//! 四个角落营地、目标角、各格到目标角的曼哈顿距离、各格到四个角的欧氏距离。
//! 进程内只初始化一次，之后只读。

use std::sync::OnceLock;

use crate::constants::{BASE_POINTS, BOARD_CELLS, BOARD_SIZE, NUMBER_OF_PLAYERS, PIECES_PER_PLAYER};
use crate::piece::{PlayerId, Point};

struct Geometry {
    /// [corner][cell] 是否属于该角落营地
    bases: [[bool; BOARD_CELLS]; NUMBER_OF_PLAYERS],
    /// [corner] 营地格子列表
    base_points: [[Point; PIECES_PER_PLAYER]; NUMBER_OF_PLAYERS],
    /// [player][cell] 到该玩家目标角的曼哈顿距离
    goal_distance: [[u32; BOARD_CELLS]; NUMBER_OF_PLAYERS],
    /// [corner][cell] 到该角的欧氏距离
    corner_distance: [[f64; BOARD_CELLS]; NUMBER_OF_PLAYERS],
}

static GEOMETRY: OnceLock<Geometry> = OnceLock::new();

fn geometry() -> &'static Geometry {
    GEOMETRY.get_or_init(|| {
        let mut table = Geometry {
            bases: [[false; BOARD_CELLS]; NUMBER_OF_PLAYERS],
            base_points: [[Point::new_unchecked(0, 0); PIECES_PER_PLAYER]; NUMBER_OF_PLAYERS],
            goal_distance: [[0; BOARD_CELLS]; NUMBER_OF_PLAYERS],
            corner_distance: [[0.0; BOARD_CELLS]; NUMBER_OF_PLAYERS],
        };

        for corner in 0..NUMBER_OF_PLAYERS {
            for (j, &(x, y)) in BASE_POINTS.iter().enumerate() {
                let p = mirror(corner, x, y);
                table.bases[corner][p.to_index()] = true;
                table.base_points[corner][j] = p;
            }
        }

        for cell in 0..BOARD_CELLS {
            let p = Point::new_unchecked((cell % BOARD_SIZE) as u8, (cell / BOARD_SIZE) as u8);
            for i in 0..NUMBER_OF_PLAYERS {
                // 玩家 i 的目标是队友 i^3 的出发角
                table.goal_distance[i][cell] = p.manhattan(corner_point(i ^ 3));
                table.corner_distance[i][cell] = p.euclidean(corner_point(i));
            }
        }

        table
    })
}

/// 把 0 号角落的坐标镜像到指定角落：奇数角翻转 x，corner>>1 为奇数时翻转 y
fn mirror(corner: usize, x: u8, y: u8) -> Point {
    let last = (BOARD_SIZE - 1) as u8;
    let x = if corner % 2 == 0 { x } else { last - x };
    let y = if (corner >> 1) % 2 == 0 { y } else { last - y };
    Point::new_unchecked(x, y)
}

/// 角落顶点格
pub fn corner_point(corner: usize) -> Point {
    mirror(corner, 0, 0)
}

/// 以指定角落为原点、坐标轴朝棋盘内侧的相对坐标
pub fn corner_relative(corner: usize, x: u8, y: u8) -> Point {
    mirror(corner, x, y)
}

/// 坐标是否位于指定角落营地
pub fn in_base(corner: usize, p: Point) -> bool {
    p.is_valid() && geometry().bases[corner][p.to_index()]
}

/// 坐标是否位于玩家的出发营地
pub fn in_home_base(player: PlayerId, p: Point) -> bool {
    in_base(player.index(), p)
}

/// 坐标是否位于玩家的目标营地（队友的出发营地）
pub fn in_objective_base(player: PlayerId, p: Point) -> bool {
    in_base(player.teammate().index(), p)
}

/// 指定角落营地的全部格子
pub fn base_points(corner: usize) -> &'static [Point; PIECES_PER_PLAYER] {
    &geometry().base_points[corner]
}

/// 到玩家目标角的曼哈顿距离
pub fn goal_distance(player: PlayerId, p: Point) -> u32 {
    geometry().goal_distance[player.index()][p.to_index()]
}

/// 到指定角落顶点的欧氏距离
pub fn corner_distance(corner: usize, p: Point) -> f64 {
    geometry().corner_distance[corner][p.to_index()]
}
