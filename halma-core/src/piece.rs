//! 玩家、队伍与坐标定义

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_CELLS, BOARD_SIZE, NUMBER_OF_PLAYERS};

/// 队伍
///
/// 斜对角的两名玩家为队友：0 与 3 组成 `First`，1 与 2 组成 `Second`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    First,
    Second,
}

impl Team {
    /// 队伍编号（0 或 1）
    pub fn index(&self) -> usize {
        match self {
            Team::First => 0,
            Team::Second => 1,
        }
    }

    /// 对方队伍
    pub fn other(&self) -> Team {
        match self {
            Team::First => Team::Second,
            Team::Second => Team::First,
        }
    }

    /// 队伍的两名成员
    pub fn members(&self) -> [PlayerId; 2] {
        match self {
            Team::First => [PlayerId(0), PlayerId(3)],
            Team::Second => [PlayerId(1), PlayerId(2)],
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team-{}", self.index())
    }
}

/// 玩家编号（0-3），同时也是其出发角落的编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    /// 按走子顺序排列的全部玩家
    pub const ALL: [PlayerId; NUMBER_OF_PLAYERS] =
        [PlayerId(0), PlayerId(1), PlayerId(2), PlayerId(3)];

    /// 创建玩家编号
    pub fn new(id: u8) -> Option<Self> {
        if (id as usize) < NUMBER_OF_PLAYERS {
            Some(Self(id))
        } else {
            None
        }
    }

    /// 创建玩家编号（不检查范围，内部使用）
    pub const fn new_unchecked(id: u8) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// 队友（斜对角的玩家）
    pub fn teammate(&self) -> PlayerId {
        PlayerId(self.0 ^ 3)
    }

    /// 下一个走子的玩家
    pub fn next(&self) -> PlayerId {
        PlayerId((self.0 + 1) % NUMBER_OF_PLAYERS as u8)
    }

    /// 所属队伍
    pub fn team(&self) -> Team {
        if self.0 == 0 || self.0 == 3 {
            Team::First
        } else {
            Team::Second
        }
    }

    /// 两名对手
    pub fn opponents(&self) -> [PlayerId; 2] {
        self.team().other().members()
    }

    /// 下一个走子的玩家是否是队友（1→2、3→0）
    pub fn leads_team_round(&self) -> bool {
        self.next() == self.teammate()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player-{}", self.0)
    }
}

/// 棋盘坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// 列 (0-15)
    pub x: u8,
    /// 行 (0-15)
    pub y: u8,
}

impl Point {
    /// 创建新坐标
    pub fn new(x: u8, y: u8) -> Option<Self> {
        if (x as usize) < BOARD_SIZE && (y as usize) < BOARD_SIZE {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// 创建新坐标（不检查边界，内部使用）
    pub const fn new_unchecked(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// 检查坐标是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.x as usize) < BOARD_SIZE && (self.y as usize) < BOARD_SIZE
    }

    /// 获取偏移后的坐标，越界时返回 None
    pub fn offset(&self, dx: i8, dy: i8) -> Option<Point> {
        let new_x = self.x as i16 + dx as i16;
        let new_y = self.y as i16 + dy as i16;
        let size = BOARD_SIZE as i16;
        if (0..size).contains(&new_x) && (0..size).contains(&new_y) {
            Some(Point {
                x: new_x as u8,
                y: new_y as u8,
            })
        } else {
            None
        }
    }

    /// 切比雪夫距离（x、y 方向位移的最大值）
    pub fn chebyshev(&self, other: Point) -> u8 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// 曼哈顿距离
    pub fn manhattan(&self, other: Point) -> u32 {
        self.x.abs_diff(other.x) as u32 + self.y.abs_diff(other.y) as u32
    }

    /// 欧几里得距离
    pub fn euclidean(&self, other: Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx.hypot(dy)
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        self.y as usize * BOARD_SIZE + self.x as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < BOARD_CELLS {
            Some(Point {
                x: (index % BOARD_SIZE) as u8,
                y: (index / BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teammates_and_teams() {
        let p0 = PlayerId::new_unchecked(0);
        let p1 = PlayerId::new_unchecked(1);
        assert_eq!(p0.teammate(), PlayerId::new_unchecked(3));
        assert_eq!(p1.teammate(), PlayerId::new_unchecked(2));
        assert_eq!(p0.team(), Team::First);
        assert_eq!(p1.team(), Team::Second);
        assert_eq!(p0.opponents(), [PlayerId::new_unchecked(1), PlayerId::new_unchecked(2)]);
        assert_eq!(Team::First.other(), Team::Second);
    }

    #[test]
    fn test_team_round_leaders() {
        let leaders: Vec<u8> = PlayerId::ALL
            .iter()
            .filter(|p| p.leads_team_round())
            .map(|p| p.id())
            .collect();
        assert_eq!(leaders, vec![1, 3]);
    }

    #[test]
    fn test_player_range() {
        assert!(PlayerId::new(3).is_some());
        assert!(PlayerId::new(4).is_none());
        assert_eq!(PlayerId::new_unchecked(3).next(), PlayerId::new_unchecked(0));
    }

    #[test]
    fn test_point_valid() {
        assert!(Point::new(0, 0).is_some());
        assert!(Point::new(15, 15).is_some());
        assert!(Point::new(16, 0).is_none());
        assert!(Point::new(0, 16).is_none());
    }

    #[test]
    fn test_point_offset() {
        let p = Point::new_unchecked(0, 15);
        assert_eq!(p.offset(1, -1), Some(Point::new_unchecked(1, 14)));
        assert_eq!(p.offset(-1, 0), None);
        assert_eq!(p.offset(0, 1), None);
    }

    #[test]
    fn test_point_index_roundtrip() {
        let p = Point::new_unchecked(7, 12);
        assert_eq!(Point::from_index(p.to_index()), Some(p));
        assert!(Point::from_index(BOARD_CELLS).is_none());
    }

    #[test]
    fn test_distances() {
        let a = Point::new_unchecked(1, 1);
        let b = Point::new_unchecked(4, 5);
        assert_eq!(a.chebyshev(b), 4);
        assert_eq!(a.manhattan(b), 7);
        assert!((a.euclidean(b) - 5.0).abs() < 1e-9);
    }
}
