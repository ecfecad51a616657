//! 后继局面生成
//!
//! 以“整回合”为单位惰性枚举一名玩家所有不同的后继局面，连跳链长度不限。
//! 组合生成器把一名玩家与其队友的回合拼成一层，供 Minimax 使用。

use std::collections::{HashMap, HashSet, VecDeque};

use halma_core::{reconstruct_hop_path, BoardState, Move, Point};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 后继局面及产生它的回合的起点和终点
#[derive(Debug, Clone)]
pub struct BoardPointPair {
    pub state: BoardState,
    /// 回合起点；已占满目标营地后单纯结束回合时为空
    pub origin: Option<Point>,
    pub destination: Option<Point>,
    /// 该回合是否由跳跃构成
    pub is_hop: bool,
}

impl BoardPointPair {
    /// 把整回合换算成可直接执行的第一步
    ///
    /// 跳跃回合取还原出的连跳路径的第一跳；找不到路径时返回 None。
    pub fn first_move(&self, before: &BoardState) -> Option<Move> {
        let player = before.turn();
        match (self.origin, self.destination) {
            (Some(from), Some(to)) if from == to => Some(Move::end_turn(player)),
            (Some(from), Some(to)) if self.is_hop => reconstruct_hop_path(before, from, to)?
                .first()
                .copied(),
            (Some(from), Some(to)) => Some(Move::step(player, from, to)),
            _ => Some(Move::end_turn(player)),
        }
    }
}

/// 执行生成器给出的走法；非法即为内部缺陷
fn successor(state: &BoardState, mv: Move) -> BoardState {
    let mut next = state.clone();
    if let Err(e) = next.apply_move(mv) {
        unreachable!("successor generation produced an illegal move: {e}");
    }
    next
}

/// 单名玩家的后继局面生成器
///
/// 先处理所有单步候选（滑动直接成为终局后继），跳跃进入按起点分组的广度优先队列；
/// 队列中的每个局面对每个可继续的跳跃产出“到此结束”的后继，并把继续跳的局面重新入队。
pub struct MoveGenerator {
    base: BoardState,
    candidates: Vec<Move>,
    ready: Vec<BoardPointPair>,
    queue: VecDeque<(BoardState, Point)>,
    /// 起点 -> 已到达过的落点
    visited: HashMap<Point, HashSet<Point>>,
}

impl MoveGenerator {
    /// 创建生成器；给出随机数发生器时打乱候选顺序
    pub fn new(state: &BoardState, rng: Option<&mut ChaCha8Rng>) -> Self {
        let mut candidates = state.legal_moves();
        if let Some(rng) = rng {
            candidates.shuffle(rng);
        }
        // 从尾部弹出，保持打乱后（或生成时）的顺序
        candidates.reverse();

        Self {
            base: state.clone(),
            candidates,
            ready: Vec::new(),
            queue: VecDeque::new(),
            visited: HashMap::new(),
        }
    }

    /// 起点 `origin` 的连跳是否已到过 `landing`；未到过则记录
    fn first_visit(&mut self, origin: Point, landing: Point) -> bool {
        self.visited
            .entry(origin)
            .or_insert_with(|| HashSet::from([origin]))
            .insert(landing)
    }

    /// 连跳停在当前位置并结束回合
    fn finish_chain(state: &BoardState, origin: Point, landing: Point) -> BoardPointPair {
        let player = state.turn();
        BoardPointPair {
            state: successor(state, Move::end_turn(player)),
            origin: Some(origin),
            destination: Some(landing),
            is_hop: true,
        }
    }

    fn seed(&mut self, mv: Move) {
        match mv {
            Move::EndTurn { .. } => {
                // 连跳中途才构造的生成器沿用已有起点
                let origin = self.base.last_moved();
                self.ready.push(BoardPointPair {
                    state: successor(&self.base, mv),
                    origin,
                    destination: origin,
                    is_hop: origin.is_some(),
                });
            }
            Move::Step { from, to, .. } if mv.is_hop() => {
                if !self.first_visit(from, to) {
                    return;
                }
                let hopped = successor(&self.base, mv);
                self.ready.push(Self::finish_chain(&hopped, from, to));
                self.queue.push_back((hopped, from));
            }
            Move::Step { from, to, .. } => {
                self.ready.push(BoardPointPair {
                    state: successor(&self.base, mv),
                    origin: Some(from),
                    destination: Some(to),
                    is_hop: false,
                });
            }
        }
    }

    fn expand(&mut self, state: BoardState, origin: Point) {
        let Some(last) = state.last_moved() else {
            return;
        };
        for hop in state.hops_from(last) {
            let Some(landing) = hop.to() else {
                continue;
            };
            if !self.first_visit(origin, landing) {
                continue;
            }
            let hopped = successor(&state, hop);
            self.ready.push(Self::finish_chain(&hopped, origin, landing));
            self.queue.push_back((hopped, origin));
        }
    }
}

impl Iterator for MoveGenerator {
    type Item = BoardPointPair;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.ready.pop() {
                return Some(pair);
            }
            if let Some(mv) = self.candidates.pop() {
                self.seed(mv);
                continue;
            }
            let (state, origin) = self.queue.pop_front()?;
            self.expand(state, origin);
        }
    }
}

/// 组合（整队回合）生成器
///
/// 先枚举走子方的后继，再对每个后继枚举队友的后继；产出的局面包含两人的走法，
/// 起点与终点取自队友的回合。
pub struct CombinedMoveGenerator {
    first: MoveGenerator,
    second: Option<MoveGenerator>,
    rng: Option<ChaCha8Rng>,
}

impl CombinedMoveGenerator {
    pub fn new(state: &BoardState, rng: Option<&mut ChaCha8Rng>) -> Self {
        let mut rng = rng.map(|r| ChaCha8Rng::seed_from_u64(r.gen()));
        let first = MoveGenerator::new(state, rng.as_mut());
        Self {
            first,
            second: None,
            rng,
        }
    }

    /// 走子方之后是否轮到队友（只有这时才能组合）
    pub fn applies_to(state: &BoardState) -> bool {
        !state.is_hop_active() && state.turn().leads_team_round()
    }
}

impl Iterator for CombinedMoveGenerator {
    type Item = BoardPointPair;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(second) = self.second.as_mut() {
                if let Some(pair) = second.next() {
                    return Some(pair);
                }
                self.second = None;
            }

            let pair = self.first.next()?;
            if pair.state.winner().is_decided() {
                return Some(pair);
            }
            let mut second = MoveGenerator::new(&pair.state, self.rng.as_mut());
            match second.next() {
                Some(first_of_second) => {
                    self.second = Some(second);
                    return Some(first_of_second);
                }
                // 队友无棋可走时保留走子方的后继
                None => return Some(pair),
            }
        }
    }
}
