use rand::prelude::*;
use rand::rngs::StdRng;
use spots_core::*;

/// Scripted player that traces chains through the dots it can see.
pub struct AutoPlayer {
    rng: StdRng,
}

impl AutoPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Plans one gesture from a random visible dot, greedily extended through adjacent ones.
    pub fn plan(&mut self, frame: &RenderFrame) -> Option<Vec<PointerEvent>> {
        let visible: Vec<&CellSprite> = frame
            .cells
            .iter()
            .filter(|sprite| sprite.state == CellState::Visible)
            .collect();
        if visible.is_empty() {
            return None;
        }

        let start = visible[self.rng.random_range(0..visible.len())];
        let mut path = vec![start];
        while let Some(next) = visible.iter().copied().find(|candidate| {
            let last = path[path.len() - 1];
            is_adjacent(last.coords, candidate.coords)
                && !path.iter().any(|chained| chained.coords == candidate.coords)
        }) {
            path.push(next);
        }

        log::debug!(
            "tracing {:?}",
            path.iter().map(|sprite| sprite.coords).collect::<Vec<_>>()
        );

        let (first, rest) = path.split_first()?;
        let (x, y) = first.center;
        let mut events = vec![PointerEvent::down(x, y)];
        events.extend(rest.iter().map(|sprite| {
            let (x, y) = sprite.center;
            PointerEvent::moved(x, y)
        }));
        let (x, y) = path[path.len() - 1].center;
        events.push(PointerEvent::up(x, y));
        Some(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(coords: Coord2, state: CellState) -> CellSprite {
        CellSprite {
            id: 0,
            coords,
            center: (f32::from(coords.0) * 10., f32::from(coords.1) * 10.),
            radius: 3.,
            alpha: 1.,
            state,
        }
    }

    fn frame(cells: Vec<CellSprite>) -> RenderFrame {
        RenderFrame {
            cells,
            chain: None,
            score: 0,
            missed_remaining: 15,
            game_over: false,
        }
    }

    #[test]
    fn nothing_visible_means_no_gesture() {
        let mut player = AutoPlayer::new(1);
        let idle = frame(vec![sprite((0, 0), CellState::Appearing)]);
        assert_eq!(player.plan(&idle), None);
    }

    #[test]
    fn gesture_walks_adjacent_dots() {
        let mut player = AutoPlayer::new(1);
        let line = frame(vec![
            sprite((0, 0), CellState::Visible),
            sprite((0, 1), CellState::Visible),
            sprite((0, 2), CellState::Visible),
        ]);

        let events = player.plan(&line).unwrap();

        assert!(events.len() >= 3);
        assert_eq!(events[0].kind, PointerKind::Down);
        assert_eq!(events[events.len() - 1].kind, PointerKind::Up);
        // each step moves exactly one column along the row
        for pair in events[..events.len() - 1].windows(2) {
            let (a, b) = (pair[0].point(), pair[1].point());
            assert_eq!(a.0, b.0);
            assert_eq!((a.1 - b.1).abs(), 10.);
        }
    }
}
